//! Integration tests for `helpdesk export` and `helpdesk config show`.

mod common;

use common::{OTHER, TECH, TestEnv, USER};
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn read_array(path: &Path) -> Vec<serde_json::Value> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// === Export ===

#[test]
fn test_export_defaults_to_data_dir() {
    let env = TestEnv::with_people();
    env.create_ticket(USER, "Mine");

    env.as_user(TECH)
        .args(["export", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 3 file(s) to data"));

    let data = env.path().join("data");
    assert_eq!(read_array(&data.join("tickets.json")).len(), 1);
    assert_eq!(read_array(&data.join("usuarios.json")).len(), 4);
    assert_eq!(read_array(&data.join("categorias.json")).len(), 1);
}

#[test]
fn test_export_tickets_follow_principal_scope() {
    let env = TestEnv::with_people();
    env.create_ticket(USER, "Mine");
    env.create_ticket(OTHER, "Theirs");
    let out = env.path().join("snapshot");

    env.as_user(USER)
        .args(["export", "--dir"])
        .arg(&out)
        .assert()
        .success();

    let tickets = read_array(&out.join("tickets.json"));
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0]["title"], "Mine");
}

#[test]
fn test_export_dir_from_environment() {
    let env = TestEnv::with_people();

    env.as_user(TECH)
        .env("HELPDESK_EXPORT_DIR", "from-env")
        .arg("export")
        .assert()
        .success();
    assert!(env.path().join("from-env").join("usuarios.json").is_file());
}

#[test]
fn test_export_reports_partial_failure() {
    let env = TestEnv::with_people();
    fs::create_dir_all(env.path().join("data").join("categorias.json")).unwrap();

    env.as_user(TECH)
        .arg("export")
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"file\":\"categorias.json\""));
    assert!(env.path().join("data").join("tickets.json").is_file());
}

// === Config ===

#[test]
fn test_config_file_supplies_defaults() {
    let env = TestEnv::new();
    let config = env.path().join("custom.kdl");
    fs::write(
        &config,
        "database \"from-config.db\"\nexport-dir \"out\"\ndefault-user 1\n",
    )
    .unwrap();

    // HELPDESK_DB from the test env still wins over the file
    env.helpdesk()
        .args(["config", "show", "-H", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("(env:HELPDESK_DB)"))
        .stdout(predicate::str::contains("export-dir = out (config)"))
        .stdout(predicate::str::contains("user = 1 (config)"));

    env.helpdesk()
        .env_remove("HELPDESK_DB")
        .args(["config", "show", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("from-config.db"));
}

#[test]
fn test_system_config_is_read_from_config_home() {
    let env = TestEnv::new();
    let dir = env.path().join("config").join("helpdesk");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("helpdesk.kdl"), "default-user 3\n").unwrap();

    env.helpdesk()
        .args(["config", "show", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("user = 3 (config)"));
}

#[test]
fn test_invalid_config_file_fails() {
    let env = TestEnv::new();
    let config = env.path().join("broken.kdl");
    fs::write(&config, "default-user 0\n").unwrap();

    env.helpdesk()
        .args(["config", "show", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_cli_user_flag_beats_environment() {
    let env = TestEnv::new();

    env.helpdesk()
        .env("HELPDESK_USER", "3")
        .args(["config", "show", "-H", "--as", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("user = 2 (cli)"));
}

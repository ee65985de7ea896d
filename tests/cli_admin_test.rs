//! Integration tests for init, user, category and stats commands via CLI.

mod common;

use common::{ADMIN, TECH, TestEnv, USER};
use predicates::prelude::*;

// === Init ===

#[test]
fn test_init_seeds_admin_and_category() {
    let env = TestEnv::new();

    env.helpdesk()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"admin_id\":1"))
        .stdout(predicate::str::contains("\"category_id\":1"));
    assert!(env.db_path().is_file());
}

#[test]
fn test_init_twice_keeps_data() {
    let env = TestEnv::init();

    env.helpdesk()
        .args(["init", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing seeded"));

    env.helpdesk()
        .args(["user", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\":1"));
}

#[test]
fn test_db_flag_overrides_environment() {
    let env = TestEnv::new();
    let other = env.path().join("nested").join("other.db");

    env.helpdesk()
        .args(["init", "--db"])
        .arg(&other)
        .assert()
        .success();
    assert!(other.is_file());
    assert!(!env.db_path().exists());
}

// === Users ===

#[test]
fn test_admin_adds_users() {
    let env = TestEnv::with_people();

    env.helpdesk()
        .args(["user", "list", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4 user(s):"))
        .stdout(predicate::str::contains("#2 Tiago <tiago@example.com> [TECNICO]"));
}

#[test]
fn test_non_admin_cannot_add_users() {
    let env = TestEnv::with_people();

    env.as_user(TECH)
        .args(["user", "add", "Eve", "eve@example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Permission denied"));
}

#[test]
fn test_duplicate_email_is_rejected() {
    let env = TestEnv::with_people();

    env.as_user(ADMIN)
        .args(["user", "add", "Tiago Again", "tiago@example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Database error"));
}

#[test]
fn test_deactivated_user_cannot_act() {
    let env = TestEnv::with_people();

    env.as_user(ADMIN)
        .args(["user", "deactivate", USER])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"action\":\"deactivated\""));

    env.as_user(USER)
        .args(["ticket", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("inactive"));

    env.helpdesk()
        .args(["user", "list", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ursula <ursula@example.com> [USUARIO] (inactive)"));
}

#[test]
fn test_deactivated_user_cannot_be_assigned() {
    let env = TestEnv::with_people();
    env.create_ticket(USER, "Phone");
    env.as_user(ADMIN)
        .args(["user", "deactivate", TECH])
        .assert()
        .success();

    env.as_user(ADMIN)
        .args(["ticket", "assign", "1", TECH, "-H"])
        .assert()
        .failure()
        .stdout("Erro: Usuário não encontrado\n");
}

// === Categories ===

#[test]
fn test_category_lifecycle() {
    let env = TestEnv::init();

    env.as_user(ADMIN)
        .args(["category", "add", "Rede", "-d", "Network issues", "--colour", "#4ecdc4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\":2"));

    env.helpdesk()
        .args(["category", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\":2"));

    env.as_user(ADMIN)
        .args(["category", "deactivate", "2"])
        .assert()
        .success();

    env.helpdesk()
        .args(["category", "list", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 category:"))
        .stdout(predicate::str::contains("Rede").not());

    env.as_user(ADMIN)
        .args(["ticket", "create", "Cable", "-d", "Cut", "-c", "2", "-H"])
        .assert()
        .failure()
        .stdout("Erro: Categoria não encontrada\n");
}

#[test]
fn test_deactivate_unknown_category() {
    let env = TestEnv::init();

    env.as_user(ADMIN)
        .args(["category", "deactivate", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Category not found"));
}

// === Stats ===

#[test]
fn test_stats_on_empty_database() {
    let env = TestEnv::init();

    let json = TestEnv::json({
        let mut cmd = env.helpdesk();
        cmd.arg("stats");
        cmd
    });
    assert_eq!(json["total"], 0);
    assert_eq!(json["open"], 0);
    assert_eq!(json["mean_resolution_hours"], 0.0);
}

#[test]
fn test_stats_counts_tickets() {
    let env = TestEnv::with_people();
    env.create_ticket(USER, "One");
    env.create_ticket(USER, "Two");
    env.create_ticket(USER, "Three");
    env.as_user(TECH)
        .args(["ticket", "status", "2", "RESOLVIDO"])
        .assert()
        .success();
    env.as_user(TECH)
        .args(["ticket", "status", "3", "FECHADO"])
        .assert()
        .success();

    let json = TestEnv::json({
        let mut cmd = env.helpdesk();
        cmd.arg("stats");
        cmd
    });
    assert_eq!(json["total"], 3);
    assert_eq!(json["open"], 2);
    assert_eq!(json["by_status"]["ABERTO"], 1);
    assert_eq!(json["by_status"]["RESOLVIDO"], 1);
    assert_eq!(json["by_status"]["FECHADO"], 1);
    assert_eq!(json["by_priority"]["MEDIA"], 3);
    // Resolved within the same hour
    assert_eq!(json["mean_resolution_hours"], 0.0);
}

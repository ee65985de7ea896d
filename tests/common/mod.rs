//! Common test utilities for helpdesk integration tests.
//!
//! Provides `TestEnv` for isolated test environments that never read the
//! user's `~/.config/helpdesk/` or write outside a temporary directory.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// Users created by [`TestEnv::with_people`], in id order after the seeded admin.
pub const ADMIN: &str = "1";
pub const TECH: &str = "2";
pub const USER: &str = "3";
pub const OTHER: &str = "4";

/// A test environment with its own database and config directory.
///
/// `helpdesk()` sets `HELPDESK_DB` and `XDG_CONFIG_HOME` per command and
/// clears the other `HELPDESK_*` variables, making tests parallel-safe.
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Create a test environment and run `helpdesk init`.
    pub fn init() -> Self {
        let env = Self::new();
        env.helpdesk().arg("init").assert().success();
        env
    }

    /// Initialised environment with a technician and two plain users added
    /// by the seeded administrator.
    pub fn with_people() -> Self {
        let env = Self::init();
        for (name, email, profile) in [
            ("Tiago", "tiago@example.com", "TECNICO"),
            ("Ursula", "ursula@example.com", "USUARIO"),
            ("Otto", "otto@example.com", "USUARIO"),
        ] {
            env.as_user(ADMIN)
                .args(["user", "add", name, email, "--profile", profile])
                .assert()
                .success();
        }
        env
    }

    /// Get a Command for the helpdesk binary bound to this environment.
    pub fn helpdesk(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_helpdesk"));
        cmd.current_dir(self.dir.path());
        cmd.env("HELPDESK_DB", self.db_path());
        cmd.env("XDG_CONFIG_HOME", self.dir.path().join("config"));
        for var in ["HELPDESK_USER", "HELPDESK_EXPORT_DIR", "HELPDESK_CONFIG", "RUST_LOG"] {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Command acting as the given user.
    pub fn as_user(&self, user_id: &str) -> Command {
        let mut cmd = self.helpdesk();
        cmd.args(["--as", user_id]);
        cmd
    }

    /// Run a command and parse its stdout as JSON.
    pub fn json(mut cmd: Command) -> serde_json::Value {
        let output = cmd.output().unwrap();
        serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
            panic!(
                "stdout is not JSON ({}): {}",
                e,
                String::from_utf8_lossy(&output.stdout)
            )
        })
    }

    /// File a ticket in category 1 and return its id.
    pub fn create_ticket(&self, user_id: &str, title: &str) -> i64 {
        let mut cmd = self.as_user(user_id);
        cmd.args(["ticket", "create", title, "-d", "details", "-c", "1"]);
        let json = Self::json(cmd);
        assert_eq!(json["outcome"], "created", "{}", json);
        json["id"].as_i64().unwrap()
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("helpdesk.db")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

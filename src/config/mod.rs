//! Configuration for the help desk.
//!
//! ## helpdesk.kdl
//!
//! Located at `~/.config/helpdesk/helpdesk.kdl`, or wherever `--config` points.
//!
//! Contains:
//! - `database` - SQLite database file
//! - `export-dir` - Directory JSON snapshots are written to (default `data`)
//! - `log-filter` - `tracing` filter used when `RUST_LOG` is unset (default `warn`)
//! - `default-user` - Acting user id when none is passed on the command line
//!
//! ## Precedence
//!
//! CLI flag > environment variable > config file > defaults
//!
//! Use the [`resolver`] module for precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    CONFIG_FILE_NAME, ConfigOverrides, DB_ENV, EXPORT_DIR_ENV, Resolved, ResolvedConfig,
    USER_ENV, ValueSource, load_config, resolve_config, resolve_config_with_env,
    system_config_path,
};
pub use schema::{DEFAULT_DATABASE, DEFAULT_LOG_FILTER, ExportDir, HelpdeskConfig};

//! Precedence resolution for configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables (`HELPDESK_DB`, `HELPDESK_EXPORT_DIR`, `HELPDESK_USER`)
//! 3. Config file (`--config`, else `~/.config/helpdesk/helpdesk.kdl`)
//! 4. Built-in defaults

use std::path::{Path, PathBuf};

use super::schema::{DEFAULT_DATABASE, DEFAULT_LOG_FILTER, ExportDir, HelpdeskConfig};
use crate::storage::parse_id;
use crate::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "helpdesk.kdl";
pub const DB_ENV: &str = "HELPDESK_DB";
pub const EXPORT_DIR_ENV: &str = "HELPDESK_EXPORT_DIR";
pub const USER_ENV: &str = "HELPDESK_USER";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from environment variable
    EnvVar(String),
    /// Value from the KDL config file
    ConfigFile,
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::ConfigFile => write!(f, "config"),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub database: Resolved<PathBuf>,
    pub export_dir: Resolved<ExportDir>,
    pub log_filter: Resolved<String>,
    /// Acting principal, if any layer named one
    pub user: Option<Resolved<i64>>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            database: Resolved::new(PathBuf::from(DEFAULT_DATABASE), ValueSource::Default),
            export_dir: Resolved::new(ExportDir::Data, ValueSource::Default),
            log_filter: Resolved::new(DEFAULT_LOG_FILTER.to_string(), ValueSource::Default),
            user: None,
        }
    }
}

impl ResolvedConfig {
    pub fn database(&self) -> &Path {
        &self.database.value
    }

    pub fn export_dir(&self) -> &Path {
        self.export_dir.value.path()
    }

    pub fn user(&self) -> Option<i64> {
        self.user.as_ref().map(|r| r.value)
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub user: Option<i64>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.database = Some(path.into());
        self
    }

    pub fn with_export_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_dir = Some(path.into());
        self
    }

    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user = Some(user_id);
        self
    }
}

/// Location of the per-user config file, if the platform has a config dir.
pub fn system_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("helpdesk").join(CONFIG_FILE_NAME))
}

/// Load the config file.
///
/// An explicit path must exist. Without one the system file is read when it is
/// present, otherwise the empty config is returned.
pub fn load_config(explicit: Option<&Path>) -> Result<HelpdeskConfig> {
    if let Some(path) = explicit {
        tracing::debug!(path = %path.display(), "loading config");
        return HelpdeskConfig::load(path);
    }
    match system_config_path() {
        Some(path) if path.is_file() => {
            tracing::debug!(path = %path.display(), "loading system config");
            HelpdeskConfig::load(&path)
        }
        _ => Ok(HelpdeskConfig::new()),
    }
}

/// Resolve configuration against the process environment.
pub fn resolve_config(
    file: &HelpdeskConfig,
    overrides: &ConfigOverrides,
) -> Result<ResolvedConfig> {
    resolve_config_with_env(file, overrides, |name| std::env::var(name).ok())
}

/// Resolve configuration with an explicit environment lookup.
pub fn resolve_config_with_env<F>(
    file: &HelpdeskConfig,
    overrides: &ConfigOverrides,
    env: F,
) -> Result<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = ResolvedConfig::default();
    let lookup = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    // Resolve database
    if let Some(ref path) = overrides.database {
        result.database = Resolved::new(path.clone(), ValueSource::CliFlag);
    } else if let Some(path) = lookup(DB_ENV) {
        result.database = Resolved::new(PathBuf::from(path), env_source(DB_ENV));
    } else if let Some(ref path) = file.database {
        result.database = Resolved::new(path.clone(), ValueSource::ConfigFile);
    }

    // Resolve export_dir
    if let Some(ref path) = overrides.export_dir {
        result.export_dir = Resolved::new(ExportDir::Custom(path.clone()), ValueSource::CliFlag);
    } else if let Some(path) = lookup(EXPORT_DIR_ENV) {
        result.export_dir = Resolved::new(ExportDir::parse(&path), env_source(EXPORT_DIR_ENV));
    } else if let Some(ref dir) = file.export_dir {
        result.export_dir = Resolved::new(dir.clone(), ValueSource::ConfigFile);
    }

    // Only the file sets log_filter; RUST_LOG is honoured by the subscriber itself
    if let Some(ref filter) = file.log_filter {
        result.log_filter = Resolved::new(filter.clone(), ValueSource::ConfigFile);
    }

    // Resolve user
    if let Some(id) = overrides.user {
        result.user = Some(Resolved::new(id, ValueSource::CliFlag));
    } else if let Some(raw) = lookup(USER_ENV) {
        let id = parse_id(&raw).map_err(|_| {
            Error::Config(format!("{} must be a user id, got {:?}", USER_ENV, raw))
        })?;
        result.user = Some(Resolved::new(id, env_source(USER_ENV)));
    } else if let Some(id) = file.default_user {
        result.user = Some(Resolved::new(id, ValueSource::ConfigFile));
    }

    Ok(result)
}

fn env_source(name: &str) -> ValueSource {
    ValueSource::EnvVar(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn file_config() -> HelpdeskConfig {
        HelpdeskConfig {
            database: Some(PathBuf::from("file.db")),
            export_dir: Some(ExportDir::Custom(PathBuf::from("file-out"))),
            log_filter: Some("helpdesk=debug".to_string()),
            default_user: Some(7),
        }
    }

    #[test]
    fn test_defaults() {
        let resolved =
            resolve_config_with_env(&HelpdeskConfig::new(), &ConfigOverrides::new(), env_of(&[]))
                .unwrap();
        assert_eq!(resolved.database(), Path::new(DEFAULT_DATABASE));
        assert_eq!(resolved.database.source, ValueSource::Default);
        assert_eq!(resolved.export_dir(), Path::new("data"));
        assert_eq!(resolved.log_filter.value, DEFAULT_LOG_FILTER);
        assert_eq!(resolved.user(), None);
    }

    #[test]
    fn test_file_beats_defaults() {
        let resolved =
            resolve_config_with_env(&file_config(), &ConfigOverrides::new(), env_of(&[])).unwrap();
        assert_eq!(resolved.database(), Path::new("file.db"));
        assert_eq!(resolved.database.source, ValueSource::ConfigFile);
        assert_eq!(resolved.export_dir(), Path::new("file-out"));
        assert_eq!(resolved.log_filter.value, "helpdesk=debug");
        assert_eq!(resolved.user(), Some(7));
    }

    #[test]
    fn test_env_beats_file() {
        let env = env_of(&[(DB_ENV, "env.db"), (USER_ENV, " 3 "), (EXPORT_DIR_ENV, "data")]);
        let resolved =
            resolve_config_with_env(&file_config(), &ConfigOverrides::new(), env).unwrap();
        assert_eq!(resolved.database(), Path::new("env.db"));
        assert_eq!(resolved.database.source, ValueSource::EnvVar(DB_ENV.to_string()));
        assert_eq!(resolved.export_dir.value, ExportDir::Data);
        assert_eq!(resolved.user(), Some(3));
    }

    #[test]
    fn test_cli_beats_env() {
        let env = env_of(&[(DB_ENV, "env.db"), (USER_ENV, "3")]);
        let overrides = ConfigOverrides::new()
            .with_database("cli.db")
            .with_export_dir("cli-out")
            .with_user(2);
        let resolved = resolve_config_with_env(&file_config(), &overrides, env).unwrap();
        assert_eq!(resolved.database(), Path::new("cli.db"));
        assert_eq!(resolved.database.source, ValueSource::CliFlag);
        assert_eq!(resolved.export_dir(), Path::new("cli-out"));
        assert_eq!(resolved.user(), Some(2));
        assert_eq!(resolved.user.unwrap().source.to_string(), "cli");
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let env = env_of(&[(DB_ENV, "  ")]);
        let resolved =
            resolve_config_with_env(&file_config(), &ConfigOverrides::new(), env).unwrap();
        assert_eq!(resolved.database.source, ValueSource::ConfigFile);
    }

    #[test]
    fn test_malformed_env_user_is_a_config_error() {
        let env = env_of(&[(USER_ENV, "admin")]);
        let err = resolve_config_with_env(&HelpdeskConfig::new(), &ConfigOverrides::new(), env)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.kdl");
        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "database \"x.db\"\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.database, Some(PathBuf::from("x.db")));
    }
}

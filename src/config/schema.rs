//! KDL schema for `helpdesk.kdl`.
//!
//! ```kdl
//! database "/var/lib/helpdesk/helpdesk.db"
//! export-dir "data"
//! log-filter "helpdesk=info"
//! default-user 1
//! ```
//!
//! Unknown nodes are ignored. Values of the wrong type are dropped and the
//! built-in default applies instead.

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

pub const DEFAULT_DATABASE: &str = "helpdesk.db";
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Directory exports are written to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExportDir {
    /// `data/`, relative to the working directory
    #[default]
    Data,
    Custom(PathBuf),
}

impl ExportDir {
    pub fn parse(s: &str) -> Self {
        if s == "data" {
            ExportDir::Data
        } else {
            ExportDir::Custom(PathBuf::from(s))
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ExportDir::Data => Path::new("data"),
            ExportDir::Custom(path) => path,
        }
    }
}

impl std::fmt::Display for ExportDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path().display())
    }
}

/// Settings read from `helpdesk.kdl`. Every field is optional; the resolver
/// fills the gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HelpdeskConfig {
    /// SQLite database file
    pub database: Option<PathBuf>,

    pub export_dir: Option<ExportDir>,

    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub log_filter: Option<String>,

    /// Acting user when none is given on the command line
    pub default_user: Option<i64>,
}

impl HelpdeskConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let doc = content
            .parse::<KdlDocument>()
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_kdl(&doc);
        config
            .validate()
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(user) = self.default_user {
            if user <= 0 {
                return Err(format!("default-user must be a positive id, got {}", user));
            }
        }
        if let Some(ref filter) = self.log_filter {
            if filter.trim().is_empty() {
                return Err("log-filter must not be empty".to_string());
            }
        }
        if let Some(ref db) = self.database {
            if db.as_os_str().is_empty() {
                return Err("database must not be empty".to_string());
            }
        }
        Ok(())
    }

    pub fn from_kdl(doc: &KdlDocument) -> Self {
        let mut config = Self::new();

        if let Some(s) = first_string(doc, "database") {
            config.database = Some(PathBuf::from(s));
        }

        if let Some(s) = first_string(doc, "export-dir") {
            config.export_dir = Some(ExportDir::parse(s));
        }

        if let Some(s) = first_string(doc, "log-filter") {
            config.log_filter = Some(s.to_string());
        }

        if let Some(node) = doc.get("default-user") {
            if let Some(entry) = node.entries().first() {
                if let Some(i) = entry.value().as_integer() {
                    config.default_user = i64::try_from(i).ok();
                }
            }
        }

        config
    }

    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(ref db) = self.database {
            push_string(&mut doc, "database", db.to_string_lossy().to_string());
        }

        if let Some(ref dir) = self.export_dir {
            push_string(&mut doc, "export-dir", dir.to_string());
        }

        if let Some(ref filter) = self.log_filter {
            push_string(&mut doc, "log-filter", filter.clone());
        }

        if let Some(user) = self.default_user {
            let mut node = KdlNode::new("default-user");
            node.push(KdlEntry::new(KdlValue::Integer(user as i128)));
            doc.nodes_mut().push(node);
        }

        doc
    }

    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &HelpdeskConfig) {
        if other.database.is_some() {
            self.database = other.database.clone();
        }
        if other.export_dir.is_some() {
            self.export_dir = other.export_dir.clone();
        }
        if other.log_filter.is_some() {
            self.log_filter = other.log_filter.clone();
        }
        if other.default_user.is_some() {
            self.default_user = other.default_user;
        }
    }
}

fn first_string<'a>(doc: &'a KdlDocument, name: &str) -> Option<&'a str> {
    doc.get(name)?.entries().first()?.value().as_string()
}

fn push_string(doc: &mut KdlDocument, name: &str, value: String) {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new(KdlValue::String(value)));
    doc.nodes_mut().push(node);
}

//! JSON snapshots of the help desk collections.
//!
//! Writes three pretty-printed files into one directory:
//! - `tickets.json` - tickets visible to the acting principal
//! - `usuarios.json` - all users
//! - `categorias.json` - active categories
//!
//! Each collection is read by its own query, so a snapshot taken while others
//! write may reference users or categories missing from the other files.
//! Each file is best-effort: a failure is logged and reported, and the
//! remaining files are still written.

use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::Result;
use crate::desk::HelpDesk;

pub const TICKETS_FILE: &str = "tickets.json";
pub const USERS_FILE: &str = "usuarios.json";
pub const CATEGORIES_FILE: &str = "categorias.json";

/// What an export wrote and what it could not.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportReport {
    pub directory: PathBuf,
    pub written: Vec<PathBuf>,
    pub failed: Vec<ExportFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportFailure {
    pub file: String,
    pub error: String,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Snapshot the principal's tickets, all users and the active categories into `dir`.
pub fn export_snapshot(desk: &HelpDesk, dir: &Path) -> ExportReport {
    let mut report = ExportReport {
        directory: dir.to_path_buf(),
        ..Default::default()
    };

    if let Err(e) = fs::create_dir_all(dir) {
        tracing::warn!(dir = %dir.display(), error = %e, "could not create export directory");
    }

    write_file(dir, TICKETS_FILE, &desk.list_tickets(), &mut report);
    write_file(dir, USERS_FILE, &desk.list_users(), &mut report);
    write_file(dir, CATEGORIES_FILE, &desk.list_categories(), &mut report);

    report
}

fn write_file<T: Serialize + ?Sized>(dir: &Path, name: &str, value: &T, report: &mut ExportReport) {
    let path = dir.join(name);
    match write_pretty(&path, value) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "exported");
            report.written.push(path);
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "export failed");
            report.failed.push(ExportFailure {
                file: name.to_string(),
                error: e.to_string(),
            });
        }
    }
}

fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

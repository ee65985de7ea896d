//! Helpdesk - a support-ticket domain layer over a relational store.
//!
//! This library records tickets filed by end users, routes them to
//! technicians, tracks them through a small status machine, accumulates
//! comments and exposes aggregate statistics and JSON snapshots. It backs
//! the `helpdesk` CLI but is meant to be embedded: callers resolve the acting
//! principal and hand it to [`desk::HelpDesk`].

pub mod cli;
pub mod commands;
pub mod config;
pub mod desk;
pub mod export;
pub mod models;
pub mod outcome;
pub mod storage;

/// Test utilities for isolated test environments.
#[cfg(test)]
pub(crate) mod test_utils {
    use chrono::Utc;

    use crate::models::{NewCategory, NewUser, Profile};
    use crate::storage::Storage;

    pub const ADMIN_ID: i64 = 1;
    pub const TECH_ID: i64 = 2;
    pub const USER_ID: i64 = 3;
    pub const OTHER_USER_ID: i64 = 4;

    pub const HARDWARE_ID: i64 = 1;
    pub const NETWORK_ID: i64 = 2;

    /// In-memory storage with one admin, one technician, two plain users and
    /// two active categories. Ids match the constants above.
    pub fn seeded_storage() -> Storage {
        let mut storage = Storage::open_in_memory().unwrap();

        let people = [
            ("Ana Admin", "ana@example.com", Profile::Admin),
            ("Tiago Tecnico", "tiago@example.com", Profile::Technician),
            ("Ursula User", "ursula@example.com", Profile::User),
            ("Otto Other", "otto@example.com", Profile::User),
        ];
        for (name, email, profile) in people {
            storage
                .insert_user(&NewUser {
                    name: name.to_string(),
                    email: email.to_string(),
                    profile,
                    department_id: 1,
                    created_at: Utc::now(),
                })
                .unwrap();
        }

        for (name, colour) in [("Hardware", "#ff6b6b"), ("Rede", "#4ecdc4")] {
            storage
                .insert_category(&NewCategory {
                    name: name.to_string(),
                    description: format!("{} issues", name),
                    colour: colour.to_string(),
                })
                .unwrap();
        }

        storage
    }
}

/// Library-level error type for help desk operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// An enumerated or timestamp column held something outside its domain.
    #[error("Unknown value {value:?} in column {column}")]
    UnknownValue { column: &'static str, value: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for help desk operations.
pub type Result<T> = std::result::Result<T, Error>;

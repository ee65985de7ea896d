use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Profile;

/// A person who files or works tickets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Unique across users (enforced by the store)
    pub email: String,
    pub profile: Profile,
    pub department_id: i64,
    /// Inactive users are soft-deleted and cannot act as principal
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to register a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub profile: Profile,
    pub department_id: i64,
    pub created_at: DateTime<Utc>,
}

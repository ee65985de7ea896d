//! Data models for the help desk.
//!
//! This module defines the closed value sets and the entity snapshots:
//! - `Status`, `Priority`, `Profile`, `CommentType` - enumerations persisted by symbolic name
//! - `Ticket` / `TicketDetails` - the primary aggregate and its hydrated form
//! - `User` - a principal, with the access rules in [`access`]
//! - `Comment` - append-only notes on a ticket
//! - `Category` - ticket classification, soft-deletable
//!
//! Entities are immutable snapshots of what the store returned. All state
//! changes go through [`crate::storage::Storage`].

pub mod access;
mod category;
mod comment;
mod ticket;
mod user;

pub use access::Scope;
pub use category::{Category, NewCategory};
pub use comment::{Comment, NewComment};
pub use ticket::{NewTicket, TagSet, Ticket, TicketDetails};
pub use user::{NewUser, User};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display format used for timestamps shown to people.
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Format a timestamp the way the help desk shows it (`dd/MM/yyyy HH:mm`).
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(DISPLAY_DATE_FORMAT).to_string()
}

/// Ticket status in the workflow.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Status {
    #[default]
    #[serde(rename = "ABERTO")]
    Open,
    #[serde(rename = "EM_ANDAMENTO")]
    InProgress,
    #[serde(rename = "RESOLVIDO")]
    Resolved,
    #[serde(rename = "FECHADO")]
    Closed,
}

impl Status {
    /// Symbolic name as stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "ABERTO",
            Status::InProgress => "EM_ANDAMENTO",
            Status::Resolved => "RESOLVIDO",
            Status::Closed => "FECHADO",
        }
    }

    /// Human-readable label.
    pub fn display_name(&self) -> &'static str {
        match self {
            Status::Open => "Aberto",
            Status::InProgress => "Em Andamento",
            Status::Resolved => "Resolvido",
            Status::Closed => "Fechado",
        }
    }

    /// Badge colour used by front ends.
    pub fn colour(&self) -> &'static str {
        match self {
            Status::Open => "#ff6b6b",
            Status::InProgress => "#4ecdc4",
            Status::Resolved => "#45b7d1",
            Status::Closed => "#96ceb4",
        }
    }

    /// True for the states that carry a resolution timestamp.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Status::Resolved | Status::Closed)
    }

    /// Whether a principal with `profile` may move a ticket from `self` to `next`.
    ///
    /// Re-applying the current status is always allowed. A closed ticket can only
    /// be reopened by an administrator.
    pub fn can_transition_to(&self, next: Status, profile: Profile) -> bool {
        use Status::*;

        if *self == next {
            return true;
        }
        match (self, next) {
            (Open, InProgress | Resolved | Closed) => true,
            (InProgress, Open | Resolved | Closed) => true,
            (Resolved, InProgress | Closed) => true,
            (Closed, Open) => profile == Profile::Admin,
            _ => false,
        }
    }

    /// Get all statuses in workflow order.
    pub fn all() -> &'static [Status] {
        &[
            Status::Open,
            Status::InProgress,
            Status::Resolved,
            Status::Closed,
        ]
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ABERTO" => Ok(Status::Open),
            "EM_ANDAMENTO" => Ok(Status::InProgress),
            "RESOLVIDO" => Ok(Status::Resolved),
            "FECHADO" => Ok(Status::Closed),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

/// Ticket priority. Ordering follows `level()` and is only used for display sorting.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Priority {
    #[serde(rename = "BAIXA")]
    Low,
    #[default]
    #[serde(rename = "MEDIA")]
    Medium,
    #[serde(rename = "ALTA")]
    High,
    #[serde(rename = "CRITICA")]
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "BAIXA",
            Priority::Medium => "MEDIA",
            Priority::High => "ALTA",
            Priority::Critical => "CRITICA",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Priority::Low => "Baixa",
            Priority::Medium => "Média",
            Priority::High => "Alta",
            Priority::Critical => "Crítica",
        }
    }

    /// Numeric level, 1 (low) to 4 (critical).
    pub fn level(&self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Critical => 4,
        }
    }

    pub fn colour(&self) -> &'static str {
        match self {
            Priority::Low => "#96ceb4",
            Priority::Medium => "#feca57",
            Priority::High => "#ff9ff3",
            Priority::Critical => "#ff6b6b",
        }
    }

    pub fn all() -> &'static [Priority] {
        &[
            Priority::Low,
            Priority::Medium,
            Priority::High,
            Priority::Critical,
        ]
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "BAIXA" => Ok(Priority::Low),
            "MEDIA" => Ok(Priority::Medium),
            "ALTA" => Ok(Priority::High),
            "CRITICA" => Ok(Priority::Critical),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// Coarse-grained role controlling visibility and mutation rights.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Profile {
    #[default]
    #[serde(rename = "USUARIO")]
    User,
    #[serde(rename = "TECNICO")]
    Technician,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::User => "USUARIO",
            Profile::Technician => "TECNICO",
            Profile::Admin => "ADMIN",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Profile::User => "Usuário",
            Profile::Technician => "Técnico",
            Profile::Admin => "Administrador",
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            Profile::User => 1,
            Profile::Technician => 2,
            Profile::Admin => 3,
        }
    }

    /// Technicians and administrators see and edit every ticket.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Profile::Technician | Profile::Admin)
    }

    pub fn all() -> &'static [Profile] {
        &[Profile::User, Profile::Technician, Profile::Admin]
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "USUARIO" => Ok(Profile::User),
            "TECNICO" => Ok(Profile::Technician),
            "ADMIN" => Ok(Profile::Admin),
            _ => Err(format!("Unknown profile: {}", s)),
        }
    }
}

/// Kind of comment attached to a ticket.
///
/// `Internal` notes are meant for privileged profiles only; listings do not
/// filter them yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommentType {
    #[default]
    #[serde(rename = "COMENTARIO")]
    Comment,
    #[serde(rename = "RESOLUCAO")]
    Resolution,
    #[serde(rename = "INTERNO")]
    Internal,
}

impl CommentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentType::Comment => "COMENTARIO",
            CommentType::Resolution => "RESOLUCAO",
            CommentType::Internal => "INTERNO",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CommentType::Comment => "Comentário",
            CommentType::Resolution => "Resolução",
            CommentType::Internal => "Interno",
        }
    }

    pub fn all() -> &'static [CommentType] {
        &[
            CommentType::Comment,
            CommentType::Resolution,
            CommentType::Internal,
        ]
    }
}

impl fmt::Display for CommentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CommentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "COMENTARIO" => Ok(CommentType::Comment),
            "RESOLUCAO" => Ok(CommentType::Resolution),
            "INTERNO" => Ok(CommentType::Internal),
            _ => Err(format!("Unknown comment type: {}", s)),
        }
    }
}

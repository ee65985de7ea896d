use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Comment, Priority, Status, format_timestamp};

/// A support ticket as last read from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticket {
    /// Store-assigned identifier
    pub id: i64,

    /// Short human-readable code (e.g. "TK-00042"), generated by the store
    pub code: String,

    pub title: String,

    pub description: String,

    pub status: Status,

    pub priority: Priority,

    pub category_id: i64,

    /// User who filed the ticket; never changes after creation
    pub requester_id: i64,

    /// Responsible technician or admin, if any
    pub assignee_id: Option<i64>,

    pub created_at: DateTime<Utc>,

    /// Refreshed on every mutation
    pub updated_at: DateTime<Utc>,

    /// First time the ticket reached RESOLVED or CLOSED
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Ticket {
    pub fn created_at_formatted(&self) -> String {
        format_timestamp(&self.created_at)
    }

    pub fn updated_at_formatted(&self) -> String {
        format_timestamp(&self.updated_at)
    }

    /// Whole hours the ticket has been open: until its resolution, or until `now`
    /// while still unresolved.
    pub fn hours_open(&self, now: DateTime<Utc>) -> i64 {
        let end = self.resolved_at.unwrap_or(now);
        (end - self.created_at).num_hours()
    }
}

/// Fields a requester supplies when filing a ticket.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub category_id: i64,
    pub requester_id: i64,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

/// Insertion-ordered set of tags with no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag. Returns false if it was already present.
    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.0.contains(&tag) {
            return false;
        }
        self.0.push(tag);
        true
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for TagSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

/// A ticket together with its auxiliary collections, hydrated on demand.
#[derive(Debug, Clone, Serialize)]
pub struct TicketDetails {
    #[serde(flatten)]
    pub ticket: Ticket,

    /// Attachment identifiers; contents live elsewhere
    pub attachments: Vec<String>,

    pub tags: TagSet,

    pub comments: Vec<Comment>,
}

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{CommentType, format_timestamp};

/// A note on a ticket. Comments are never edited once written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: i64,
    pub ticket_id: i64,
    pub author_id: i64,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: CommentType,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn created_at_formatted(&self) -> String {
        format_timestamp(&self.created_at)
    }
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub ticket_id: i64,
    pub author_id: i64,
    pub content: String,
    pub kind: CommentType,
    pub created_at: DateTime<Utc>,
}

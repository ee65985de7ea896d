use serde::Serialize;

/// Ticket classification. Only active categories accept new tickets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Hex colour shown next to the category name
    pub colour: String,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub colour: String,
}

//! Command implementations for the helpdesk CLI.
//!
//! Ticket writes go through [`HelpDesk`] and come back as an [`Outcome`].
//! User and category administration talks to the store directly and is
//! restricted to administrators. Every result implements [`Output`] so the
//! binary can print it as JSON or as text.

use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::{ResolvedConfig, ValueSource};
use crate::desk::HelpDesk;
use crate::export::ExportReport;
use crate::models::{
    Category, NewCategory, NewUser, Priority, Profile, Status, Ticket, TicketDetails, User,
};
use crate::outcome::Outcome;
use crate::storage::{Storage, TicketStatistics, parse_id};
use crate::{Error, Result};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    fn to_json(&self) -> String;

    fn to_human(&self) -> String;
}

fn json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| format!(r#"{{"error": "serialization failed: {}"}}"#, e))
}

// === Init ===

pub const SEED_ADMIN_NAME: &str = "Administrador";
pub const SEED_ADMIN_EMAIL: &str = "admin@helpdesk.local";
pub const SEED_CATEGORY_NAME: &str = "Geral";

#[derive(Serialize)]
pub struct InitResult {
    pub database: PathBuf,
    /// Id of the administrator created on a fresh database
    pub admin_id: Option<i64>,
    pub category_id: Option<i64>,
}

impl Output for InitResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("Database ready at {}", self.database.display())];
        match (self.admin_id, self.category_id) {
            (Some(admin), Some(category)) => {
                lines.push(format!(
                    "  Created administrator #{} ({}) and category #{} ({})",
                    admin, SEED_ADMIN_EMAIL, category, SEED_CATEGORY_NAME
                ));
                lines.push(format!("  Act as the administrator with --as {}", admin));
            }
            _ => lines.push("  Existing data kept, nothing seeded".to_string()),
        }
        lines.join("\n")
    }
}

/// Make sure the schema exists and seed a first administrator and category
/// when the database has no users yet.
pub fn init(storage: &mut Storage, database: &Path) -> Result<InitResult> {
    let mut result = InitResult {
        database: database.to_path_buf(),
        admin_id: None,
        category_id: None,
    };
    if storage.count_users()? > 0 {
        return Ok(result);
    }

    let admin_id = storage.insert_user(&NewUser {
        name: SEED_ADMIN_NAME.to_string(),
        email: SEED_ADMIN_EMAIL.to_string(),
        profile: Profile::Admin,
        department_id: 1,
        created_at: Utc::now(),
    })?;
    let category_id = storage.insert_category(&NewCategory {
        name: SEED_CATEGORY_NAME.to_string(),
        description: "Solicitações gerais".to_string(),
        colour: "#45b7d1".to_string(),
    })?;
    tracing::info!(admin_id, category_id, "seeded fresh database");

    result.admin_id = Some(admin_id);
    result.category_id = Some(category_id);
    Ok(result)
}

// === Tickets ===

impl Output for Outcome {
    fn to_json(&self) -> String {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let serde_json::Value::Object(ref mut map) = value {
            map.insert("message".to_string(), self.to_string().into());
        }
        value.to_string()
    }

    fn to_human(&self) -> String {
        self.to_string()
    }
}

fn ticket_line(ticket: &Ticket) -> String {
    format!(
        "{} [{}] [{}] {}",
        ticket.code,
        ticket.status,
        ticket.priority,
        ticket.title
    )
}

#[derive(Serialize)]
pub struct TicketList {
    pub tickets: Vec<Ticket>,
    pub count: usize,
}

impl TicketList {
    pub fn new(tickets: Vec<Ticket>) -> Self {
        let count = tickets.len();
        Self { tickets, count }
    }
}

impl Output for TicketList {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.tickets.is_empty() {
            return "No tickets found.".to_string();
        }
        let mut lines = vec![format!("{} ticket(s):", self.count)];
        lines.extend(self.tickets.iter().map(|t| format!("  {}", ticket_line(t))));
        lines.join("\n")
    }
}

/// Tickets visible to the principal, optionally narrowed by status and priority.
pub fn ticket_list(
    desk: &HelpDesk,
    status: Option<Status>,
    priority: Option<Priority>,
) -> TicketList {
    TicketList::new(desk.filter_tickets(status, priority))
}

pub fn ticket_search(desk: &HelpDesk, term: &str) -> TicketList {
    TicketList::new(desk.search_tickets(term))
}

impl Output for TicketDetails {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let t = &self.ticket;
        let mut lines = vec![
            ticket_line(t),
            format!("  {}", t.description),
            format!(
                "  Category: #{}  Requester: #{}  Assignee: {}",
                t.category_id,
                t.requester_id,
                t.assignee_id
                    .map(|id| format!("#{}", id))
                    .unwrap_or_else(|| "-".to_string())
            ),
            format!(
                "  Created: {}  Updated: {}",
                t.created_at_formatted(),
                t.updated_at_formatted()
            ),
        ];
        if !self.tags.is_empty() {
            lines.push(format!("  Tags: {}", self.tags.iter().collect::<Vec<_>>().join(", ")));
        }
        if !self.attachments.is_empty() {
            lines.push(format!("  Attachments: {}", self.attachments.join(", ")));
        }
        if !self.comments.is_empty() {
            lines.push(format!("  Comments ({}):", self.comments.len()));
            for c in &self.comments {
                lines.push(format!(
                    "    [{}] #{} {}: {}",
                    c.created_at_formatted(),
                    c.author_id,
                    c.kind,
                    c.content
                ));
            }
        }
        lines.join("\n")
    }
}

pub fn ticket_show(desk: &HelpDesk, id: &str) -> Result<TicketDetails> {
    desk.ticket_details(id)
        .ok_or_else(|| Error::NotFound(format!("Ticket not found: {}", id)))
}

// === Users ===

#[derive(Serialize)]
pub struct UserList {
    pub users: Vec<User>,
    pub count: usize,
}

impl Output for UserList {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.users.is_empty() {
            return "No users found.".to_string();
        }
        let mut lines = vec![format!("{} user(s):", self.count)];
        for u in &self.users {
            let inactive = if u.active { "" } else { " (inactive)" };
            lines.push(format!(
                "  #{} {} <{}> [{}]{}",
                u.id, u.name, u.email, u.profile, inactive
            ));
        }
        lines.join("\n")
    }
}

pub fn user_list(desk: &HelpDesk) -> UserList {
    let users = desk.list_users();
    let count = users.len();
    UserList { users, count }
}

/// Id of an entity an administrative command created or changed.
#[derive(Debug, Serialize)]
pub struct EntityChanged {
    pub entity: &'static str,
    pub id: i64,
    pub action: &'static str,
}

impl Output for EntityChanged {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("{} #{} {}", self.entity, self.id, self.action)
    }
}

fn require_admin(desk: &HelpDesk) -> Result<()> {
    match desk.principal() {
        Some(user) if user.profile == Profile::Admin => Ok(()),
        Some(user) => Err(Error::PermissionDenied(format!(
            "user #{} is not an administrator",
            user.id
        ))),
        None => Err(Error::PermissionDenied(
            "no acting user; pass --as <user-id>".to_string(),
        )),
    }
}

pub fn user_add(
    desk: &mut HelpDesk,
    name: &str,
    email: &str,
    profile: Profile,
    department_id: i64,
) -> Result<EntityChanged> {
    require_admin(desk)?;
    if name.trim().is_empty() || email.trim().is_empty() {
        return Err(Error::InvalidInput("name and email are required".to_string()));
    }
    let id = desk.storage_mut().insert_user(&NewUser {
        name: name.trim().to_string(),
        email: email.trim().to_string(),
        profile,
        department_id,
        created_at: Utc::now(),
    })?;
    tracing::info!(user_id = id, %profile, "user added");
    Ok(EntityChanged {
        entity: "user",
        id,
        action: "created",
    })
}

pub fn user_deactivate(desk: &mut HelpDesk, id: &str) -> Result<EntityChanged> {
    require_admin(desk)?;
    let id = parse_id(id)?;
    if desk.principal().is_some_and(|p| p.id == id) {
        return Err(Error::InvalidInput("cannot deactivate the acting user".to_string()));
    }
    if !desk.storage_mut().set_user_active(id, false)? {
        return Err(Error::NotFound(format!("User not found: {}", id)));
    }
    tracing::info!(user_id = id, "user deactivated");
    Ok(EntityChanged {
        entity: "user",
        id,
        action: "deactivated",
    })
}

// === Categories ===

#[derive(Serialize)]
pub struct CategoryList {
    pub categories: Vec<Category>,
    pub count: usize,
}

impl Output for CategoryList {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.categories.is_empty() {
            return "No active categories.".to_string();
        }
        let noun = if self.count == 1 { "category" } else { "categories" };
        let mut lines = vec![format!("{} {}:", self.count, noun)];
        for c in &self.categories {
            lines.push(format!("  #{} {} {} - {}", c.id, c.colour, c.name, c.description));
        }
        lines.join("\n")
    }
}

pub fn category_list(desk: &HelpDesk) -> CategoryList {
    let categories = desk.list_categories();
    let count = categories.len();
    CategoryList { categories, count }
}

pub fn category_add(
    desk: &mut HelpDesk,
    name: &str,
    description: &str,
    colour: &str,
) -> Result<EntityChanged> {
    require_admin(desk)?;
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("category name is required".to_string()));
    }
    let id = desk.storage_mut().insert_category(&NewCategory {
        name: name.trim().to_string(),
        description: description.to_string(),
        colour: colour.to_string(),
    })?;
    tracing::info!(category_id = id, "category added");
    Ok(EntityChanged {
        entity: "category",
        id,
        action: "created",
    })
}

pub fn category_deactivate(desk: &mut HelpDesk, id: &str) -> Result<EntityChanged> {
    require_admin(desk)?;
    let id = parse_id(id)?;
    if !desk.storage_mut().set_category_active(id, false)? {
        return Err(Error::NotFound(format!("Category not found: {}", id)));
    }
    tracing::info!(category_id = id, "category deactivated");
    Ok(EntityChanged {
        entity: "category",
        id,
        action: "deactivated",
    })
}

// === Statistics and export ===

impl Output for TicketStatistics {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Tickets: {} total, {} not closed", self.total, self.open),
            format!("Mean resolution time: {:.1}h", self.mean_resolution_hours),
            "By status:".to_string(),
        ];
        for (status, count) in &self.by_status {
            lines.push(format!("  {:<14} {}", status.display_name(), count));
        }
        lines.push("By priority:".to_string());
        for (priority, count) in &self.by_priority {
            lines.push(format!("  {:<14} {}", priority.display_name(), count));
        }
        lines.join("\n")
    }
}

impl Output for ExportReport {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "Exported {} file(s) to {}",
            self.written.len(),
            self.directory.display()
        )];
        for failure in &self.failed {
            lines.push(format!("  failed: {} ({})", failure.file, failure.error));
        }
        lines.join("\n")
    }
}

// === Config ===

#[derive(Serialize)]
pub struct ConfigEntry {
    pub key: &'static str,
    pub value: Option<String>,
    pub source: Option<String>,
}

#[derive(Serialize)]
pub struct ConfigView {
    pub entries: Vec<ConfigEntry>,
}

impl Output for ConfigView {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        self.entries
            .iter()
            .map(|e| {
                format!(
                    "{} = {} ({})",
                    e.key,
                    e.value.as_deref().unwrap_or("<unset>"),
                    e.source.as_deref().unwrap_or("unset")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Effective settings and where each came from.
pub fn config_show(config: &ResolvedConfig) -> ConfigView {
    fn entry(key: &'static str, value: String, source: &ValueSource) -> ConfigEntry {
        ConfigEntry {
            key,
            value: Some(value),
            source: Some(source.to_string()),
        }
    }

    let mut entries = vec![
        entry(
            "database",
            config.database().display().to_string(),
            &config.database.source,
        ),
        entry(
            "export-dir",
            config.export_dir().display().to_string(),
            &config.export_dir.source,
        ),
        entry(
            "log-filter",
            config.log_filter.value.clone(),
            &config.log_filter.source,
        ),
    ];
    entries.push(match config.user {
        Some(ref user) => entry("user", user.value.to_string(), &user.source),
        None => ConfigEntry {
            key: "user",
            value: None,
            source: None,
        },
    });
    ConfigView { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOverrides;
    use crate::test_utils::{ADMIN_ID, HARDWARE_ID, TECH_ID, USER_ID, seeded_storage};

    fn desk_as(user_id: i64) -> HelpDesk {
        let mut desk = HelpDesk::new(seeded_storage());
        desk.sign_in(user_id).unwrap();
        desk
    }

    #[test]
    fn test_init_seeds_empty_database() {
        let mut storage = Storage::open_in_memory().unwrap();
        let result = init(&mut storage, Path::new("hd.db")).unwrap();
        assert_eq!(result.admin_id, Some(1));
        assert_eq!(result.category_id, Some(1));

        let admin = storage.get_user(1).unwrap().unwrap();
        assert_eq!(admin.profile, Profile::Admin);
        assert_eq!(admin.email, SEED_ADMIN_EMAIL);
        assert_eq!(storage.list_active_categories().unwrap().len(), 1);
    }

    #[test]
    fn test_init_is_idempotent() {
        let mut storage = Storage::open_in_memory().unwrap();
        init(&mut storage, Path::new("hd.db")).unwrap();
        let again = init(&mut storage, Path::new("hd.db")).unwrap();
        assert_eq!(again.admin_id, None);
        assert_eq!(storage.count_users().unwrap(), 1);
        assert!(again.to_human().contains("nothing seeded"));
    }

    #[test]
    fn test_outcome_json_carries_message() {
        let value: serde_json::Value =
            serde_json::from_str(&Outcome::Created { id: 9 }.to_json()).unwrap();
        assert_eq!(value["outcome"], "created");
        assert_eq!(value["id"], 9);
        assert_eq!(value["message"], "Ticket criado com sucesso! ID: 9");
    }

    #[test]
    fn test_ticket_list_combines_filters() {
        let mut desk = desk_as(ADMIN_ID);
        desk.create_ticket("one", "d", "1");
        desk.create_ticket("two", "d", "1");
        desk.update_status("2", Status::InProgress);

        let all = ticket_list(&desk, None, None);
        assert_eq!(all.count, 2);
        let open = ticket_list(&desk, Some(Status::Open), Some(Priority::Medium));
        assert_eq!(open.count, 1);
        assert_eq!(open.tickets[0].title, "one");
        let high = ticket_list(&desk, Some(Status::Open), Some(Priority::High));
        assert_eq!(high.count, 0);
        assert_eq!(high.to_human(), "No tickets found.");
    }

    #[test]
    fn test_ticket_show_missing_is_not_found() {
        let desk = desk_as(USER_ID);
        assert!(matches!(ticket_show(&desk, "77"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_ticket_show_human() {
        let mut desk = desk_as(USER_ID);
        desk.create_ticket("Printer", "Out of toner", &HARDWARE_ID.to_string());
        desk.add_tag("1", "printer");
        let details = ticket_show(&desk, "1").unwrap();
        let text = details.to_human();
        assert!(text.starts_with("TK-00001 [ABERTO] [MEDIA] Printer"));
        assert!(text.contains("Tags: printer"));
        assert!(text.contains("Assignee: -"));
    }

    #[test]
    fn test_user_admin_requires_admin() {
        let mut desk = desk_as(TECH_ID);
        let err = user_add(&mut desk, "New", "new@example.com", Profile::User, 1).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));

        let mut desk = HelpDesk::new(seeded_storage());
        assert!(matches!(
            category_add(&mut desk, "Software", "", "#000000"),
            Err(Error::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_user_add_and_deactivate() {
        let mut desk = desk_as(ADMIN_ID);
        let created =
            user_add(&mut desk, " New ", "new@example.com", Profile::Technician, 2).unwrap();
        assert_eq!(created.id, 5);
        let user = desk.storage().get_user(5).unwrap().unwrap();
        assert_eq!(user.name, "New");

        user_deactivate(&mut desk, "5").unwrap();
        assert!(!desk.storage().get_user(5).unwrap().unwrap().active);
        assert!(matches!(user_deactivate(&mut desk, "99"), Err(Error::NotFound(_))));
        assert!(matches!(
            user_deactivate(&mut desk, &ADMIN_ID.to_string()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_duplicate_email_is_a_database_error() {
        let mut desk = desk_as(ADMIN_ID);
        let err = user_add(&mut desk, "Dup", "ana@example.com", Profile::User, 1).unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }

    #[test]
    fn test_category_add_and_deactivate() {
        let mut desk = desk_as(ADMIN_ID);
        let created = category_add(&mut desk, "Software", "Apps", "#123456").unwrap();
        assert_eq!(category_list(&desk).count, 3);
        category_deactivate(&mut desk, &created.id.to_string()).unwrap();
        assert_eq!(category_list(&desk).count, 2);
        assert!(matches!(category_add(&mut desk, " ", "", ""), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_config_show_lists_sources() {
        let resolved = crate::config::resolve_config_with_env(
            &crate::config::HelpdeskConfig::new(),
            &ConfigOverrides::new().with_database("x.db"),
            |_| None,
        )
        .unwrap();
        let view = config_show(&resolved);
        assert_eq!(view.entries.len(), 4);
        assert_eq!(view.entries[0].value.as_deref(), Some("x.db"));
        assert_eq!(view.entries[0].source.as_deref(), Some("cli"));
        assert!(view.to_human().contains("user = <unset> (unset)"));
    }
}

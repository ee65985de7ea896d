//! Storage layer for the help desk.
//!
//! `Storage` owns the single SQLite connection the process works against and
//! issues every statement the domain layer needs. All user-supplied values
//! are bound as parameters; nothing is concatenated into SQL text.
//!
//! Tables (column names are part of the external contract):
//! - `tickets`, `usuarios`, `comentarios`, `categorias`
//! - `ticket_tags`, `ticket_anexos` - auxiliary collections, hydrated on demand
//!
//! Enumerated columns hold symbolic names (`ABERTO`, `MEDIA`, ...), never
//! ordinals.

pub mod rows;
mod stats;

pub use stats::TicketStatistics;

use crate::models::{
    Category, Comment, NewCategory, NewComment, NewTicket, NewUser, Priority, Scope, Status,
    TagSet, Ticket, User,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rows::{
    CATEGORY_COLUMNS, COMMENT_COLUMNS, TICKET_COLUMNS, USER_COLUMNS, category_from_row,
    comment_from_row, ticket_from_row, timestamp_to_db, user_from_row,
};
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

/// Filter for ticket listings.
///
/// Every predicate is conjoined in SQL, including the visibility scope, so the
/// store only ever returns rows the principal may see.
#[derive(Debug, Clone)]
pub struct TicketQuery {
    pub scope: Scope,
    /// Case-insensitive substring of title, description or code
    pub term: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
}

impl TicketQuery {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            term: None,
            status: None,
            priority: None,
        }
    }

    /// Blank terms are ignored, so searching for "" lists everything in scope.
    pub fn with_term(mut self, term: &str) -> Self {
        self.term = if term.trim().is_empty() {
            None
        } else {
            Some(term.to_string())
        };
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Handle on the help desk database.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open (or create) the database file at `path` and make sure the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database. Used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        Self::register_functions(&conn)?;
        Self::init_schema(&conn)?;
        tracing::debug!("help desk schema ready");
        Ok(Self { conn })
    }

    /// SQLite's own `lower()` and `LIKE` only fold ASCII letters, so searches
    /// compare through `hd_lower`, which folds any Unicode text.
    fn register_functions(conn: &Connection) -> Result<()> {
        conn.create_scalar_function(
            "hd_lower",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let text = ctx.get::<Option<String>>(0)?;
                Ok(text.map(|t| t.to_lowercase()))
            },
        )?;
        Ok(())
    }

    /// Initialize the SQLite schema.
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS usuarios (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                nome TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                perfil TEXT NOT NULL DEFAULT 'USUARIO',
                departamento_id INTEGER NOT NULL DEFAULT 0,
                ativo INTEGER NOT NULL DEFAULT 1,
                data_criacao TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS categorias (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                nome TEXT NOT NULL,
                descricao TEXT NOT NULL DEFAULT '',
                cor TEXT NOT NULL DEFAULT '#cccccc',
                ativa INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS tickets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                codigo TEXT UNIQUE,
                titulo TEXT NOT NULL,
                descricao TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'ABERTO',
                prioridade TEXT NOT NULL DEFAULT 'MEDIA',
                categoria_id INTEGER NOT NULL REFERENCES categorias(id),
                solicitante_id INTEGER NOT NULL REFERENCES usuarios(id),
                responsavel_id INTEGER REFERENCES usuarios(id),
                data_criacao TEXT NOT NULL,
                data_atualizacao TEXT NOT NULL,
                data_resolucao TEXT
            );

            -- Short human-readable code, assigned once the id is known
            CREATE TRIGGER IF NOT EXISTS tickets_codigo
            AFTER INSERT ON tickets
            WHEN NEW.codigo IS NULL
            BEGIN
                UPDATE tickets SET codigo = 'TK-' || printf('%05d', NEW.id) WHERE id = NEW.id;
            END;

            CREATE TABLE IF NOT EXISTS comentarios (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticket_id INTEGER NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
                usuario_id INTEGER NOT NULL REFERENCES usuarios(id),
                conteudo TEXT NOT NULL,
                tipo TEXT NOT NULL DEFAULT 'COMENTARIO',
                data TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS ticket_tags (
                ticket_id INTEGER NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
                tag TEXT NOT NULL,
                PRIMARY KEY (ticket_id, tag)
            );

            CREATE TABLE IF NOT EXISTS ticket_anexos (
                ticket_id INTEGER NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
                anexo TEXT NOT NULL,
                PRIMARY KEY (ticket_id, anexo)
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
            CREATE INDEX IF NOT EXISTS idx_tickets_prioridade ON tickets(prioridade);
            CREATE INDEX IF NOT EXISTS idx_tickets_solicitante ON tickets(solicitante_id);
            CREATE INDEX IF NOT EXISTS idx_comentarios_ticket ON comentarios(ticket_id);
            "#,
        )?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    // === Ticket Operations ===

    /// Insert a new ticket in OPEN status and return its generated id.
    pub fn insert_ticket(&mut self, ticket: &NewTicket) -> Result<i64> {
        let now = timestamp_to_db(&ticket.created_at);
        self.conn.execute(
            "INSERT INTO tickets (titulo, descricao, status, prioridade, categoria_id, solicitante_id, data_criacao, data_atualizacao)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                ticket.title,
                ticket.description,
                Status::Open.as_str(),
                ticket.priority.as_str(),
                ticket.category_id,
                ticket.requester_id,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(ticket_id = id, "inserted ticket");
        Ok(id)
    }

    /// Get a ticket by id, or `None` if there is no such row.
    pub fn get_ticket(&self, id: i64) -> Result<Option<Ticket>> {
        let sql = format!("SELECT {} FROM tickets WHERE id = ?1", TICKET_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(ticket_from_row(row)?)),
            None => Ok(None),
        }
    }

    /// List tickets matching `query`, oldest first.
    pub fn list_tickets(&self, query: &TicketQuery) -> Result<Vec<Ticket>> {
        let mut sql = format!("SELECT {} FROM tickets WHERE 1=1", TICKET_COLUMNS);
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(term) = &query.term {
            sql.push_str(
                " AND (hd_lower(titulo) LIKE hd_lower(?) ESCAPE '\\' \
                 OR hd_lower(descricao) LIKE hd_lower(?) ESCAPE '\\' \
                 OR hd_lower(codigo) LIKE hd_lower(?) ESCAPE '\\')",
            );
            let pattern = like_pattern(term);
            for _ in 0..3 {
                params_vec.push(Box::new(pattern.clone()));
            }
        }
        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            params_vec.push(Box::new(status.as_str()));
        }
        if let Some(priority) = query.priority {
            sql.push_str(" AND prioridade = ?");
            params_vec.push(Box::new(priority.as_str()));
        }
        if let Scope::RequesterOnly(user_id) = query.scope {
            sql.push_str(" AND solicitante_id = ?");
            params_vec.push(Box::new(user_id));
        }

        sql.push_str(" ORDER BY id ASC");
        tracing::debug!(%sql, "listing tickets");

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_refs.as_slice())?;
        let mut tickets = Vec::new();
        while let Some(row) = rows.next()? {
            tickets.push(ticket_from_row(row)?);
        }
        Ok(tickets)
    }

    /// Set a ticket's status. Reaching RESOLVED or CLOSED stamps the
    /// resolution time unless one is already recorded.
    ///
    /// Returns false if the ticket does not exist.
    pub fn update_status(&mut self, id: i64, status: Status, now: DateTime<Utc>) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE tickets
             SET status = ?1,
                 data_atualizacao = ?2,
                 data_resolucao = CASE
                     WHEN ?1 IN ('RESOLVIDO', 'FECHADO') THEN COALESCE(data_resolucao, ?2)
                     ELSE data_resolucao
                 END
             WHERE id = ?3",
            params![status.as_str(), timestamp_to_db(&now), id],
        )?;
        Ok(changed > 0)
    }

    /// Set the responsible user. An OPEN ticket moves to IN_PROGRESS in the
    /// same statement; other statuses are left alone.
    ///
    /// Returns false if the ticket does not exist.
    pub fn assign_responsible(
        &mut self,
        id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE tickets
             SET responsavel_id = ?1,
                 data_atualizacao = ?2,
                 status = CASE WHEN status = 'ABERTO' THEN 'EM_ANDAMENTO' ELSE status END
             WHERE id = ?3",
            params![user_id, timestamp_to_db(&now), id],
        )?;
        Ok(changed > 0)
    }

    // === Comment Operations ===

    /// Append a comment and move the ticket's update time to the comment's.
    pub fn insert_comment(&mut self, comment: &NewComment) -> Result<i64> {
        let at = timestamp_to_db(&comment.created_at);
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO comentarios (ticket_id, usuario_id, conteudo, tipo, data)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                comment.ticket_id,
                comment.author_id,
                comment.content,
                comment.kind.as_str(),
                at,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "UPDATE tickets SET data_atualizacao = ?1 WHERE id = ?2",
            params![at, comment.ticket_id],
        )?;
        tx.commit()?;
        Ok(id)
    }

    /// Comments on a ticket in the order they were written.
    pub fn list_comments(&self, ticket_id: i64) -> Result<Vec<Comment>> {
        let sql = format!(
            "SELECT {} FROM comentarios WHERE ticket_id = ?1 ORDER BY id ASC",
            COMMENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([ticket_id])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(comment_from_row(row)?);
        }
        Ok(comments)
    }

    // === Tags and Attachments ===

    /// Tag a ticket. Returns false if the tag was already present.
    pub fn add_tag(&mut self, ticket_id: i64, tag: &str, now: DateTime<Utc>) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let added = tx.execute(
            "INSERT OR IGNORE INTO ticket_tags (ticket_id, tag) VALUES (?1, ?2)",
            params![ticket_id, tag],
        )? > 0;
        if added {
            tx.execute(
                "UPDATE tickets SET data_atualizacao = ?1 WHERE id = ?2",
                params![timestamp_to_db(&now), ticket_id],
            )?;
        }
        tx.commit()?;
        Ok(added)
    }

    /// Tags in insertion order.
    pub fn list_tags(&self, ticket_id: i64) -> Result<TagSet> {
        let mut stmt = self
            .conn
            .prepare("SELECT tag FROM ticket_tags WHERE ticket_id = ?1 ORDER BY rowid ASC")?;
        let tags = stmt
            .query_map([ticket_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<TagSet>>()?;
        Ok(tags)
    }

    /// Record an attachment identifier. Returns false if it was already recorded.
    pub fn add_attachment(
        &mut self,
        ticket_id: i64,
        attachment: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let added = tx.execute(
            "INSERT OR IGNORE INTO ticket_anexos (ticket_id, anexo) VALUES (?1, ?2)",
            params![ticket_id, attachment],
        )? > 0;
        if added {
            tx.execute(
                "UPDATE tickets SET data_atualizacao = ?1 WHERE id = ?2",
                params![timestamp_to_db(&now), ticket_id],
            )?;
        }
        tx.commit()?;
        Ok(added)
    }

    pub fn list_attachments(&self, ticket_id: i64) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT anexo FROM ticket_anexos WHERE ticket_id = ?1 ORDER BY rowid ASC")?;
        let attachments = stmt
            .query_map([ticket_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(attachments)
    }

    // === User Operations ===

    pub fn insert_user(&mut self, user: &NewUser) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO usuarios (nome, email, perfil, departamento_id, ativo, data_criacao)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![
                user.name,
                user.email,
                user.profile.as_str(),
                user.department_id,
                timestamp_to_db(&user.created_at),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM usuarios WHERE id = ?1", USER_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(user_from_row(row)?)),
            None => Ok(None),
        }
    }

    /// All users, active or not.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {} FROM usuarios ORDER BY id ASC", USER_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(user_from_row(row)?);
        }
        Ok(users)
    }

    /// Soft-delete or restore a user. Returns false if the user does not exist.
    pub fn set_user_active(&mut self, id: i64, active: bool) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE usuarios SET ativo = ?1 WHERE id = ?2",
            params![active, id],
        )?;
        Ok(changed > 0)
    }

    pub fn count_users(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM usuarios", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // === Category Operations ===

    pub fn insert_category(&mut self, category: &NewCategory) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO categorias (nome, descricao, cor, ativa) VALUES (?1, ?2, ?3, 1)",
            params![category.name, category.description, category.colour],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let sql = format!("SELECT {} FROM categorias WHERE id = ?1", CATEGORY_COLUMNS);
        let category = self
            .conn
            .query_row(&sql, [id], |row| Ok(category_from_row(row)))
            .optional()?
            .transpose()?;
        Ok(category)
    }

    /// Categories offered for new tickets.
    pub fn list_active_categories(&self) -> Result<Vec<Category>> {
        let sql = format!(
            "SELECT {} FROM categorias WHERE ativa = 1 ORDER BY id ASC",
            CATEGORY_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(category_from_row(row)?);
        }
        Ok(categories)
    }

    /// Soft-delete or restore a category. Returns false if it does not exist.
    pub fn set_category_active(&mut self, id: i64, active: bool) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE categorias SET ativa = ?1 WHERE id = ?2",
            params![active, id],
        )?;
        Ok(changed > 0)
    }
}

/// Build a LIKE pattern matching `term` anywhere, with its own wildcards escaped.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Parse a decimal identifier as supplied by callers.
pub fn parse_id(raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| Error::InvalidId(raw.to_string()))
}

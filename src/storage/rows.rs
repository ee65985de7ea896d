//! Mapping between result rows and entity snapshots.
//!
//! Every mapper is a pure function of the row. Nullable columns become
//! `Option`s, enumerated columns are parsed by their symbolic name, and any
//! value outside a closed set is rejected with [`Error::UnknownValue`] rather
//! than coerced.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use std::str::FromStr;

use crate::models::{Category, Comment, Ticket, User};
use crate::{Error, Result};

/// Column list shared by every ticket query, in the order the mapper expects
/// to find it by name.
pub(crate) const TICKET_COLUMNS: &str = "id, codigo, titulo, descricao, status, prioridade, \
     categoria_id, solicitante_id, responsavel_id, data_criacao, data_atualizacao, data_resolucao";

pub(crate) const USER_COLUMNS: &str =
    "id, nome, email, perfil, departamento_id, ativo, data_criacao";

pub(crate) const COMMENT_COLUMNS: &str = "id, ticket_id, usuario_id, conteudo, tipo, data";

pub(crate) const CATEGORY_COLUMNS: &str = "id, nome, descricao, cor, ativa";

pub fn ticket_from_row(row: &Row<'_>) -> Result<Ticket> {
    let code: Option<String> = row.get("codigo")?;
    Ok(Ticket {
        id: row.get("id")?,
        code: code.unwrap_or_default(),
        title: row.get("titulo")?,
        description: row.get("descricao")?,
        status: enum_column(row, "status")?,
        priority: enum_column(row, "prioridade")?,
        category_id: row.get("categoria_id")?,
        requester_id: row.get("solicitante_id")?,
        assignee_id: row.get("responsavel_id")?,
        created_at: timestamp_column(row, "data_criacao")?,
        updated_at: timestamp_column(row, "data_atualizacao")?,
        resolved_at: optional_timestamp_column(row, "data_resolucao")?,
    })
}

pub fn user_from_row(row: &Row<'_>) -> Result<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("nome")?,
        email: row.get("email")?,
        profile: enum_column(row, "perfil")?,
        department_id: row.get("departamento_id")?,
        active: row.get("ativo")?,
        created_at: timestamp_column(row, "data_criacao")?,
    })
}

pub fn comment_from_row(row: &Row<'_>) -> Result<Comment> {
    Ok(Comment {
        id: row.get("id")?,
        ticket_id: row.get("ticket_id")?,
        author_id: row.get("usuario_id")?,
        content: row.get("conteudo")?,
        kind: enum_column(row, "tipo")?,
        created_at: timestamp_column(row, "data")?,
    })
}

pub fn category_from_row(row: &Row<'_>) -> Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        name: row.get("nome")?,
        description: row.get("descricao")?,
        colour: row.get("cor")?,
        active: row.get("ativa")?,
    })
}

/// Timestamps are stored as RFC 3339 UTC text with millisecond precision so
/// they sort lexically and SQLite's date functions can read them.
pub fn timestamp_to_db(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(column: &'static str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::UnknownValue {
            column,
            value: raw.to_string(),
        })
}

fn enum_column<T: FromStr>(row: &Row<'_>, column: &'static str) -> Result<T> {
    let raw: String = row.get(column)?;
    match raw.parse::<T>() {
        Ok(value) => Ok(value),
        Err(_) => Err(Error::UnknownValue { column, value: raw }),
    }
}

fn timestamp_column(row: &Row<'_>, column: &'static str) -> Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    parse_timestamp(column, &raw)
}

fn optional_timestamp_column(row: &Row<'_>, column: &'static str) -> Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|s| parse_timestamp(column, &s)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, Status};
    use rusqlite::Connection;

    fn ticket_table() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE tickets (
                id INTEGER PRIMARY KEY, codigo TEXT, titulo TEXT, descricao TEXT,
                status TEXT, prioridade TEXT, categoria_id INTEGER, solicitante_id INTEGER,
                responsavel_id INTEGER, data_criacao TEXT, data_atualizacao TEXT,
                data_resolucao TEXT
            );",
        )
        .unwrap();
        conn
    }

    fn map_first(conn: &Connection) -> Result<Ticket> {
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM tickets", TICKET_COLUMNS))
            .unwrap();
        let mut rows = stmt.query([]).unwrap();
        let row = rows.next().unwrap().unwrap();
        ticket_from_row(row)
    }

    #[test]
    fn test_ticket_with_null_columns() {
        let conn = ticket_table();
        conn.execute(
            "INSERT INTO tickets VALUES (5, 'TK-00005', 'Title', 'Desc', 'ABERTO', 'ALTA', 2, 9,
             NULL, '2024-01-10T08:00:00.000Z', '2024-01-10T09:30:00.000Z', NULL)",
            [],
        )
        .unwrap();

        let ticket = map_first(&conn).unwrap();
        assert_eq!(ticket.id, 5);
        assert_eq!(ticket.code, "TK-00005");
        assert_eq!(ticket.status, Status::Open);
        assert_eq!(ticket.priority, Priority::High);
        assert_eq!(ticket.requester_id, 9);
        assert_eq!(ticket.assignee_id, None);
        assert_eq!(ticket.resolved_at, None);
        assert_eq!(ticket.updated_at.to_rfc3339(), "2024-01-10T09:30:00+00:00");
    }

    #[test]
    fn test_ticket_with_assignee_and_resolution() {
        let conn = ticket_table();
        conn.execute(
            "INSERT INTO tickets VALUES (6, 'TK-00006', 'T', 'D', 'RESOLVIDO', 'BAIXA', 2, 9,
             4, '2024-01-10T08:00:00.000Z', '2024-01-11T08:00:00.000Z', '2024-01-11T08:00:00.000Z')",
            [],
        )
        .unwrap();

        let ticket = map_first(&conn).unwrap();
        assert_eq!(ticket.assignee_id, Some(4));
        assert_eq!(ticket.status, Status::Resolved);
        assert!(ticket.resolved_at.is_some());
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let conn = ticket_table();
        conn.execute(
            "INSERT INTO tickets VALUES (7, 'TK-00007', 'T', 'D', 'PENDENTE', 'MEDIA', 2, 9,
             NULL, '2024-01-10T08:00:00.000Z', '2024-01-10T08:00:00.000Z', NULL)",
            [],
        )
        .unwrap();

        match map_first(&conn) {
            Err(Error::UnknownValue { column, value }) => {
                assert_eq!(column, "status");
                assert_eq!(value, "PENDENTE");
            }
            other => panic!("expected UnknownValue, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_timestamp_is_rejected() {
        let conn = ticket_table();
        conn.execute(
            "INSERT INTO tickets VALUES (8, 'TK-00008', 'T', 'D', 'ABERTO', 'MEDIA', 2, 9,
             NULL, 'yesterday', '2024-01-10T08:00:00.000Z', NULL)",
            [],
        )
        .unwrap();

        assert!(matches!(
            map_first(&conn),
            Err(Error::UnknownValue {
                column: "data_criacao",
                ..
            })
        ));
    }

    #[test]
    fn test_timestamp_text_roundtrip_keeps_millis() {
        let ts = "2024-05-01T10:20:30.123456Z".parse::<DateTime<Utc>>().unwrap();
        let stored = timestamp_to_db(&ts);
        assert_eq!(stored, "2024-05-01T10:20:30.123Z");
        let back = parse_timestamp("data", &stored).unwrap();
        assert_eq!(back.timestamp_millis(), ts.timestamp_millis());
    }
}

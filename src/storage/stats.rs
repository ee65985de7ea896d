//! Aggregate statistics over the whole ticket table.
//!
//! These are plain queries with no caching; they are not scoped to a principal.

use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

use super::Storage;
use crate::models::{Priority, Status};
use crate::{Error, Result};

/// Snapshot of the ticket counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TicketStatistics {
    /// Missing statuses mean zero tickets
    pub by_status: BTreeMap<Status, u64>,
    pub by_priority: BTreeMap<Priority, u64>,
    pub total: u64,
    /// Tickets not yet CLOSED
    pub open: u64,
    /// Mean whole hours from creation to resolution; 0.0 if nothing was resolved
    pub mean_resolution_hours: f64,
}

impl Storage {
    pub fn counts_by_status(&self) -> Result<BTreeMap<Status, u64>> {
        self.grouped_counts("status")
    }

    pub fn counts_by_priority(&self) -> Result<BTreeMap<Priority, u64>> {
        self.grouped_counts("prioridade")
    }

    pub fn total_tickets(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tickets", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn open_tickets(&self) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tickets WHERE status != ?1",
            [Status::Closed.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Each resolved ticket contributes its elapsed time truncated to whole hours.
    pub fn mean_resolution_hours(&self) -> Result<f64> {
        let mean: Option<f64> = self.conn.query_row(
            "SELECT AVG((CAST(strftime('%s', data_resolucao) AS INTEGER)
                       - CAST(strftime('%s', data_criacao) AS INTEGER)) / 3600)
             FROM tickets
             WHERE data_resolucao IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(mean.unwrap_or(0.0))
    }

    pub fn statistics(&self) -> Result<TicketStatistics> {
        Ok(TicketStatistics {
            by_status: self.counts_by_status()?,
            by_priority: self.counts_by_priority()?,
            total: self.total_tickets()?,
            open: self.open_tickets()?,
            mean_resolution_hours: self.mean_resolution_hours()?,
        })
    }

    fn grouped_counts<K: FromStr + Ord>(&self, column: &'static str) -> Result<BTreeMap<K, u64>> {
        // `column` is always one of our own literals, never caller input
        let sql = format!(
            "SELECT {column}, COUNT(*) FROM tickets GROUP BY {column}",
            column = column
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut counts = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let raw: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            let key = match raw.parse::<K>() {
                Ok(key) => key,
                Err(_) => return Err(Error::UnknownValue { column, value: raw }),
            };
            counts.insert(key, count as u64);
        }
        Ok(counts)
    }
}

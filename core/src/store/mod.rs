//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine reaches it through the `ProductCatalog`, `ClientHistory`
//! and `SimulationRepository` traits and never executes SQL directly.

use crate::{
    error::{SimError, SimResult},
    event::{EventLogEntry, EventSink, SimEvent},
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, types::Type, Connection, Row};
use std::str::FromStr;

mod investment;
mod product;
mod simulation;

pub use simulation::DailyProductSummary;

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_products.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_investments.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/004_simulations.sql"))?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, event: &SimEvent) -> SimResult<()> {
        append_event_on(&self.conn, event)
    }

    pub fn events_of_type(&self, event_type: &str) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, component, event_type, payload, created_at
             FROM event_log WHERE event_type = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![event_type], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    component: row.get(1)?,
                    event_type: row.get(2)?,
                    payload: row.get(3)?,
                    created_at: timestamp_column(row, 4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self) -> SimResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM event_log", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl EventSink for SimStore {
    fn record(&self, event: &SimEvent) -> SimResult<()> {
        self.append_event(event)
    }
}

/// Shared by plain appends and by writes inside a transaction.
fn append_event_on(conn: &Connection, event: &SimEvent) -> SimResult<()> {
    let entry = EventLogEntry::from_event(event, Utc::now())?;
    conn.execute(
        "INSERT INTO event_log (component, event_type, payload, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            entry.component,
            entry.event_type,
            entry.payload,
            entry.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

// ── Column helpers ─────────────────────────────────────────────

/// Read a text column into one of the string-backed enums.
fn enum_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = SimError>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: SimError| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn bool_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<bool> {
    Ok(row.get::<_, i64>(idx)? != 0)
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn term_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<u32>> {
    Ok(row.get::<_, Option<i64>>(idx)?.map(|v| v as u32))
}

const DATE_FORMAT: &str = "%Y-%m-%d";

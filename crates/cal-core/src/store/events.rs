//! Event storage

use rusqlite::{Connection, Row, params};
use tracing::debug;

use crate::Result;
use crate::model::{Event, Recurrence};
use crate::store::{decode_instant, encode_instant};
use chrono::{DateTime, Utc};

/// SQLite-based storage for events
pub struct EventStore {
    conn: Connection,
}

impl EventStore {
    /// Create a new EventStore with the given database path
    pub fn new(db_path: &str) -> Result<Self> {
        debug!("Opening event database at: {}", db_path);
        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.init_tables()?;
        Ok(store)
    }

    /// Create an in-memory EventStore (useful for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> Result<()> {
        // recurrence_until is denormalized out of the recurrence JSON so the
        // candidate range query can filter on it in SQL
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                start_at TEXT NOT NULL,
                end_at TEXT NOT NULL,
                calendar_id TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                participants TEXT NOT NULL,
                placements TEXT NOT NULL,
                recurrence TEXT,
                recurrence_until TEXT
            )",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_events_start ON events (start_at)",
            [],
        )?;
        Ok(())
    }

    /// Insert or replace an event
    pub fn save(&self, event: &Event) -> Result<()> {
        let participants = serde_json::to_string(&event.participants)?;
        let placements = serde_json::to_string(&event.placements)?;
        let recurrence = event
            .recurrence
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let recurrence_until = event
            .recurrence
            .as_ref()
            .and_then(|r| r.until)
            .map(encode_instant);

        self.conn.execute(
            "INSERT OR REPLACE INTO events
                (id, title, description, start_at, end_at, calendar_id, owner_id,
                 participants, placements, recurrence, recurrence_until)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                event.id,
                event.title,
                event.description,
                encode_instant(event.start),
                encode_instant(event.end),
                event.calendar_id,
                event.owner_id,
                participants,
                placements,
                recurrence,
                recurrence_until,
            ],
        )?;
        debug!("Saved event: {}", event.id);
        Ok(())
    }

    /// Load an event by id
    pub fn get(&self, id: &str) -> Result<Option<Event>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM events WHERE id = ?1",
            EVENT_COLUMNS
        ))?;
        let result = stmt.query_row(params![id], row_to_event);
        match result {
            Ok(event) => Ok(Some(event)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete an event by id
    pub fn delete(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM events WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Non-recurring events whose base start falls in the half-open
    /// window [from, to)
    pub fn starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM events
             WHERE recurrence IS NULL AND start_at >= ?1 AND start_at < ?2
             ORDER BY start_at",
            EVENT_COLUMNS
        ))?;
        let events = stmt
            .query_map(
                params![encode_instant(from), encode_instant(to)],
                row_to_event,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(events)
    }

    /// All events with a recurrence descriptor
    pub fn recurring(&self) -> Result<Vec<Event>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM events WHERE recurrence IS NOT NULL",
            EVENT_COLUMNS
        ))?;
        let events = stmt
            .query_map([], row_to_event)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(events)
    }

    /// Candidate events for a range view: non-recurring events starting in
    /// [from, to) plus recurring events not yet exhausted by their `until`
    /// bound.
    ///
    /// A recurring event counts as a candidate whenever `until >= from`,
    /// without verifying that an occurrence actually lands in the range.
    /// Summary (non-expanded) views may therefore over-include; callers that
    /// need exact containment expand the candidates afterwards.
    pub fn candidates_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM events
             WHERE (recurrence IS NULL AND start_at >= ?1 AND start_at < ?2)
                OR (recurrence IS NOT NULL
                    AND (recurrence_until IS NULL OR recurrence_until >= ?1))
             ORDER BY start_at",
            EVENT_COLUMNS
        ))?;
        let events = stmt
            .query_map(
                params![encode_instant(from), encode_instant(to)],
                row_to_event,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(events)
    }
}

const EVENT_COLUMNS: &str = "id, title, description, start_at, end_at, calendar_id, owner_id, \
                             participants, placements, recurrence";

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<Event> {
    let participants_json: String = row.get(7)?;
    let placements_json: String = row.get(8)?;
    let recurrence_json: Option<String> = row.get(9)?;

    let json_err = |idx, e: serde_json::Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    };

    let start_raw: String = row.get(3)?;
    let end_raw: String = row.get(4)?;

    let recurrence: Option<Recurrence> = recurrence_json
        .map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(|e| json_err(9, e))?;

    Ok(Event {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        start: decode_instant(3, &start_raw)?,
        end: decode_instant(4, &end_raw)?,
        calendar_id: row.get(5)?,
        owner_id: row.get(6)?,
        participants: serde_json::from_str(&participants_json).map_err(|e| json_err(7, e))?,
        placements: serde_json::from_str(&placements_json).map_err(|e| json_err(8, e))?,
        recurrence,
    })
}

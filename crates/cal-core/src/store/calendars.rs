//! Calendar storage

use rusqlite::{Connection, Row, params};
use tracing::debug;

use crate::Result;
use crate::model::{Calendar, CalendarMember};

/// SQLite-based storage for calendars
pub struct CalendarStore {
    conn: Connection,
}

impl CalendarStore {
    /// Create a new CalendarStore with the given database path
    pub fn new(db_path: &str) -> Result<Self> {
        debug!("Opening calendar database at: {}", db_path);
        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.init_tables()?;
        Ok(store)
    }

    /// Create an in-memory CalendarStore (useful for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS calendars (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                is_main INTEGER NOT NULL DEFAULT 0,
                is_system INTEGER NOT NULL DEFAULT 0,
                members TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Insert or replace a calendar
    pub fn save(&self, calendar: &Calendar) -> Result<()> {
        let members = serde_json::to_string(&calendar.members)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO calendars (id, name, owner_id, is_main, is_system, members)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                calendar.id,
                calendar.name,
                calendar.owner_id,
                calendar.is_main as i64,
                calendar.is_system as i64,
                members,
            ],
        )?;
        debug!("Saved calendar: {}", calendar.id);
        Ok(())
    }

    /// Load a calendar by id
    pub fn get(&self, id: &str) -> Result<Option<Calendar>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, owner_id, is_main, is_system, members
             FROM calendars WHERE id = ?1",
        )?;
        let result = stmt.query_row(params![id], row_to_calendar);
        match result {
            Ok(calendar) => Ok(Some(calendar)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Calendars owned by a user
    pub fn owned_by(&self, owner_id: &str) -> Result<Vec<Calendar>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, owner_id, is_main, is_system, members
             FROM calendars WHERE owner_id = ?1 ORDER BY name",
        )?;
        let calendars = stmt
            .query_map(params![owner_id], row_to_calendar)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(calendars)
    }
}

fn row_to_calendar(row: &Row<'_>) -> rusqlite::Result<Calendar> {
    let members_json: String = row.get(5)?;
    let members: Vec<CalendarMember> = serde_json::from_str(&members_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let is_main: i64 = row.get(3)?;
    let is_system: i64 = row.get(4)?;

    Ok(Calendar {
        id: row.get(0)?,
        name: row.get(1)?,
        owner_id: row.get(2)?,
        is_main: is_main != 0,
        is_system: is_system != 0,
        members,
    })
}

//! Notification ledger
//!
//! Persisted record of reminders already sent. The UNIQUE constraint over
//! (event, occurrence start, user, kind) is the at-most-once delivery
//! guarantee: a claim is a single conditional insert, never a
//! check-then-insert.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use tracing::debug;

use crate::Result;
use crate::model::ReminderKind;
use crate::store::encode_instant;

/// SQLite-based ledger of sent reminder notifications
pub struct NotificationLedger {
    conn: Connection,
}

impl NotificationLedger {
    /// Create a new NotificationLedger with the given database path
    pub fn new(db_path: &str) -> Result<Self> {
        debug!("Opening notification ledger at: {}", db_path);
        let conn = Connection::open(db_path)?;
        let ledger = Self { conn };
        ledger.init_tables()?;
        Ok(ledger)
    }

    /// Create an in-memory ledger (useful for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let ledger = Self { conn };
        ledger.init_tables()?;
        Ok(ledger)
    }

    fn init_tables(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS notifications (
                event_id TEXT NOT NULL,
                occurrence_start TEXT NOT NULL,
                user_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                sent_at TEXT NOT NULL,
                UNIQUE (event_id, occurrence_start, user_id, kind)
            )",
            [],
        )?;
        Ok(())
    }

    /// Atomically claim the right to send one reminder.
    ///
    /// Returns `true` if this call inserted the record (caller proceeds to
    /// send), `false` if it already existed (already sent or in flight).
    pub fn claim(
        &self,
        event_id: &str,
        occurrence_start: DateTime<Utc>,
        user_id: &str,
        kind: ReminderKind,
    ) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO notifications
                (event_id, occurrence_start, user_id, kind, sent_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event_id,
                encode_instant(occurrence_start),
                user_id,
                kind.as_str(),
                encode_instant(Utc::now()),
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Drop a claim after a failed dispatch so a later scan can retry
    pub fn release(
        &self,
        event_id: &str,
        occurrence_start: DateTime<Utc>,
        user_id: &str,
        kind: ReminderKind,
    ) -> Result<()> {
        self.conn.execute(
            "DELETE FROM notifications
             WHERE event_id = ?1 AND occurrence_start = ?2 AND user_id = ?3 AND kind = ?4",
            params![
                event_id,
                encode_instant(occurrence_start),
                user_id,
                kind.as_str(),
            ],
        )?;
        debug!(
            "Released claim: event={} user={} kind={}",
            event_id,
            user_id,
            kind.as_str()
        );
        Ok(())
    }

    /// Whether a reminder for this tuple was recorded as sent
    pub fn was_sent(
        &self,
        event_id: &str,
        occurrence_start: DateTime<Utc>,
        user_id: &str,
        kind: ReminderKind,
    ) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM notifications
             WHERE event_id = ?1 AND occurrence_start = ?2 AND user_id = ?3 AND kind = ?4",
            params![
                event_id,
                encode_instant(occurrence_start),
                user_id,
                kind.as_str(),
            ],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Total ledger entries
    pub fn count(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM notifications", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_claim_is_at_most_once() -> Result<()> {
        let ledger = NotificationLedger::in_memory()?;

        assert!(ledger.claim("e1", start(), "alice", ReminderKind::AtStart)?);
        // Second claim on the same tuple must lose
        assert!(!ledger.claim("e1", start(), "alice", ReminderKind::AtStart)?);
        assert_eq!(ledger.count()?, 1);
        Ok(())
    }

    #[test]
    fn test_distinct_tuples_claim_independently() -> Result<()> {
        let ledger = NotificationLedger::in_memory()?;

        assert!(ledger.claim("e1", start(), "alice", ReminderKind::AtStart)?);
        assert!(ledger.claim("e1", start(), "alice", ReminderKind::Before15)?);
        assert!(ledger.claim("e1", start(), "bob", ReminderKind::AtStart)?);
        assert!(ledger.claim("e2", start(), "alice", ReminderKind::AtStart)?);
        assert_eq!(ledger.count()?, 4);
        Ok(())
    }

    #[test]
    fn test_release_allows_reclaim() -> Result<()> {
        let ledger = NotificationLedger::in_memory()?;

        assert!(ledger.claim("e1", start(), "alice", ReminderKind::AtStart)?);
        ledger.release("e1", start(), "alice", ReminderKind::AtStart)?;
        assert!(!ledger.was_sent("e1", start(), "alice", ReminderKind::AtStart)?);
        assert!(ledger.claim("e1", start(), "alice", ReminderKind::AtStart)?);
        Ok(())
    }
}

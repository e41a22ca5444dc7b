//! SQLite-backed persistence
//!
//! Each store owns its own connection and creates its tables on open.
//! All stores offer an `in_memory()` constructor for testing.

mod calendars;
mod events;
mod ledger;
mod users;

pub use calendars::CalendarStore;
pub use events::EventStore;
pub use ledger::NotificationLedger;
pub use users::UserStore;

use chrono::{DateTime, Utc};

/// Canonical timestamp encoding for all store columns. RFC 3339 in UTC,
/// so lexicographic comparison in SQL matches chronological order.
pub(crate) fn encode_instant(t: DateTime<Utc>) -> String {
    t.to_rfc3339()
}

pub(crate) fn decode_instant(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

//! Error types for cal-recur

use thiserror::Error;

/// cal-recur error type
#[derive(Error, Debug)]
pub enum RecurrenceError {
    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(#[from] rrule::RRuleError),

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RecurrenceError>;

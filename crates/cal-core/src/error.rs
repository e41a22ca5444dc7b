//! Error types for cal-core

use thiserror::Error;

/// Main error type for cal-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Calendar not found: {0}")]
    CalendarNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for cal-core
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for cal-email

use thiserror::Error;

/// cal-email error type
#[derive(Error, Debug)]
pub enum EmailError {
    #[error("SMTP configuration error: {0}")]
    SmtpConfig(String),

    #[error("SMTP send error: {0}")]
    SmtpSend(String),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EmailError>;

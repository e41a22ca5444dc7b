//! cal-email: reminder email composition and dispatch
//!
//! The scheduler talks to the `ReminderMailer` trait so tests can swap in a
//! recording fake; `EmailSender` is the SMTP-backed implementation.

pub mod error;
pub mod send;

pub use error::{EmailError, Result};
pub use send::{EmailSender, ReminderMail, ReminderMailer};

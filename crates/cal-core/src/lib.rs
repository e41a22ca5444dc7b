//! cal-core: calendar service core library
//!
//! Domain model, configuration and SQLite-backed stores shared by the
//! recurrence expander, the reminder scheduler and the server binary.

pub mod config;
pub mod error;
pub mod model;
pub mod store;

pub use config::{Config, MailConfig, ReminderConfig, StorageConfig};
pub use error::{Error, Result};
pub use model::{
    Calendar, CalendarMember, Event, MemberRole, Occurrence, Recurrence, ReminderKind, User,
};
pub use store::{CalendarStore, EventStore, NotificationLedger, UserStore};

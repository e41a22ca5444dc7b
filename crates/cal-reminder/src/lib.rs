//! cal-reminder: background reminder scheduling
//!
//! Scans upcoming event occurrences on a fixed interval and dispatches
//! at-most-once reminder emails, coordinated through the persisted
//! notification ledger.

mod scan;
mod scheduler;

pub use scan::{ScanContext, run_cycle};
pub use scheduler::{ReminderScheduler, SchedulerHandle};

//! cal-recur: recurring-event occurrence expansion
//!
//! Materializes the concrete occurrences of a (possibly recurring) event
//! inside a time window. Recurrence rules follow the RFC 5545 RRULE grammar
//! and are expanded lazily at read/scan time; occurrences are never stored.

mod error;
mod expand;

pub use error::{RecurrenceError, Result};
pub use expand::expand_event;

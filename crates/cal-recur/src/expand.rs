//! Occurrence expansion

use chrono::{DateTime, Utc};
use rrule::{RRuleSet, Tz};
use tracing::warn;

use crate::error::{RecurrenceError, Result};
use cal_core::model::{Event, Occurrence};

/// Cap on generated starts per expansion. Scan windows are minutes wide, so
/// hitting this means a pathological rule (e.g. FREQ=SECONDLY).
const OCCURRENCE_LIMIT: u16 = 1000;

/// Expand an event over the half-open window `[from, to)`.
///
/// Non-recurring events yield their single base occurrence when the start
/// falls in the window. Recurring events yield one occurrence per
/// rule-generated start inside the window, each with the base duration.
/// Starts at or after the recurrence `until` bound are excluded, including
/// a start landing exactly on `until`.
///
/// Pure function of (event, window); an unparsable rule is reported as
/// `RecurrenceError`, never a panic.
pub fn expand_event(
    event: &Event,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<Occurrence>> {
    let recurrence = match &event.recurrence {
        Some(r) => r,
        None => {
            if event.start >= from && event.start < to {
                return Ok(vec![Occurrence {
                    event_id: event.id.clone(),
                    start: event.start,
                    end: event.end,
                }]);
            }
            return Ok(Vec::new());
        }
    };

    // DTSTART is always the event's base start. With a named timezone the
    // rule is anchored to local wall time there, so e.g. FREQ=DAILY keeps
    // firing at the same local hour across DST shifts.
    let dtstart = match &recurrence.timezone {
        Some(name) => {
            let tz: chrono_tz::Tz = name
                .parse()
                .map_err(|_| RecurrenceError::UnknownTimezone(name.clone()))?;
            format!(
                "DTSTART;TZID={}:{}",
                name,
                event.start.with_timezone(&tz).format("%Y%m%dT%H%M%S")
            )
        }
        None => format!("DTSTART:{}", event.start.format("%Y%m%dT%H%M%SZ")),
    };

    // Creation-time validation stores the bare rule body, but accept a full
    // RRULE: line as well so both parsers agree on the same strings
    let rule_body = recurrence
        .rule
        .strip_prefix("RRULE:")
        .unwrap_or(&recurrence.rule);

    let set: RRuleSet = format!("{}\nRRULE:{}", dtstart, rule_body).parse()?;

    // after/before are inclusive; the exclusive upper bound and the `until`
    // cap are applied in the filter below
    let result = set
        .after(from.with_timezone(&Tz::UTC))
        .before(to.with_timezone(&Tz::UTC))
        .all(OCCURRENCE_LIMIT);

    if result.limited {
        warn!(
            event_id = %event.id,
            limit = OCCURRENCE_LIMIT,
            "occurrence expansion truncated"
        );
    }

    let duration = event.duration();
    let occurrences = result
        .dates
        .into_iter()
        .map(|d| d.with_timezone(&Utc))
        .filter(|start| *start >= from && *start < to)
        .filter(|start| match recurrence.until {
            Some(until) => *start < until,
            None => true,
        })
        .map(|start| Occurrence {
            event_id: event.id.clone(),
            start,
            end: start + duration,
        })
        .collect();

    Ok(occurrences)
}

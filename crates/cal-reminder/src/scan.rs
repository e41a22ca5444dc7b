//! Scan cycle: window computation, candidate expansion, recipient
//! resolution and idempotent dispatch.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use tracing::{debug, error, warn};

use cal_core::config::ReminderConfig;
use cal_core::model::{Event, Occurrence, ReminderKind};
use cal_core::store::{CalendarStore, EventStore, NotificationLedger, UserStore};
use cal_email::{ReminderMail, ReminderMailer};

/// Shared handles the scan needs. Event, calendar and user data are
/// read-only from here; the ledger is the sole coordination point.
#[derive(Clone)]
pub struct ScanContext {
    pub events: Arc<Mutex<EventStore>>,
    pub calendars: Arc<Mutex<CalendarStore>>,
    pub users: Arc<Mutex<UserStore>>,
    pub ledger: Arc<Mutex<NotificationLedger>>,
    pub mailer: Arc<dyn ReminderMailer>,
}

/// Run one scan cycle at the given instant.
///
/// `now` is a parameter rather than read inside so tests can drive cycles
/// with a fixed clock. Each reminder kind gets its own window; a failure in
/// one window never blocks the other.
pub async fn run_cycle(ctx: &ScanContext, config: &ReminderConfig, now: DateTime<Utc>) {
    let span = Duration::seconds((config.interval_secs + config.leeway_secs) as i64);

    for kind in ReminderKind::ALL {
        let from = now + Duration::minutes(kind.minutes_before());
        let to = from + span;

        if let Err(e) = scan_window(ctx, config, kind, from, to).await {
            error!(kind = kind.as_str(), "reminder scan window failed: {}", e);
        }
    }
}

/// Scan one half-open window [from, to) for a single reminder kind
async fn scan_window(
    ctx: &ScanContext,
    config: &ReminderConfig,
    kind: ReminderKind,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> cal_core::Result<()> {
    let (one_off, recurring) = {
        let events = ctx.events.lock().unwrap();
        (events.starting_between(from, to)?, events.recurring()?)
    };

    let mut batch: Vec<(Event, Occurrence)> = Vec::new();

    for event in one_off {
        let occurrence = Occurrence {
            event_id: event.id.clone(),
            start: event.start,
            end: event.end,
        };
        batch.push((event, occurrence));
    }

    for event in recurring {
        match cal_recur::expand_event(&event, from, to) {
            Ok(occurrences) => {
                for occurrence in occurrences {
                    batch.push((event.clone(), occurrence));
                }
            }
            // Bad rule skips this event only, never the scan
            Err(e) => warn!(event_id = %event.id, "skipping unexpandable event: {}", e),
        }
    }

    debug!(
        kind = kind.as_str(),
        candidates = batch.len(),
        "scanning window {} .. {}",
        from,
        to
    );

    for (event, occurrence) in batch {
        if let Err(e) = notify_occurrence(ctx, config, &event, &occurrence, kind).await {
            // Isolate per event: one broken candidate must not starve the rest
            error!(event_id = %event.id, "reminder processing failed: {}", e);
        }
    }

    Ok(())
}

/// Notify every eligible recipient of one occurrence
async fn notify_occurrence(
    ctx: &ScanContext,
    config: &ReminderConfig,
    event: &Event,
    occurrence: &Occurrence,
    kind: ReminderKind,
) -> cal_core::Result<()> {
    for user_id in event.recipients() {
        let calendar_id = event.effective_calendar_id(&user_id).to_string();

        let calendar = { ctx.calendars.lock().unwrap().get(&calendar_id)? };
        let Some(calendar) = calendar else {
            warn!(
                event_id = %event.id,
                calendar_id = %calendar_id,
                "effective calendar missing, skipping recipient {}", user_id
            );
            continue;
        };

        if !calendar.notify_active(&user_id) {
            continue;
        }

        let user = { ctx.users.lock().unwrap().get(&user_id)? };
        let Some(user) = user else {
            warn!(event_id = %event.id, "recipient {} not found, skipping", user_id);
            continue;
        };

        let claimed = {
            ctx.ledger
                .lock()
                .unwrap()
                .claim(&event.id, occurrence.start, &user_id, kind)?
        };
        if !claimed {
            // Already sent or claimed by a concurrent scan
            continue;
        }

        let mail = ReminderMail {
            to: user.email,
            recipient_name: user.name,
            event_title: event.title.clone(),
            window_text: window_text(occurrence),
            kind,
            minutes_before: kind.minutes_before(),
            deep_link: deep_link(&config.base_url, event, occurrence),
        };

        if let Err(e) = ctx.mailer.send_reminder(&mail).await {
            warn!(
                event_id = %event.id,
                user_id = %user_id,
                "reminder dispatch failed, releasing claim for retry: {}", e
            );
            ctx.ledger
                .lock()
                .unwrap()
                .release(&event.id, occurrence.start, &user_id, kind)?;
        }
    }

    Ok(())
}

fn window_text(occurrence: &Occurrence) -> String {
    format!(
        "{} - {} UTC",
        occurrence.start.format("%Y-%m-%d %H:%M"),
        occurrence.end.format("%H:%M")
    )
}

fn deep_link(base_url: &str, event: &Event, occurrence: &Occurrence) -> String {
    format!(
        "{}/calendar?event={}&start={}",
        base_url.trim_end_matches('/'),
        event.id,
        occurrence.start.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

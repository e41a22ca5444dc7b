//! End-to-end scheduler lifecycle: start, repeated cycles, idempotent
//! delivery, clean stop.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use cal_core::config::ReminderConfig;
use cal_core::model::{Calendar, CalendarMember, Event, MemberRole, User};
use cal_core::store::{CalendarStore, EventStore, NotificationLedger, UserStore};
use cal_email::{ReminderMail, ReminderMailer};
use cal_reminder::{ReminderScheduler, ScanContext};

struct CountingMailer {
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl ReminderMailer for CountingMailer {
    async fn send_reminder(&self, mail: &ReminderMail) -> cal_email::Result<()> {
        self.sent.lock().unwrap().push(mail.to.clone());
        Ok(())
    }
}

fn context(mailer: Arc<CountingMailer>) -> ScanContext {
    ScanContext {
        events: Arc::new(Mutex::new(EventStore::in_memory().unwrap())),
        calendars: Arc::new(Mutex::new(CalendarStore::in_memory().unwrap())),
        users: Arc::new(Mutex::new(UserStore::in_memory().unwrap())),
        ledger: Arc::new(Mutex::new(NotificationLedger::in_memory().unwrap())),
        mailer,
    }
}

#[tokio::test(start_paused = true)]
async fn scheduler_delivers_once_across_many_cycles_and_stops() {
    let mailer = Arc::new(CountingMailer {
        sent: Mutex::new(Vec::new()),
    });
    let ctx = context(mailer.clone());

    let mut alice = User::new("Alice", "alice@example.com");
    alice.id = "alice".to_string();
    let mut bob = User::new("Bob", "bob@example.com");
    bob.id = "bob".to_string();
    {
        let users = ctx.users.lock().unwrap();
        users.save(&alice).unwrap();
        users.save(&bob).unwrap();
    }

    let mut calendar = Calendar::new("team", "alice").with_member(CalendarMember {
        user_id: "bob".to_string(),
        role: MemberRole::Member,
        notify_active: None,
    });
    calendar.id = "cal1".to_string();
    ctx.calendars.lock().unwrap().save(&calendar).unwrap();

    let start = Utc::now() + Duration::seconds(30);
    let event = Event::new("standup", start, start + Duration::minutes(30), "cal1", "alice")
        .with_participant("bob");
    ctx.events.lock().unwrap().save(&event).unwrap();

    let config = ReminderConfig {
        interval_secs: 1,
        ..ReminderConfig::default()
    };

    let handle = ReminderScheduler::new(config, ctx.clone()).start();

    // Paused time auto-advances through the 1s interval, so several scan
    // cycles run here
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }

    handle.stop().await;

    let sent = mailer.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 2, "exactly one mail per recipient: {:?}", sent);
    assert!(sent.contains(&"alice@example.com".to_string()));
    assert!(sent.contains(&"bob@example.com".to_string()));
    assert_eq!(ctx.ledger.lock().unwrap().count().unwrap(), 2);
}

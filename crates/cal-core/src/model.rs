//! Domain model: events, calendars, users and reminder kinds.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Recurrence descriptor attached to an event.
///
/// `rule` is the RFC 5545 RRULE body (e.g. `FREQ=WEEKLY;INTERVAL=2`).
/// DTSTART is always the event's base start; it is never carried in the rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recurrence {
    /// RRULE expression
    pub rule: String,

    /// Optional IANA timezone for local-time recurrence (e.g. "Europe/Kyiv")
    #[serde(default)]
    pub timezone: Option<String>,

    /// Upper bound: occurrences at or after this instant are excluded
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
}

/// A schedulable calendar item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Base calendar the event lives in
    pub calendar_id: String,
    pub owner_id: String,
    /// Invited participant user ids
    #[serde(default)]
    pub participants: Vec<String>,
    /// Per-participant placement: user id -> calendar id the occurrence is
    /// shown in for that user, overriding the base calendar
    #[serde(default)]
    pub placements: std::collections::HashMap<String, String>,
    pub recurrence: Option<Recurrence>,
}

impl Event {
    /// Create a one-off event. Invariant: `end >= start`.
    pub fn new(
        title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        calendar_id: &str,
        owner_id: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: None,
            start,
            end,
            calendar_id: calendar_id.to_string(),
            owner_id: owner_id.to_string(),
            participants: Vec::new(),
            placements: std::collections::HashMap::new(),
            recurrence: None,
        }
    }

    /// Attach a recurrence rule
    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    /// Add a participant
    pub fn with_participant(mut self, user_id: &str) -> Self {
        self.participants.push(user_id.to_string());
        self
    }

    /// Place the event in a different calendar for one participant
    pub fn with_placement(mut self, user_id: &str, calendar_id: &str) -> Self {
        self.placements
            .insert(user_id.to_string(), calendar_id.to_string());
        self
    }

    /// Duration of the base occurrence, applied to every generated occurrence
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Owner plus participants, deduplicated, owner first
    pub fn recipients(&self) -> Vec<String> {
        let mut out = vec![self.owner_id.clone()];
        for p in &self.participants {
            if !out.contains(p) {
                out.push(p.clone());
            }
        }
        out
    }

    /// Calendar a given user sees this event in: their placement if one
    /// exists, else the base calendar
    pub fn effective_calendar_id(&self, user_id: &str) -> &str {
        self.placements
            .get(user_id)
            .map(String::as_str)
            .unwrap_or(&self.calendar_id)
    }
}

/// Role of a calendar member
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    #[default]
    Member,
    Editor,
}

/// Membership entry on a calendar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarMember {
    pub user_id: String,

    #[serde(default)]
    pub role: MemberRole,

    /// Tri-state notification flag: explicit true/false, or unset meaning
    /// "active if owner or member"
    #[serde(default)]
    pub notify_active: Option<bool>,
}

/// A named container of events with sharing semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    /// Exactly one calendar per owner carries this flag
    #[serde(default)]
    pub is_main: bool,
    /// System calendars (holidays etc.) are immutable to end users
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub members: Vec<CalendarMember>,
}

impl Calendar {
    pub fn new(name: &str, owner_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            owner_id: owner_id.to_string(),
            is_main: false,
            is_system: false,
            members: Vec::new(),
        }
    }

    pub fn with_member(mut self, member: CalendarMember) -> Self {
        self.members.push(member);
        self
    }

    /// Whether notifications are active for `user_id` on this calendar.
    ///
    /// Explicit per-user flag wins; otherwise the owner and every member
    /// default to active; anyone else is not notified. Both the display-side
    /// "active" flag and reminder eligibility go through this one function.
    pub fn notify_active(&self, user_id: &str) -> bool {
        if let Some(member) = self.members.iter().find(|m| m.user_id == user_id) {
            return member.notify_active.unwrap_or(true);
        }
        self.owner_id == user_id
    }
}

/// A user known to the system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl User {
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
        }
    }
}

/// One concrete time instance of a (possibly recurring) event.
///
/// Derived at read/scan time, never persisted. Identified by
/// (event id, start instant).
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub event_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Which reminder a notification represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    /// Occurrence is starting now
    AtStart,
    /// Occurrence starts in 15 minutes
    Before15,
}

impl ReminderKind {
    /// All kinds evaluated per scan cycle
    pub const ALL: [ReminderKind; 2] = [ReminderKind::AtStart, ReminderKind::Before15];

    /// Minutes before the occurrence start this reminder fires
    pub fn minutes_before(self) -> i64 {
        match self {
            ReminderKind::AtStart => 0,
            ReminderKind::Before15 => 15,
        }
    }

    /// Stable identifier used in the notification ledger
    pub fn as_str(self) -> &'static str {
        match self {
            ReminderKind::AtStart => "at_start",
            ReminderKind::Before15 => "before_15",
        }
    }

}

impl std::str::FromStr for ReminderKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "at_start" => Ok(ReminderKind::AtStart),
            "before_15" => Ok(ReminderKind::Before15),
            _ => Err(crate::Error::Other(format!("unknown reminder kind: {s}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_event_duration() {
        let event = Event::new("standup", t(9, 0), t(9, 30), "cal1", "alice");
        assert_eq!(event.duration(), Duration::minutes(30));
    }

    #[test]
    fn test_recipients_dedup_owner() {
        let event = Event::new("standup", t(9, 0), t(9, 30), "cal1", "alice")
            .with_participant("bob")
            .with_participant("alice")
            .with_participant("bob");
        assert_eq!(event.recipients(), vec!["alice", "bob"]);
    }

    #[test]
    fn test_effective_calendar_placement() {
        let event = Event::new("standup", t(9, 0), t(9, 30), "cal1", "alice")
            .with_participant("bob")
            .with_placement("bob", "bobs-cal");
        assert_eq!(event.effective_calendar_id("bob"), "bobs-cal");
        assert_eq!(event.effective_calendar_id("alice"), "cal1");
    }

    #[test]
    fn test_notify_active_explicit_flag_wins() {
        let calendar = Calendar::new("team", "alice").with_member(CalendarMember {
            user_id: "bob".to_string(),
            role: MemberRole::Member,
            notify_active: Some(false),
        });
        assert!(!calendar.notify_active("bob"));
    }

    #[test]
    fn test_notify_active_member_defaults_true() {
        let calendar = Calendar::new("team", "alice").with_member(CalendarMember {
            user_id: "bob".to_string(),
            role: MemberRole::Editor,
            notify_active: None,
        });
        assert!(calendar.notify_active("bob"));
    }

    #[test]
    fn test_notify_active_owner_defaults_true() {
        let calendar = Calendar::new("team", "alice");
        assert!(calendar.notify_active("alice"));
        assert!(!calendar.notify_active("mallory"));
    }

    #[test]
    fn test_notify_active_owner_explicit_false() {
        let calendar = Calendar::new("team", "alice").with_member(CalendarMember {
            user_id: "alice".to_string(),
            role: MemberRole::Editor,
            notify_active: Some(false),
        });
        assert!(!calendar.notify_active("alice"));
    }

    #[test]
    fn test_reminder_kind_roundtrip() {
        for kind in ReminderKind::ALL {
            assert_eq!(kind.as_str().parse::<ReminderKind>().ok(), Some(kind));
        }
        assert!("nope".parse::<ReminderKind>().is_err());
    }
}

//! Subscriber records: who gets called, and when.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, WakeupError};

/// A person who can be woken up.
///
/// `alarm_on` and `any_match` are per-cycle flags: the cycle finalizer
/// clears `any_match` for every participant and `alarm_on` for everyone
/// who is not `recurring`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub username: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Time of day (UTC) of the alarm; compared against the slot.
    pub alarm: NaiveTime,
    pub alarm_on: bool,
    /// Account verified; unverified subscribers are never called.
    pub activated: bool,
    /// Keep `alarm_on` set after the cycle finalizes.
    pub recurring: bool,
    /// Set while matched with another subscriber in the current cycle.
    #[serde(default)]
    pub any_match: bool,
    pub created_at: DateTime<Utc>,
}

impl Subscriber {
    /// A new, activated subscriber with the alarm switched on.
    pub fn new(username: impl Into<String>, phone: impl Into<String>, alarm: NaiveTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            phone: phone.into(),
            email: None,
            alarm,
            alarm_on: true,
            activated: true,
            recurring: false,
            any_match: false,
            created_at: Utc::now(),
        }
    }

    /// True if this subscriber should be called in a slot whose time of day
    /// is `slot_time`.
    pub fn is_due_at(&self, slot_time: NaiveTime) -> bool {
        self.alarm_on && self.activated && self.alarm == slot_time
    }
}

/// Parse an alarm time given as `HH:MM` or `HH:MM:SS`.
pub fn parse_alarm(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| WakeupError::InvalidAlarmTime(s.to_string()))
}

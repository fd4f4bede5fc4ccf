//! Scheduling slots.
//!
//! A [`Slot`] is the quantized timestamp that identifies one wake-up cycle.
//! It is never persisted on its own; it is the correlation key used when
//! selecting subscribers, creating call attempts and finalizing.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quantized timestamp identifying one scheduling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slot(DateTime<Utc>);

impl Slot {
    /// Round `now` to the nearest `granularity_minutes` boundary.
    ///
    /// The time is truncated down to the boundary; if the discarded remainder
    /// is at least half the granularity the next boundary is used instead.
    /// Boundaries are counted from the Unix epoch, so any granularity that
    /// divides a day lines up with midnight UTC.
    ///
    /// A granularity of 0 is treated as 1 minute.
    pub fn quantize(now: DateTime<Utc>, granularity_minutes: u32) -> Self {
        let step_ms = i64::from(granularity_minutes.max(1)) * 60_000;
        let ms = now.timestamp_millis();
        let remainder = ms.rem_euclid(step_ms);
        let mut slot_ms = ms - remainder;
        if remainder * 2 >= step_ms {
            slot_ms += step_ms;
        }
        Self(
            Utc.timestamp_millis_opt(slot_ms)
                .single()
                .unwrap_or(now),
        )
    }

    /// Wrap a timestamp that is already a slot boundary (e.g. read back from
    /// a call attempt).
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Time of day matched against each subscriber's alarm.
    pub fn time_of_day(&self) -> NaiveTime {
        self.0.time()
    }

    /// Conference name used in the callback URLs (`dd:mm:yy:HH:MM:SS`).
    pub fn conference_name(&self) -> String {
        self.0.format("%d:%m:%y:%H:%M:%S").to_string()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

// ---------------------------------------------------------------------------
// CallbackUrls
// ---------------------------------------------------------------------------

/// The three URLs handed to the call provider for every call in a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackUrls {
    /// Fetched by the provider when the callee picks up.
    pub answer: String,
    /// Used when the answer URL itself fails.
    pub fallback: String,
    /// Status callback hit when the call ends unanswered.
    pub no_answer: String,
}

impl CallbackUrls {
    pub fn for_slot(web_root: &str, slot: Slot) -> Self {
        let name = slot.conference_name();
        Self {
            answer: format!("{web_root}wakeuprequest/{name}"),
            fallback: format!("{web_root}fallback/{name}"),
            no_answer: format!("{web_root}answercallback/{name}"),
        }
    }
}

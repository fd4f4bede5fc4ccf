//! Call attempts: one per selected subscriber per cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slot::Slot;

/// The record of waking one subscriber in one slot.
///
/// Created at cycle start with `datecreated == slot`. `answered` is written
/// by the external answer recorder; `snoozed` is derived by reconciliation
/// and only ever moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallAttempt {
    pub id: Uuid,
    pub subscriber_id: Uuid,
    /// The slot this attempt belongs to.
    pub datecreated: DateTime<Utc>,
    #[serde(default)]
    pub answered: bool,
    #[serde(default)]
    pub snoozed: bool,
    #[serde(default)]
    pub matched: bool,
    #[serde(default)]
    pub completed: bool,
    /// Provider error code of the latest failed placement, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Re-dials after the first round.
    #[serde(default)]
    pub retry_count: u32,
    pub updated_at: DateTime<Utc>,
}

impl CallAttempt {
    pub fn new(subscriber_id: Uuid, slot: Slot) -> Self {
        Self {
            id: Uuid::new_v4(),
            subscriber_id,
            datecreated: slot.at(),
            answered: false,
            snoozed: false,
            matched: false,
            completed: false,
            error_code: None,
            retry_count: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn slot(&self) -> Slot {
        Slot::from_datetime(self.datecreated)
    }
}

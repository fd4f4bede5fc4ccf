//! Per-subscriber call history summary.

use serde::Serialize;
use uuid::Uuid;

use crate::error::{Result, WakeupError};
use crate::store::WakeupStore;

/// Outcome counts over every call attempt of one subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CallStats {
    pub total_calls: usize,
    /// Answered within the first wait window.
    pub woke_up: usize,
    /// Missed at least one window.
    pub snoozed: usize,
    /// Never answered.
    pub overslept: usize,
}

impl CallStats {
    pub fn for_subscriber<S: WakeupStore + ?Sized>(store: &S, subscriber: Uuid) -> Result<Self> {
        if store.get_subscriber(subscriber)?.is_none() {
            return Err(WakeupError::SubscriberNotFound(subscriber.to_string()));
        }
        let attempts = store.attempts_for_subscriber(subscriber)?;
        Ok(Self {
            total_calls: attempts.len(),
            woke_up: attempts.iter().filter(|a| !a.snoozed).count(),
            snoozed: attempts.iter().filter(|a| a.snoozed).count(),
            overslept: attempts.iter().filter(|a| !a.answered).count(),
        })
    }
}

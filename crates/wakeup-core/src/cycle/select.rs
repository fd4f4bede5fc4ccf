use tracing::info;

use crate::error::Result;
use crate::model::{CallAttempt, Subscriber};
use crate::slot::Slot;
use crate::store::WakeupStore;

/// Snapshot of the subscribers due in `slot`.
///
/// An empty result is a valid cycle with nothing to do, not an error.
pub fn select_candidates<S: WakeupStore + ?Sized>(store: &S, slot: Slot) -> Result<Vec<Subscriber>> {
    let due = store.select_due(slot)?;
    if due.is_empty() {
        info!(%slot, "no subscribers due");
    } else {
        info!(%slot, count = due.len(), "selected subscribers");
    }
    Ok(due)
}

/// Create one call attempt per candidate, stamped with the slot.
///
/// A rerun of the slot gets back the attempts it already holds.
pub fn open_attempts<S: WakeupStore + ?Sized>(
    store: &S,
    slot: Slot,
    candidates: &[Subscriber],
) -> Result<Vec<CallAttempt>> {
    candidates
        .iter()
        .map(|subscriber| store.create_attempt(slot, subscriber.id))
        .collect()
}

/// Candidates whose attempt for the slot is still unanswered.
pub fn initial_pending(candidates: Vec<Subscriber>, attempts: &[CallAttempt]) -> Vec<Subscriber> {
    candidates
        .into_iter()
        .filter(|s| {
            !attempts
                .iter()
                .any(|a| a.subscriber_id == s.id && a.answered)
        })
        .collect()
}

use tracing::info;

use crate::error::Result;
use crate::slot::Slot;
use crate::store::{FinalizeSummary, WakeupStore};

/// Reset the per-cycle flags of everyone who took part in `slot`.
///
/// Safe to run more than once, and on a slot without participants.
pub fn finalize<S: WakeupStore + ?Sized>(store: &S, slot: Slot) -> Result<FinalizeSummary> {
    let summary = store.finalize_slot(slot)?;
    info!(
        %slot,
        participants = summary.participants,
        any_match_cleared = summary.any_match_cleared,
        alarm_cleared = summary.alarm_cleared,
        "cycle finalized"
    );
    Ok(summary)
}

//! Persistence interface for subscribers, call attempts and contacts.
//!
//! The cycle only talks to storage through [`WakeupStore`]. Every method that
//! writes is a single transaction, so set-field updates made by the cycle and
//! by the external answer recorder never interleave within a record.

pub mod db;

use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::model::{CallAttempt, ContactRelation, ContactStatus, Subscriber};
use crate::slot::Slot;

pub use db::WakeupDb;

/// What [`WakeupStore::finalize_slot`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FinalizeSummary {
    /// Subscribers with a call attempt in the slot.
    pub participants: usize,
    pub any_match_cleared: usize,
    pub alarm_cleared: usize,
}

pub trait WakeupStore: Send + Sync {
    // -- subscribers --------------------------------------------------------

    /// Insert a new subscriber. Usernames are unique.
    fn insert_subscriber(&self, subscriber: &Subscriber) -> Result<()>;

    /// Overwrite an existing subscriber record.
    fn update_subscriber(&self, subscriber: &Subscriber) -> Result<()>;

    fn get_subscriber(&self, id: Uuid) -> Result<Option<Subscriber>>;

    fn find_subscriber(&self, username: &str) -> Result<Option<Subscriber>>;

    /// All subscribers, ordered by username.
    fn list_subscribers(&self) -> Result<Vec<Subscriber>>;

    /// Subscribers due in `slot`: alarm at the slot's time of day, alarm on,
    /// account activated. A single snapshot, ordered by username.
    fn select_due(&self, slot: Slot) -> Result<Vec<Subscriber>>;

    // -- call attempts ------------------------------------------------------

    /// Create the attempt for (`slot`, `subscriber`), or return the existing one.
    fn create_attempt(&self, slot: Slot, subscriber: Uuid) -> Result<CallAttempt>;

    fn get_attempt(&self, slot: Slot, subscriber: Uuid) -> Result<Option<CallAttempt>>;

    /// Every attempt created in `slot`.
    fn attempts_for_slot(&self, slot: Slot) -> Result<Vec<CallAttempt>>;

    fn attempts_for_subscriber(&self, subscriber: Uuid) -> Result<Vec<CallAttempt>>;

    /// Every attempt, oldest slot first.
    fn list_attempts(&self) -> Result<Vec<CallAttempt>>;

    /// Record the outcome of one placement. Bumps `retry_count` on re-dials
    /// and replaces `error_code` (cleared on success).
    fn record_dispatch(
        &self,
        slot: Slot,
        subscriber: Uuid,
        redial: bool,
        error_code: Option<&str>,
    ) -> Result<()>;

    /// The write performed by the external answer recorder.
    fn mark_answered(&self, slot: Slot, subscriber: Uuid) -> Result<()>;

    /// Set `snoozed` on every unanswered attempt of `slot` and return the
    /// subscribers still unanswered, read in the same transaction.
    fn mark_snoozed(&self, slot: Slot) -> Result<Vec<Uuid>>;

    // -- contacts -----------------------------------------------------------

    fn insert_contact(&self, contact: &ContactRelation) -> Result<()>;

    /// Contacts with `status` whose requester has an attempt in `slot`.
    fn contacts_for_slot(&self, slot: Slot, status: ContactStatus)
        -> Result<Vec<ContactRelation>>;

    // -- cleanup ------------------------------------------------------------

    /// Clear `any_match` for every participant of `slot`, and `alarm_on` for
    /// the non-recurring ones. Idempotent.
    fn finalize_slot(&self, slot: Slot) -> Result<FinalizeSummary>;
}

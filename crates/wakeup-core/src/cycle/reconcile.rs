//! Round-end reconciliation.
//!
//! After each wait window the cycle re-reads the slot's attempts, marks every
//! unanswered one as snoozed, shrinks the pending set and sends the contact
//! notifications for the slot's participants.

use std::collections::HashSet;
use std::future::Future;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::model::{ContactStatus, Subscriber};
use crate::slot::Slot;
use crate::store::WakeupStore;

/// A notification the notifier could not deliver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Outbound contact notifications. Delivery is best effort.
pub trait Notifier: Send + Sync {
    /// `from` asked to add `to` as a contact and is still waiting.
    fn contact_requested(
        &self,
        from: &Subscriber,
        to: &Subscriber,
    ) -> impl Future<Output = std::result::Result<(), NotifyError>> + Send;

    /// `from` and `to` are now contacts.
    fn contact_accepted(
        &self,
        from: &Subscriber,
        to: &Subscriber,
    ) -> impl Future<Output = std::result::Result<(), NotifyError>> + Send;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// Subscribers to dial again next round.
    pub still_pending: Vec<Subscriber>,
    /// Subscribers that left the pending set this round.
    pub answered: Vec<Uuid>,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
}

/// Reconcile the pending set of `slot` against the store.
///
/// The new pending set is the previous one restricted to subscribers whose
/// attempt is still unanswered, so it can only shrink. Snoozed flags and the
/// unanswered set come from one transaction: everyone left pending is snoozed.
pub async fn reconcile<S, N>(
    store: &S,
    notifier: &N,
    slot: Slot,
    pending: Vec<Subscriber>,
) -> Result<Reconciliation>
where
    S: WakeupStore + ?Sized,
    N: Notifier,
{
    let unanswered: HashSet<Uuid> = store.mark_snoozed(slot)?.into_iter().collect();
    let (still_pending, answered): (Vec<Subscriber>, Vec<Subscriber>) = pending
        .into_iter()
        .partition(|s| unanswered.contains(&s.id));

    info!(
        %slot,
        answered = answered.len(),
        pending = still_pending.len(),
        "round reconciled"
    );

    let (notifications_sent, notifications_failed) = notify_contacts(store, notifier, slot).await?;

    Ok(Reconciliation {
        still_pending,
        answered: answered.into_iter().map(|s| s.id).collect(),
        notifications_sent,
        notifications_failed,
    })
}

/// Send one notification per pending and per accepted contact relation whose
/// requester takes part in `slot`. Repeats every round while the relation
/// qualifies.
async fn notify_contacts<S, N>(store: &S, notifier: &N, slot: Slot) -> Result<(usize, usize)>
where
    S: WakeupStore + ?Sized,
    N: Notifier,
{
    let mut sent = 0;
    let mut failed = 0;

    for status in [ContactStatus::Pending, ContactStatus::Accepted] {
        for contact in store.contacts_for_slot(slot, status)? {
            let from = store.get_subscriber(contact.requester)?;
            let to = store.get_subscriber(contact.target)?;
            let (Some(from), Some(to)) = (from, to) else {
                warn!(
                    requester = %contact.requester,
                    target = %contact.target,
                    "contact refers to an unknown subscriber; skipping notification"
                );
                failed += 1;
                continue;
            };

            let delivered = match status {
                ContactStatus::Pending => notifier.contact_requested(&from, &to).await,
                ContactStatus::Accepted => notifier.contact_accepted(&from, &to).await,
            };
            match delivered {
                Ok(()) => {
                    debug!(%status, from = %from.username, to = %to.username, "contact notification sent");
                    sent += 1;
                }
                Err(e) => {
                    warn!(%status, from = %from.username, to = %to.username, error = %e, "contact notification failed");
                    failed += 1;
                }
            }
        }
    }

    Ok((sent, failed))
}

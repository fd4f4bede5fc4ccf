//! The retry loop: one wake-up cycle as an explicit state machine.
//!
//! ```text
//! Selecting ─▶ Dispatching ─▶ Waiting ─▶ Reconciling ─┐
//!                  ▲    │                              │
//!                  └────┼──────────────────────────────┘
//!                       ▼
//!                  Finalizing ─▶ Done
//! ```
//!
//! Dispatching moves to Finalizing once nobody is pending, the round budget
//! is spent, or shutdown was requested. A store error in any state aborts the
//! cycle without finalizing; the next cycle starts from a fresh selection.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::CycleSettings;
use crate::error::Result;
use crate::model::Subscriber;
use crate::slot::{CallbackUrls, Slot};
use crate::store::{FinalizeSummary, WakeupStore};

use super::dispatch::{dispatch_round, CallPlacer};
use super::finalize::finalize;
use super::reconcile::{reconcile, Notifier};
use super::select::{initial_pending, open_attempts, select_candidates};
use super::timer::{Shutdown, Timer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    Selecting,
    Dispatching,
    Waiting,
    Reconciling,
    Finalizing,
    Done,
}

/// What one cycle did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub slot: Slot,
    /// Subscribers selected at cycle start.
    pub selected: Vec<Uuid>,
    /// Selected subscribers whose attempt was answered by an earlier run of
    /// the same slot. They are not dialled again.
    pub already_answered: Vec<Uuid>,
    /// Dispatch rounds executed.
    pub rounds: u32,
    /// Pending set after each round's reconciliation.
    pub pending_after_round: Vec<Vec<Uuid>>,
    pub dispatches: usize,
    pub dispatch_failures: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
    pub finalize: FinalizeSummary,
    pub cancelled: bool,
}

impl CycleReport {
    fn new(slot: Slot) -> Self {
        Self {
            slot,
            selected: Vec::new(),
            already_answered: Vec::new(),
            rounds: 0,
            pending_after_round: Vec::new(),
            dispatches: 0,
            dispatch_failures: 0,
            notifications_sent: 0,
            notifications_failed: 0,
            finalize: FinalizeSummary::default(),
            cancelled: false,
        }
    }

    /// Subscribers that never answered.
    pub fn unanswered(&self) -> Vec<Uuid> {
        match self.pending_after_round.last() {
            Some(pending) => pending.clone(),
            None => self
                .selected
                .iter()
                .filter(|id| !self.already_answered.contains(*id))
                .copied()
                .collect(),
        }
    }
}

/// Drives one cycle against its collaborators.
pub struct WakeupCycle<'a, S, P, N, T> {
    store: &'a S,
    placer: &'a P,
    notifier: &'a N,
    timer: &'a T,
    settings: CycleSettings,
    web_root: String,
    shutdown: Shutdown,
}

impl<'a, S, P, N, T> WakeupCycle<'a, S, P, N, T>
where
    S: WakeupStore,
    P: CallPlacer,
    N: Notifier,
    T: Timer,
{
    pub fn new(
        store: &'a S,
        placer: &'a P,
        notifier: &'a N,
        timer: &'a T,
        settings: CycleSettings,
        web_root: impl Into<String>,
    ) -> Self {
        Self {
            store,
            placer,
            notifier,
            timer,
            settings,
            web_root: web_root.into(),
            shutdown: Shutdown::never(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Run the cycle for the slot nearest to `now`.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        let slot = Slot::quantize(now, self.settings.slot_granularity_minutes);
        info!(
            %slot,
            max_rounds = self.settings.max_rounds,
            wait_secs = self.settings.wait.as_secs(),
            "wake-up cycle started"
        );
        match self.drive(slot).await {
            Ok(report) => {
                info!(
                    %slot,
                    rounds = report.rounds,
                    selected = report.selected.len(),
                    unanswered = report.unanswered().len(),
                    cancelled = report.cancelled,
                    "wake-up cycle finished"
                );
                Ok(report)
            }
            Err(e) => {
                error!(%slot, error = %e, "wake-up cycle aborted; flags left for the next cycle");
                Err(e)
            }
        }
    }

    async fn drive(&self, slot: Slot) -> Result<CycleReport> {
        let urls = CallbackUrls::for_slot(&self.web_root, slot);
        let mut report = CycleReport::new(slot);
        let mut pending: Vec<Subscriber> = Vec::new();
        let mut round = 0u32;
        let mut state = CycleState::Selecting;

        loop {
            state = match state {
                CycleState::Selecting if self.shutdown.is_triggered() => {
                    warn!(%slot, "shutdown requested before selection");
                    report.cancelled = true;
                    CycleState::Finalizing
                }
                CycleState::Selecting => {
                    let candidates = select_candidates(self.store, slot)?;
                    let attempts = open_attempts(self.store, slot, &candidates)?;
                    report.selected = candidates.iter().map(|s| s.id).collect();
                    pending = initial_pending(candidates, &attempts);
                    report.already_answered = report
                        .selected
                        .iter()
                        .filter(|id| !pending.iter().any(|s| s.id == **id))
                        .copied()
                        .collect();
                    if !report.already_answered.is_empty() {
                        info!(
                            %slot,
                            answered = report.already_answered.len(),
                            "skipping subscribers already answered in this slot"
                        );
                    }
                    CycleState::Dispatching
                }
                CycleState::Dispatching => {
                    if self.shutdown.is_triggered() {
                        warn!(%slot, round, "shutdown requested; finalizing early");
                        report.cancelled = true;
                        CycleState::Finalizing
                    } else if pending.is_empty() || round >= self.settings.max_rounds {
                        CycleState::Finalizing
                    } else {
                        round += 1;
                        info!(%slot, round, pending = pending.len(), "dispatching round");
                        let outcome =
                            dispatch_round(self.store, self.placer, slot, &urls, round, &pending)
                                .await?;
                        report.rounds = round;
                        report.dispatches += outcome.attempted;
                        report.dispatch_failures += outcome.failed.len();
                        CycleState::Waiting
                    }
                }
                CycleState::Waiting => {
                    tokio::select! {
                        _ = self.timer.wait(self.settings.wait) => {}
                        _ = self.shutdown.cancelled() => {
                            warn!(%slot, round, "shutdown requested; cutting wait window short");
                            report.cancelled = true;
                        }
                    }
                    CycleState::Reconciling
                }
                CycleState::Reconciling => {
                    let outcome =
                        reconcile(self.store, self.notifier, slot, std::mem::take(&mut pending))
                            .await?;
                    pending = outcome.still_pending;
                    report
                        .pending_after_round
                        .push(pending.iter().map(|s| s.id).collect());
                    report.notifications_sent += outcome.notifications_sent;
                    report.notifications_failed += outcome.notifications_failed;
                    if report.cancelled {
                        CycleState::Finalizing
                    } else {
                        CycleState::Dispatching
                    }
                }
                CycleState::Finalizing => {
                    report.finalize = finalize(self.store, slot)?;
                    CycleState::Done
                }
                CycleState::Done => return Ok(report),
            };
        }
    }
}

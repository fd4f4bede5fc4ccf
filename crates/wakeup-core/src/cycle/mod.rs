//! Batch wake-up cycle.
//!
//! One cycle quantizes the clock to a [`Slot`](crate::slot::Slot), selects
//! the subscribers due in it, and then runs bounded rounds of
//! dispatch → wait → reconcile until everyone answered or the round budget is
//! spent. The per-cycle flags of all participants are reset at the end.
//!
//! The call provider, the notifier and the wait window are collaborators
//! behind [`CallPlacer`], [`Notifier`] and [`Timer`], so the whole loop runs
//! against fakes in tests.

pub mod controller;
pub mod dispatch;
pub mod finalize;
pub mod reconcile;
pub mod select;
pub mod timer;

#[cfg(test)]
mod tests;

pub use controller::{CycleReport, CycleState, WakeupCycle};
pub use dispatch::{CallPlacer, CallRequest, DispatchError, RoundDispatch, TRANSPORT_ERROR_CODE};
pub use reconcile::{Notifier, NotifyError, Reconciliation};
pub use timer::{shutdown_channel, Shutdown, ShutdownTrigger, Timer, TokioTimer};

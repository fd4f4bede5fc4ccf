//! Call dispatch: one outbound call request per pending subscriber.
//!
//! The provider is the source of truth for whether a call was answered; the
//! dispatcher only learns whether the request was accepted. A failed request
//! is logged and recorded on the attempt, and the subscriber stays pending.

use std::future::Future;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::model::Subscriber;
use crate::slot::{CallbackUrls, Slot};
use crate::store::WakeupStore;

/// Error code recorded when the request never reached the provider.
pub const TRANSPORT_ERROR_CODE: &str = "transport";

/// Parameters of one outbound call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRequest {
    pub to: String,
    pub answer_url: String,
    pub fallback_url: String,
    pub no_answer_url: String,
    /// Hang up on answering machines instead of leaving a voicemail.
    pub silent: bool,
}

impl CallRequest {
    pub fn wake_up(phone: &str, urls: &CallbackUrls) -> Self {
        Self {
            to: phone.to_string(),
            answer_url: urls.answer.clone(),
            fallback_url: urls.fallback.clone(),
            no_answer_url: urls.no_answer.clone(),
            silent: true,
        }
    }
}

/// A call request the provider did not accept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("call placement failed ({code}): {message}")]
pub struct DispatchError {
    /// Provider error code, or [`TRANSPORT_ERROR_CODE`].
    pub code: String,
    pub message: String,
}

impl DispatchError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            code: TRANSPORT_ERROR_CODE.to_string(),
            message: message.into(),
        }
    }
}

/// The external call provider.
pub trait CallPlacer: Send + Sync {
    /// Ask the provider to place `request`. Returns the provider's call id.
    fn place_call(
        &self,
        request: &CallRequest,
    ) -> impl Future<Output = std::result::Result<String, DispatchError>> + Send;
}

/// Outcome of one dispatch round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundDispatch {
    pub attempted: usize,
    pub failed: Vec<Uuid>,
}

/// Place a call to every subscriber in `pending`, concurrently.
///
/// Provider failures never abort the round. Store failures do: the attempt
/// bookkeeping is written after all requests have returned, and the first
/// failing write is propagated.
pub async fn dispatch_round<S, P>(
    store: &S,
    placer: &P,
    slot: Slot,
    urls: &CallbackUrls,
    round: u32,
    pending: &[Subscriber],
) -> Result<RoundDispatch>
where
    S: WakeupStore + ?Sized,
    P: CallPlacer,
{
    let calls = pending.iter().map(|subscriber| async move {
        let request = CallRequest::wake_up(&subscriber.phone, urls);
        debug!(round, subscriber = %subscriber.username, phone = %subscriber.phone, "placing call");
        (subscriber, placer.place_call(&request).await)
    });
    let outcomes = join_all(calls).await;

    let redial = round > 1;
    let mut summary = RoundDispatch {
        attempted: outcomes.len(),
        failed: Vec::new(),
    };
    for (subscriber, outcome) in outcomes {
        match outcome {
            Ok(call_id) => {
                debug!(round, subscriber = %subscriber.username, %call_id, "call placed");
                store.record_dispatch(slot, subscriber.id, redial, None)?;
            }
            Err(e) => {
                warn!(round, subscriber = %subscriber.username, error = %e, "call placement failed; subscriber stays pending");
                store.record_dispatch(slot, subscriber.id, redial, Some(&e.code))?;
                summary.failed.push(subscriber.id);
            }
        }
    }
    Ok(summary)
}

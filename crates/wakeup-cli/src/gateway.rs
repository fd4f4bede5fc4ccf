//! Bridges between the cycle's collaborator traits and the telephony clients.

use anyhow::Context;
use tracing::{debug, info, warn};
use wakeup_core::config::{Config, NotificationConfig};
use wakeup_core::cycle::{CallPlacer, CallRequest, DispatchError, Notifier, NotifyError};
use wakeup_core::model::Subscriber;
use wakeup_telephony::{Email, MailClient, OutboundCall, TwilioClient};

// ---------------------------------------------------------------------------
// Call placement
// ---------------------------------------------------------------------------

/// The call provider selected by the config.
pub enum Placer {
    Provider(TwilioClient),
    /// No provider credentials: calls are logged, never placed.
    DryRun,
}

impl Placer {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = &config.provider;
        if provider.account_sid.is_empty() || provider.auth_token.is_empty() {
            warn!("no provider credentials configured; running dry");
            return Ok(Placer::DryRun);
        }
        let client = TwilioClient::new(
            provider.base_url.as_str(),
            provider.account_sid.as_str(),
            provider.auth_token.as_str(),
            provider.from_number.as_str(),
        )
        .context("failed to build provider client")?;
        info!(from = client.from_number(), "placing calls through the provider");
        Ok(Placer::Provider(client))
    }
}

impl CallPlacer for Placer {
    async fn place_call(&self, request: &CallRequest) -> Result<String, DispatchError> {
        let client = match self {
            Placer::Provider(client) => client,
            Placer::DryRun => {
                info!(to = %request.to, url = %request.answer_url, "dry run: call not placed");
                return Ok("dry-run".to_string());
            }
        };
        let call = OutboundCall {
            to: request.to.clone(),
            url: request.answer_url.clone(),
            fallback_url: request.fallback_url.clone(),
            status_callback: request.no_answer_url.clone(),
            silent: request.silent,
        };
        match client.place_call(&call).await {
            Ok(placed) => Ok(placed.sid),
            Err(e) => Err(match e.code() {
                Some(code) => DispatchError {
                    code: code.to_string(),
                    message: e.to_string(),
                },
                None => DispatchError::transport(e.to_string()),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// The notification channel selected by the config.
pub enum Notifications {
    Log,
    Mail(MailClient),
}

impl Notifications {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        match &config.notifications {
            NotificationConfig::Log => Ok(Notifications::Log),
            NotificationConfig::Mail {
                endpoint,
                api_key,
                sender,
            } => {
                let client = MailClient::new(endpoint.as_str(), api_key.as_str(), sender.as_str())
                    .context("failed to build mail client")?;
                Ok(Notifications::Mail(client))
            }
        }
    }

    async fn deliver(
        &self,
        kind: &str,
        recipient: &Subscriber,
        email: impl FnOnce(&str) -> Email,
    ) -> Result<(), NotifyError> {
        let client = match self {
            Notifications::Log => {
                info!(kind, to = %recipient.username, "contact notification");
                return Ok(());
            }
            Notifications::Mail(client) => client,
        };
        let Some(address) = recipient.email.as_deref() else {
            debug!(kind, to = %recipient.username, "no e-mail address; notification skipped");
            return Ok(());
        };
        client
            .send(&email(address))
            .await
            .map_err(|e| NotifyError(e.to_string()))
    }
}

impl Notifier for Notifications {
    async fn contact_requested(
        &self,
        from: &Subscriber,
        to: &Subscriber,
    ) -> Result<(), NotifyError> {
        self.deliver("contact_requested", to, |address| {
            Email::contact_requested(address, &to.username, &from.username)
        })
        .await
    }

    async fn contact_accepted(
        &self,
        from: &Subscriber,
        to: &Subscriber,
    ) -> Result<(), NotifyError> {
        self.deliver("contact_accepted", to, |address| {
            Email::contact_accepted(address, &to.username, &from.username)
        })
        .await
    }
}

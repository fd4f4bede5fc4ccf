use tracing::debug;

use crate::types::{Email, MailPayload};
use crate::{Result, TelephonyError, REQUEST_TIMEOUT};

/// Client for a transactional mail API that accepts one JSON message per POST.
#[derive(Debug, Clone)]
pub struct MailClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    sender: String,
}

impl MailClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        sender: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            sender: sender.into(),
        })
    }

    pub async fn send(&self, email: &Email) -> Result<()> {
        let payload = MailPayload {
            from: &self.sender,
            to: &email.to,
            subject: &email.subject,
            text: &email.body,
        };
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TelephonyError::from_response(status.as_u16(), &body));
        }
        debug!(to = %email.to, subject = %email.subject, "mail accepted");
        Ok(())
    }
}

use tracing::debug;

use crate::types::{CallResponse, OutboundCall};
use crate::{Result, TelephonyError, REQUEST_TIMEOUT};

/// Client for the provider's REST "Calls" resource.
#[derive(Debug, Clone)]
pub struct TwilioClient {
    http: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from: String,
}

impl TwilioClient {
    pub fn new(
        base_url: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from: from.into(),
        })
    }

    /// The caller id every call is placed from.
    pub fn from_number(&self) -> &str {
        &self.from
    }

    fn calls_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.base_url.trim_end_matches('/'),
            self.account_sid
        )
    }

    /// Ask the provider to place `call`.
    ///
    /// Returns once the provider has accepted the request; whether the callee
    /// answers is reported later through the call's callback URLs.
    pub async fn place_call(&self, call: &OutboundCall) -> Result<CallResponse> {
        let response = self
            .http
            .post(self.calls_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&call.form(&self.from))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TelephonyError::from_response(status.as_u16(), &body));
        }

        let placed: CallResponse =
            serde_json::from_str(&body).map_err(|source| TelephonyError::Parse { body, source })?;
        debug!(to = %call.to, sid = %placed.sid, "provider accepted call");
        Ok(placed)
    }
}

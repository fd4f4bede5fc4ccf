use serde::{Deserialize, Serialize};

// ─── Calls ────────────────────────────────────────────────────────────────

/// One outbound call to place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCall {
    /// Callee phone number (E.164).
    pub to: String,
    /// Fetched by the provider when the callee picks up.
    pub url: String,
    /// Fetched when `url` fails.
    pub fallback_url: String,
    /// Hit when the call ends.
    pub status_callback: String,
    /// Hang up on answering machines (`IfMachine=Hangup`).
    pub silent: bool,
}

impl OutboundCall {
    /// The provider's form parameters, `From` included.
    pub(crate) fn form<'a>(&'a self, from: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut form = vec![
            ("To", self.to.as_str()),
            ("From", from),
            ("Url", self.url.as_str()),
            ("FallbackUrl", self.fallback_url.as_str()),
            ("StatusCallback", self.status_callback.as_str()),
        ];
        if self.silent {
            form.push(("IfMachine", "Hangup"));
        }
        form
    }
}

/// The subset of the provider's call resource we read back.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CallResponse {
    pub sid: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Error document returned with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
}

// ─── Mail ─────────────────────────────────────────────────────────────────

/// A plain-text e-mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Email {
    /// Tell `recipient` that `requester` wants to add them as a contact.
    pub fn contact_requested(to: impl Into<String>, recipient: &str, requester: &str) -> Self {
        Self {
            to: to.into(),
            subject: format!("{requester} wants to wake up with you"),
            body: format!(
                "Hi {recipient},\n\n{requester} sent you a contact request. \
                 Accept it to be matched on the same wake-up call.\n"
            ),
        }
    }

    /// Tell `recipient` that `requester` is now a contact.
    pub fn contact_accepted(to: impl Into<String>, recipient: &str, requester: &str) -> Self {
        Self {
            to: to.into(),
            subject: format!("You and {requester} are now contacts"),
            body: format!(
                "Hi {recipient},\n\nYou and {requester} are now contacts and can be \
                 matched on the same wake-up call.\n"
            ),
        }
    }
}

/// Wire body of the mail API.
#[derive(Debug, Serialize)]
pub(crate) struct MailPayload<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub subject: &'a str,
    pub text: &'a str,
}

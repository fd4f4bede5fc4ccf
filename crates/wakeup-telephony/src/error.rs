use thiserror::Error;

use crate::types::ApiErrorBody;

#[derive(Debug, Error)]
pub enum TelephonyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected request ({status}, code {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Failed to parse provider response: {source}\n  body: {body}")]
    Parse {
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TelephonyError {
    /// Build an [`TelephonyError::Api`] from a non-2xx response body.
    ///
    /// Falls back to the HTTP status as the code when the body is not the
    /// provider's JSON error document.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(err) => TelephonyError::Api {
                status,
                code: err
                    .code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| status.to_string()),
                message: err.message.unwrap_or_else(|| body.to_string()),
            },
            Err(_) => TelephonyError::Api {
                status,
                code: status.to_string(),
                message: body.to_string(),
            },
        }
    }

    /// The provider error code, if the provider answered at all.
    pub fn code(&self) -> Option<&str> {
        match self {
            TelephonyError::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

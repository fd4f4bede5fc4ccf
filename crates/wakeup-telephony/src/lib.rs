//! `wakeup-telephony`: HTTP clients for the wake-up service's outside world.
//!
//! Two collaborators live here:
//!
//! ```text
//! TwilioClient   ← POST {base}/2010-04-01/Accounts/{sid}/Calls.json
//!                   form-encoded, HTTP basic auth, returns the call sid
//!
//! MailClient     ← POST {endpoint}  JSON {from, to, subject, text}
//!                   bearer API key
//! ```
//!
//! The crate knows nothing about subscribers, slots or cycles. Callers map
//! their own types onto [`OutboundCall`] and [`Email`].
//!
//! # Quick start
//!
//! ```rust,ignore
//! use wakeup_telephony::{OutboundCall, TwilioClient};
//!
//! let client = TwilioClient::new("https://api.twilio.com", "AC…", "token", "+15550000")?;
//! let call = OutboundCall {
//!     to: "+15550001".into(),
//!     url: "https://wake.example/wakeuprequest/03:06:24:07:00:00".into(),
//!     fallback_url: "https://wake.example/fallback/03:06:24:07:00:00".into(),
//!     status_callback: "https://wake.example/answercallback/03:06:24:07:00:00".into(),
//!     silent: true,
//! };
//! let placed = client.place_call(&call).await?;
//! println!("queued {}", placed.sid);
//! ```

pub mod client;
pub mod error;
pub mod mail;
pub mod types;


pub use client::TwilioClient;
pub use error::TelephonyError;
pub use mail::MailClient;
pub use types::{ApiErrorBody, CallResponse, Email, OutboundCall};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, TelephonyError>;

/// Request timeout shared by both clients.
pub(crate) const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);

//! Persistent records touched by the wake-up cycle.

pub mod call;
pub mod contact;
pub mod subscriber;

pub use call::CallAttempt;
pub use contact::{ContactRelation, ContactStatus};
pub use subscriber::{parse_alarm, Subscriber};

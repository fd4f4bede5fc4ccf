use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    Pending,
    Accepted,
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContactStatus::Pending => write!(f, "pending"),
            ContactStatus::Accepted => write!(f, "accepted"),
        }
    }
}

/// A directed contact request from `requester` to `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRelation {
    pub requester: Uuid,
    pub target: Uuid,
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
}

impl ContactRelation {
    pub fn new(requester: Uuid, target: Uuid, status: ContactStatus) -> Self {
        Self {
            requester,
            target,
            status,
            created_at: Utc::now(),
        }
    }
}

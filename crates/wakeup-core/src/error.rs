use thiserror::Error;

#[derive(Debug, Error)]
pub enum WakeupError {
    #[error("not initialized: run 'wakeup init'")]
    NotInitialized,

    #[error("store error: {0}")]
    Store(String),

    #[error("subscriber not found: {0}")]
    SubscriberNotFound(String),

    #[error("subscriber already exists: {0}")]
    SubscriberExists(String),

    #[error("no call attempt for subscriber {subscriber} in slot {slot}")]
    AttemptNotFound { subscriber: String, slot: String },

    #[error("invalid alarm time '{0}': expected HH:MM")]
    InvalidAlarmTime(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl WakeupError {
    /// Wrap any redb error (database, transaction, table, storage, commit).
    pub(crate) fn store(e: impl std::fmt::Display) -> Self {
        Self::Store(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WakeupError>;

pub mod calls;
pub mod config;
pub mod contact;
pub mod cycle;
pub mod init;
pub mod stats;
pub mod subscriber;

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use wakeup_core::model::Subscriber;
use wakeup_core::store::{WakeupDb, WakeupStore};
use wakeup_core::{paths, WakeupError};

/// Open the database of an initialized data root.
pub(crate) fn open_db(root: &Path) -> anyhow::Result<WakeupDb> {
    if !paths::config_path(root).exists() {
        return Err(WakeupError::NotInitialized.into());
    }
    let path = paths::db_path(root);
    WakeupDb::open(&path).with_context(|| format!("failed to open {}", path.display()))
}

pub(crate) fn subscriber_by_name(db: &WakeupDb, username: &str) -> anyhow::Result<Subscriber> {
    db.find_subscriber(username)?
        .ok_or_else(|| WakeupError::SubscriberNotFound(username.to_string()).into())
}

pub(crate) fn parse_instant(value: &str) -> anyhow::Result<DateTime<Utc>> {
    let at = DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("invalid timestamp '{value}': expected RFC 3339"))?;
    Ok(at.with_timezone(&Utc))
}

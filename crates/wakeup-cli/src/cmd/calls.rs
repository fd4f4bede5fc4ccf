use crate::output::{print_json, print_table, yes_no};
use anyhow::Context;
use std::collections::HashMap;
use std::path::Path;
use wakeup_core::config::Config;
use wakeup_core::slot::Slot;
use wakeup_core::store::WakeupStore;

pub fn run(root: &Path, slot: Option<&str>, json: bool) -> anyhow::Result<()> {
    let db = super::open_db(root)?;
    let attempts = match slot {
        Some(value) => {
            let config = Config::load(root).context("failed to load config")?;
            let at = super::parse_instant(value)?;
            db.attempts_for_slot(Slot::quantize(at, config.cycle.slot_granularity_minutes))?
        }
        None => db.list_attempts()?,
    };

    if json {
        return print_json(&attempts);
    }
    if attempts.is_empty() {
        println!("No call attempts.");
        return Ok(());
    }

    let names: HashMap<_, _> = db
        .list_subscribers()?
        .into_iter()
        .map(|s| (s.id, s.username))
        .collect();
    let rows: Vec<Vec<String>> = attempts
        .iter()
        .map(|a| {
            vec![
                a.slot().to_string(),
                names
                    .get(&a.subscriber_id)
                    .cloned()
                    .unwrap_or_else(|| a.subscriber_id.to_string()),
                yes_no(a.answered),
                yes_no(a.snoozed),
                yes_no(a.matched),
                yes_no(a.completed),
                a.error_code.clone().unwrap_or_else(|| "-".to_string()),
                a.retry_count.to_string(),
            ]
        })
        .collect();
    print_table(
        &[
            "SLOT",
            "SUBSCRIBER",
            "ANSWERED",
            "SNOOZED",
            "MATCHED",
            "COMPLETED",
            "ERROR",
            "RETRIES",
        ],
        &rows,
    );
    Ok(())
}

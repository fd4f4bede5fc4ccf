use anyhow::Context;
use chrono::Utc;
use std::path::Path;
use tracing::warn;
use wakeup_core::config::Config;
use wakeup_core::cycle::{shutdown_channel, CycleReport, TokioTimer, WakeupCycle};

use crate::gateway::{Notifications, Placer};
use crate::output::{print_json, print_table};

pub fn run(root: &Path, at: Option<&str>, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let settings = config.cycle_settings()?;
    let now = match at {
        Some(value) => super::parse_instant(value)?,
        None => Utc::now(),
    };

    let db = super::open_db(root)?;
    let placer = Placer::from_config(&config)?;
    let notifier = Notifications::from_config(&config)?;
    let timer = TokioTimer;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let report = runtime.block_on(async {
        let (trigger, shutdown) = shutdown_channel();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received; finishing the cycle early");
                trigger.trigger();
            }
        });

        WakeupCycle::new(
            &db,
            &placer,
            &notifier,
            &timer,
            settings,
            config.callbacks.web_root.as_str(),
        )
        .with_shutdown(shutdown)
        .run(now)
        .await
    })?;

    if json {
        print_json(&report)
    } else {
        print_summary(&report);
        Ok(())
    }
}

fn print_summary(report: &CycleReport) {
    println!("Slot: {}", report.slot);
    if report.cancelled {
        println!("(cancelled)");
    }
    let rows = vec![
        vec!["selected".to_string(), report.selected.len().to_string()],
        vec!["rounds".to_string(), report.rounds.to_string()],
        vec![
            "dispatches".to_string(),
            format!("{} ({} failed)", report.dispatches, report.dispatch_failures),
        ],
        vec![
            "notifications".to_string(),
            format!(
                "{} ({} failed)",
                report.notifications_sent, report.notifications_failed
            ),
        ],
        vec!["unanswered".to_string(), report.unanswered().len().to_string()],
        vec![
            "alarms cleared".to_string(),
            report.finalize.alarm_cleared.to_string(),
        ],
    ];
    print_table(&["", "count"], &rows);
}

use crate::output::print_json;
use std::path::Path;
use wakeup_core::stats::CallStats;

pub fn run(root: &Path, username: &str, json: bool) -> anyhow::Result<()> {
    let db = super::open_db(root)?;
    let subscriber = super::subscriber_by_name(&db, username)?;
    let stats = CallStats::for_subscriber(&db, subscriber.id)?;

    if json {
        print_json(&stats)
    } else {
        println!("Wake-up stats for {username}");
        println!("  total calls: {}", stats.total_calls);
        println!("  woke up:     {}", stats.woke_up);
        println!("  snoozed:     {}", stats.snoozed);
        println!("  overslept:   {}", stats.overslept);
        Ok(())
    }
}

use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use wakeup_core::config::{Config, WarnLevel};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the config with profile defaults resolved
    Show,

    /// Validate the config for common mistakes
    Validate,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let settings = config.cycle_settings()?;

    if json {
        let value = serde_json::json!({
            "config": config,
            "resolved": {
                "slot_granularity_minutes": settings.slot_granularity_minutes,
                "max_rounds": settings.max_rounds,
                "wait_seconds": settings.wait.as_secs(),
            },
        });
        return print_json(&value);
    }

    print!("{}", serde_yaml::to_string(&config)?);
    println!(
        "# resolved: {} round(s), {}s wait, {}-minute slots",
        settings.max_rounds,
        settings.wait.as_secs(),
        settings.slot_granularity_minutes
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}

use anyhow::Context;
use std::path::Path;
use wakeup_core::config::{Config, Profile};
use wakeup_core::paths;
use wakeup_core::store::WakeupDb;

pub fn run(root: &Path, profile: Option<&str>) -> anyhow::Result<()> {
    let profile: Profile = match profile {
        Some(p) => p.parse()?,
        None => Profile::default(),
    };

    println!("Initializing wake-up data in: {}", root.display());

    let dir = paths::wakeup_dir(root);
    std::fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    if paths::config_path(root).exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
    } else {
        Config::new(profile)
            .save(root)
            .context("failed to write config.yaml")?;
        println!("  created: {} (profile: {profile})", paths::CONFIG_FILE);
    }

    let db_path = paths::db_path(root);
    let existed = db_path.exists();
    WakeupDb::open(&db_path).with_context(|| format!("failed to open {}", db_path.display()))?;
    if existed {
        println!("  exists:  {}", paths::DB_FILE);
    } else {
        println!("  created: {}", paths::DB_FILE);
    }

    Ok(())
}

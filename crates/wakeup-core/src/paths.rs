use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const WAKEUP_DIR: &str = ".wakeup";
pub const CONFIG_FILE: &str = ".wakeup/config.yaml";
pub const DB_FILE: &str = ".wakeup/wakeup.db";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn wakeup_dir(root: &Path) -> PathBuf {
    root.join(WAKEUP_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn db_path(root: &Path) -> PathBuf {
    root.join(DB_FILE)
}

use std::path::{Path, PathBuf};

use wakeup_core::paths::WAKEUP_DIR;

/// Resolve the data root.
///
/// `--root` / `WAKEUP_ROOT` wins; otherwise the nearest ancestor of the
/// working directory holding a `.wakeup/` directory, else the working
/// directory itself.
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_data_root(&cwd).unwrap_or(cwd)
}

fn find_data_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(WAKEUP_DIR).is_dir())
        .map(Path::to_path_buf)
}

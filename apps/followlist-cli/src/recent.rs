//! Persistence for recently used handles

use crate::config::ConfigPaths;
use crate::error::CliResult;
use followlist_core::{Handle, RecentHandles};
use tracing::warn;

/// Load the recent-handles file, capped at `limit`.
///
/// A missing file is an empty list. An unreadable file is logged and treated
/// as empty; the list is a convenience and never blocks a command.
pub fn load_recent(paths: &ConfigPaths, limit: usize) -> RecentHandles {
    if !paths.recent_handles_file.exists() {
        return RecentHandles::new(limit);
    }

    let parsed = std::fs::read_to_string(&paths.recent_handles_file)
        .map_err(|e| e.to_string())
        .and_then(|content| {
            serde_json::from_str::<RecentHandles>(&content).map_err(|e| e.to_string())
        });

    match parsed {
        Ok(recent) => recent.with_limit(limit),
        Err(error) => {
            warn!(%error, "Ignoring unreadable recent handles file");
            RecentHandles::new(limit)
        }
    }
}

/// Write the recent-handles file
pub fn save_recent(paths: &ConfigPaths, recent: &RecentHandles) -> CliResult<()> {
    paths.ensure_dir_exists()?;
    std::fs::write(
        &paths.recent_handles_file,
        serde_json::to_string_pretty(recent)?,
    )?;
    Ok(())
}

/// Move `handle` to the front of the persisted list
pub fn record_recent(paths: &ConfigPaths, limit: usize, handle: Handle) -> CliResult<()> {
    let mut recent = load_recent(paths, limit);
    recent.record(handle);
    save_recent(paths, &recent)
}

/// Remove the recent-handles file
pub fn clear_recent(paths: &ConfigPaths) -> CliResult<()> {
    if paths.recent_handles_file.exists() {
        std::fs::remove_file(&paths.recent_handles_file)?;
    }
    Ok(())
}

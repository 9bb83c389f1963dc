//! Centralized path helpers for config, cache, and data directories.

use std::env;
use std::path::PathBuf;

use crate::core::app;

/// Environment variable that relocates the data directory (store files).
pub const DATA_DIR_ENV: &str = "RELAY_CHAT_DATA_DIR";

/// Project directories (config, cache, data) from the standard platform locations.
pub fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("io", app::VENDOR, app::NAME)
}

/// Config directory (~/.config/relay-chat/).
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().to_path_buf())
}

/// Cache directory (~/.cache/relay-chat/). Holds the TUI log file.
pub fn cache_dir() -> Option<PathBuf> {
    project_dirs().map(|d| d.cache_dir().to_path_buf())
}

/// Data directory for persisted state (~/.local/share/relay-chat/).
/// `RELAY_CHAT_DATA_DIR` overrides the platform location.
pub fn data_dir() -> Option<PathBuf> {
    if let Ok(dir) = env::var(DATA_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    project_dirs().map(|d| d.data_dir().to_path_buf())
}

//! Default filesystem locations for select-cron.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//! These functions are only consulted while building the default
//! [`SelectConfig`](crate::SelectConfig) at start-up; components receive
//! resolved paths through the config.
//!
//! # Directory Layout
//!
//! | Purpose | Linux | macOS |
//! |---------|-------|-------|
//! | App data | `~/.local/share/select_freeboxos/` | `~/Library/Application Support/select_freeboxos/` |
//! | Config | `~/.config/select_freeboxos/` | `~/Library/Application Support/select_freeboxos/` |
//!
//! # Environment Overrides
//!
//! - `SELECT_CRON_DATA_DIR`: overrides [`data_dir`]
//! - `SELECT_CRON_CONFIG_DIR`: overrides [`config_dir`]

use std::path::PathBuf;

const APP_DIR: &str = "select_freeboxos";

/// Application data root: artifacts and logs.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("SELECT_CRON_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("/tmp/select-cron-data"))
}

/// Application config directory.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("SELECT_CRON_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("/tmp/select-cron-config"))
}

/// Log file directory (`data_dir()/logs/`).
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// User home directory, falling back to `/tmp` when it cannot be resolved.
#[must_use]
pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"))
}

/// Conventional per-user networking credentials file (`~/.netrc`).
#[must_use]
pub fn netrc_file() -> PathBuf {
    home_dir().join(".netrc")
}

//! Configuration for the refresh cycle.
//!
//! A [`SelectConfig`] is built once at start-up (from `config.toml`, falling
//! back to defaults) and passed by reference into every component.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CycleError, Result};
use crate::select_dirs;

/// Default age in seconds after which the fresh snapshot is considered stale.
pub const DEFAULT_STALE_AFTER_SECS: u64 = 1800;

/// Default listing endpoint.
pub const DEFAULT_LISTING_URL: &str = "https://www.media-select.fr/api/v1/progweek";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectConfig {
    /// Artifact locations.
    pub paths: PathsConfig,
    /// Freshness gate settings.
    pub freshness: FreshnessConfig,
    /// Remote listing fetch settings.
    pub fetch: FetchConfig,
    /// Credential strategy selection.
    pub credentials: CredentialsConfig,
    /// Downstream process hand-off.
    pub trigger: TriggerConfig,
    /// Log file settings.
    pub logging: LoggingConfig,
}

/// Locations of the three JSON artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Fresh snapshot written by the fetcher.
    pub snapshot: PathBuf,
    /// Committed reference set written by the downstream process.
    pub committed: PathBuf,
    /// Pending queue written by the dedup engine.
    pub pending: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self::in_dir(&select_dirs::data_dir())
    }
}

impl PathsConfig {
    /// Artifact paths rooted at `dir`, using the conventional file names.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            snapshot: dir.join("info_progs.json"),
            committed: dir.join("info_progs_last.json"),
            pending: dir.join("progs_to_record.json"),
        }
    }
}

/// Freshness gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessConfig {
    /// Snapshot age (seconds) beyond which a refresh is due.
    pub stale_after_secs: u64,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: DEFAULT_STALE_AFTER_SECS,
        }
    }
}

/// Remote listing fetch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Listing endpoint.
    pub url: String,
    /// Value of the `Accept` header.
    pub accept: String,
    /// Value of the `Accept` header sent by the plaintext strategy's curl.
    pub curl_accept: String,
    /// Upper bound on the single request, in seconds.
    pub timeout_secs: u64,
    /// `curl` executable used by the plaintext strategy. Looked up on `PATH`
    /// when relative.
    pub curl_program: PathBuf,
    /// Make the plaintext strategy reject HTTP error responses instead of
    /// caching their body.
    pub fail_on_http_error: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_LISTING_URL.to_owned(),
            accept: "application/json; indent=4".to_owned(),
            curl_accept: "application/json;indent=4".to_owned(),
            timeout_secs: 60,
            curl_program: PathBuf::from("curl"),
            fail_on_http_error: false,
        }
    }
}

/// Credential strategy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// `true` selects the secret store; `false` selects the netrc file.
    pub encrypted: bool,
    /// Secret store service identifier.
    pub service: String,
    /// Secret store account holding the username.
    pub username_account: String,
    /// Secret store account holding the password.
    pub password_account: String,
    /// Netrc file used by the plaintext strategy.
    pub netrc_path: PathBuf,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            encrypted: false,
            service: "media-select".to_owned(),
            username_account: "username".to_owned(),
            password_account: "password".to_owned(),
            netrc_path: select_dirs::netrc_file(),
        }
    }
}

/// Downstream process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Spawn the downstream process after a completed cycle.
    pub enabled: bool,
    /// Program to run.
    pub program: PathBuf,
    /// Program arguments.
    pub args: Vec<String>,
    /// Working directory of the spawned process.
    pub working_dir: PathBuf,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: PathBuf::from("/bin/bash"),
            args: vec!["cron_freeboxos_app.sh".to_owned()],
            working_dir: select_dirs::home_dir().join("select-freeboxos"),
        }
    }
}

/// Log file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for rolling log files.
    pub dir: PathBuf,
    /// File name prefix for log files.
    pub file_prefix: String,
    /// Number of daily log files to keep.
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: select_dirs::logs_dir(),
            file_prefix: "select-cron".to_owned(),
            max_files: 5,
        }
    }
}

impl SelectConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CycleError::Config(e.to_string()))
    }

    /// Load `path` if it exists, otherwise return the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CycleError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check values that would otherwise fail later in the cycle.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.url.trim().is_empty() {
            return Err(CycleError::Config("fetch.url must not be empty".to_owned()));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(CycleError::Config(
                "fetch.timeout_secs must be > 0".to_owned(),
            ));
        }
        if self.freshness.stale_after_secs == 0 {
            return Err(CycleError::Config(
                "freshness.stale_after_secs must be > 0".to_owned(),
            ));
        }
        if self.paths.snapshot == self.paths.pending || self.paths.committed == self.paths.pending
        {
            return Err(CycleError::Config(
                "paths.pending must differ from the snapshot and committed paths".to_owned(),
            ));
        }
        if self.credentials.encrypted
            && (self.credentials.username_account.is_empty()
                || self.credentials.password_account.is_empty())
        {
            return Err(CycleError::Config(
                "credentials accounts must be set for the encrypted strategy".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        select_dirs::config_file()
    }
}

//! Error types for the refresh cycle.
//!
//! Errors are split by how the cycle reacts to them. [`FetchError`] is
//! soft: it is logged and the cycle carries on with whatever snapshot is on
//! disk. [`CycleError`] is fatal: the cycle stops before touching the pending
//! queue.

use std::path::PathBuf;

use crate::credentials::CredentialError;

/// Fatal error for a refresh cycle.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    /// Configuration is invalid or a start-up prerequisite is missing.
    #[error("config error: {0}")]
    Config(String),

    /// The fresh snapshot is missing, unreadable or not a JSON array.
    #[error("cannot read fresh snapshot {}: {reason}", path.display())]
    CacheRead {
        /// Snapshot path.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The committed reference set exists but cannot be parsed.
    #[error("cannot read committed set {}: {reason}", path.display())]
    CommittedRead {
        /// Committed set path.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The pending queue could not be written.
    #[error("cannot write pending queue {}: {reason}", path.display())]
    PendingWrite {
        /// Pending queue path.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The downstream process could not be started.
    #[error("trigger error: {0}")]
    Trigger(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of the fetch stage. Never aborts a cycle.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Credentials could not be obtained from the secret store.
    #[error("credentials unavailable: {0}")]
    CredentialUnavailable(#[from] CredentialError),

    /// Network or subprocess failure before a response was obtained.
    #[error("transport error for {url}: {reason}")]
    Transport {
        /// Requested URL.
        url: String,
        /// What went wrong.
        reason: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// The response was received but could not be written to the cache.
    #[error("cannot write snapshot {}: {reason}", path.display())]
    Write {
        /// Snapshot path.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, CycleError>;

//! Computes the pending queue: snapshot items not yet committed downstream.
//!
//! Items are compared as whole JSON records. Two items are the same only if
//! every field matches; object key order does not matter. The output keeps
//! the snapshot's order and always replaces the previous queue.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use crate::config::PathsConfig;
use crate::error::{CycleError, Result};
use crate::persist::write_atomic;

/// Counts from one dedup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffReport {
    /// Items in the fresh snapshot.
    pub fresh: usize,
    /// Items in the committed set.
    pub committed: usize,
    /// Items written to the pending queue.
    pub pending: usize,
}

/// Snapshot items with no structurally equal item in `committed`, in snapshot order.
#[must_use]
pub fn pending_items(fresh: &[Value], committed: &[Value]) -> Vec<Value> {
    fresh
        .iter()
        .filter(|item| !committed.contains(item))
        .cloned()
        .collect()
}

/// Load the fresh snapshot.
///
/// # Errors
///
/// Returns [`CycleError::CacheRead`] if the file is missing, unreadable,
/// not valid JSON, or not an array.
pub fn load_snapshot(path: &Path) -> Result<Vec<Value>> {
    let cache_read = |reason: String| CycleError::CacheRead {
        path: path.to_path_buf(),
        reason,
    };
    let bytes = std::fs::read(path).map_err(|e| cache_read(e.to_string()))?;
    parse_array(&bytes).map_err(cache_read)
}

/// Load the committed reference set. A missing file is an empty set.
///
/// # Errors
///
/// Returns [`CycleError::CommittedRead`] if the file exists but cannot be
/// read, is not valid JSON, or is not an array.
pub fn load_committed(path: &Path) -> Result<Vec<Value>> {
    let committed_read = |reason: String| CycleError::CommittedRead {
        path: path.to_path_buf(),
        reason,
    };
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(committed_read(e.to_string())),
    };
    parse_array(&bytes).map_err(committed_read)
}

fn parse_array(bytes: &[u8]) -> std::result::Result<Vec<Value>, String> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Err(format!("expected a JSON array, found {}", json_kind(&other))),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Render items as a JSON array indented with four spaces.
///
/// # Errors
///
/// Returns a `serde_json::Error` if serialization fails.
pub fn to_pretty_json(items: &[Value]) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    items.serialize(&mut serializer)?;
    Ok(out)
}

/// Reads the snapshot and committed set and rewrites the pending queue.
#[derive(Debug, Clone)]
pub struct DedupEngine {
    snapshot: PathBuf,
    committed: PathBuf,
    pending: PathBuf,
}

impl DedupEngine {
    /// Create an engine over the configured artifacts.
    #[must_use]
    pub fn new(paths: &PathsConfig) -> Self {
        Self {
            snapshot: paths.snapshot.clone(),
            committed: paths.committed.clone(),
            pending: paths.pending.clone(),
        }
    }

    /// Recompute and replace the pending queue.
    ///
    /// Nothing is written unless both inputs load.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::CacheRead`], [`CycleError::CommittedRead`] or
    /// [`CycleError::PendingWrite`].
    pub fn run(&self) -> Result<DiffReport> {
        let fresh = load_snapshot(&self.snapshot).inspect_err(|e| {
            tracing::error!(error = %e, "fresh snapshot unusable, pending queue left unchanged");
        })?;
        let committed = load_committed(&self.committed).inspect_err(|e| {
            tracing::error!(error = %e, "committed set unusable, pending queue left unchanged");
        })?;

        let pending = pending_items(&fresh, &committed);
        let pending_write = |reason: String| CycleError::PendingWrite {
            path: self.pending.clone(),
            reason,
        };
        let body = to_pretty_json(&pending).map_err(|e| pending_write(e.to_string()))?;
        write_atomic(&self.pending, &body).map_err(|e| pending_write(e.to_string()))?;

        let report = DiffReport {
            fresh: fresh.len(),
            committed: committed.len(),
            pending: pending.len(),
        };
        tracing::info!(
            fresh = report.fresh,
            committed = report.committed,
            pending = report.pending,
            path = %self.pending.display(),
            "pending queue written"
        );
        Ok(report)
    }
}

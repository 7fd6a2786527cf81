//! Freshness gates deciding whether an invocation runs a refresh cycle.
//!
//! Two gates must both be open:
//!
//! - the **daily gate** opens when the committed set has not been written
//!   today (local calendar date), so at most one cycle runs per day;
//! - the **staleness gate** opens when the cached snapshot is missing,
//!   unreadable, empty, or older than the configured threshold.
//!
//! The current time is always passed in, which keeps the decision pure with
//! respect to the clock.

use std::fmt;
use std::io;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, TimeDelta};

use crate::config::PathsConfig;

/// State of the daily gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyGate {
    /// No committed set exists yet.
    NeverCommitted,
    /// The committed set was last written on an earlier day.
    CommittedBefore(NaiveDate),
    /// The committed set was already written today.
    CommittedToday,
    /// The committed set's metadata could not be read.
    Unreadable(String),
}

impl DailyGate {
    /// Whether this gate lets a cycle through.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::CommittedToday)
    }
}

impl fmt::Display for DailyGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NeverCommitted => write!(f, "nothing committed yet"),
            Self::CommittedBefore(date) => write!(f, "last committed on {date}"),
            Self::CommittedToday => write!(f, "already committed today"),
            Self::Unreadable(reason) => write!(f, "committed set unreadable ({reason})"),
        }
    }
}

/// State of the staleness gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    /// The snapshot does not exist.
    Missing,
    /// The snapshot's metadata could not be read.
    Unreadable(String),
    /// The snapshot is zero bytes long.
    Empty,
    /// The snapshot is older than the threshold.
    Expired {
        /// Age in whole seconds.
        age_secs: i64,
    },
    /// The snapshot is recent and non-empty.
    Fresh {
        /// Age in whole seconds.
        age_secs: i64,
    },
}

impl Staleness {
    /// Whether this gate lets a cycle through.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Fresh { .. })
    }
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "snapshot missing"),
            Self::Unreadable(reason) => write!(f, "snapshot unreadable ({reason})"),
            Self::Empty => write!(f, "snapshot empty"),
            Self::Expired { age_secs } => write!(f, "snapshot expired ({age_secs}s old)"),
            Self::Fresh { age_secs } => write!(f, "snapshot fresh ({age_secs}s old)"),
        }
    }
}

/// Combined outcome of both gates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshnessDecision {
    /// Daily gate state.
    pub daily: DailyGate,
    /// Staleness gate state.
    pub staleness: Staleness,
}

impl FreshnessDecision {
    /// `true` when both gates are open.
    #[must_use]
    pub fn should_refresh(&self) -> bool {
        self.daily.is_open() && self.staleness.is_open()
    }
}

impl fmt::Display for FreshnessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.should_refresh() {
            "refresh"
        } else {
            "skip"
        };
        write!(f, "{verdict}: {}; {}", self.daily, self.staleness)
    }
}

/// Evaluates the freshness gates against artifact metadata.
#[derive(Debug, Clone)]
pub struct FreshnessMonitor {
    stale_after: TimeDelta,
}

impl FreshnessMonitor {
    /// Create a monitor treating snapshots older than `stale_after` as stale.
    #[must_use]
    pub fn new(stale_after: Duration) -> Self {
        let stale_after = TimeDelta::from_std(stale_after).unwrap_or(TimeDelta::MAX);
        Self { stale_after }
    }

    /// Daily gate for the committed set at `committed`.
    #[must_use]
    pub fn daily_gate(&self, committed: &Path, now: DateTime<Local>) -> DailyGate {
        let modified = match std::fs::metadata(committed).and_then(|m| m.modified()) {
            Ok(t) => DateTime::<Local>::from(t),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return DailyGate::NeverCommitted,
            Err(e) => return DailyGate::Unreadable(e.to_string()),
        };

        let committed_on = modified.date_naive();
        if committed_on < now.date_naive() {
            DailyGate::CommittedBefore(committed_on)
        } else {
            DailyGate::CommittedToday
        }
    }

    /// Staleness gate for the snapshot at `snapshot`.
    #[must_use]
    pub fn staleness_gate(&self, snapshot: &Path, now: DateTime<Local>) -> Staleness {
        let metadata = match std::fs::metadata(snapshot) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Staleness::Missing,
            Err(e) => return Staleness::Unreadable(e.to_string()),
        };
        let modified = match metadata.modified() {
            Ok(t) => DateTime::<Local>::from(t),
            Err(e) => return Staleness::Unreadable(e.to_string()),
        };

        if metadata.len() == 0 {
            return Staleness::Empty;
        }

        let age = now.signed_duration_since(modified);
        let age_secs = age.num_seconds();
        if age > self.stale_after {
            Staleness::Expired { age_secs }
        } else {
            Staleness::Fresh { age_secs }
        }
    }

    /// Evaluate both gates for the configured artifacts.
    #[must_use]
    pub fn evaluate(&self, paths: &PathsConfig, now: DateTime<Local>) -> FreshnessDecision {
        FreshnessDecision {
            daily: self.daily_gate(&paths.committed, now),
            staleness: self.staleness_gate(&paths.snapshot, now),
        }
    }
}

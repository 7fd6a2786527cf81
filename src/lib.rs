//! select-cron: keeps the weekly programme listing cached and works out which
//! programmes still need to be handed to the recorder.
//!
//! Each scheduled invocation runs at most one cycle:
//! Freshness gates → Fetch → Dedup → Trigger
//!
//! # Architecture
//!
//! - **Freshness**: daily gate on the committed set, staleness gate on the
//!   cached snapshot ([`freshness`])
//! - **Credentials**: secret-store or netrc strategy, chosen once from
//!   config ([`credentials`])
//! - **Fetch**: one authenticated read of the listing API into the snapshot
//!   ([`fetch`])
//! - **Dedup**: snapshot minus committed set, written as the pending queue
//!   ([`dedup`])
//! - **Trigger**: detached spawn of the downstream recorder ([`trigger`])

pub mod config;
pub mod credentials;
pub mod cycle;
pub mod dedup;
pub mod error;
pub mod fetch;
pub mod freshness;
pub mod logging;
pub mod persist;
pub mod select_dirs;
pub mod trigger;

pub use config::SelectConfig;
pub use cycle::{Cycle, CycleOutcome, CycleReport, TriggerStatus};
pub use error::{CycleError, FetchError, Result};

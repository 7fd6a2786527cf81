//! One scheduled invocation: gate check → fetch → dedup → trigger.
//!
//! Stage failures are handled differently:
//!
//! | Stage | On failure |
//! |-------|------------|
//! | fetch | logged, cycle continues with the cached snapshot |
//! | dedup | cycle aborts, pending queue untouched |
//! | trigger | logged and reported, pending queue already written |

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::config::{PathsConfig, SelectConfig};
use crate::credentials::{CredentialResolver, SecretStore};
use crate::dedup::{DedupEngine, DiffReport};
use crate::error::{FetchError, Result};
use crate::fetch::{FetchReport, ListingTransport, RemoteFetcher};
use crate::freshness::{FreshnessDecision, FreshnessMonitor};
use crate::trigger::{DownstreamTrigger, TriggerReceipt};

/// What happened to the downstream hand-off.
#[derive(Debug)]
pub enum TriggerStatus {
    /// The trigger is disabled in configuration.
    Disabled,
    /// The downstream process was started.
    Started(TriggerReceipt),
    /// The downstream process could not be started.
    Failed(String),
}

/// Summary of a cycle that ran past the gates.
#[derive(Debug)]
pub struct CycleReport {
    /// Gate decision at the start of the cycle.
    pub decision: FreshnessDecision,
    /// Whether the gates were bypassed.
    pub forced: bool,
    /// Fetch stage result. An error here did not stop the cycle.
    pub fetch: std::result::Result<FetchReport, FetchError>,
    /// Dedup stage counts.
    pub diff: DiffReport,
    /// Downstream hand-off result.
    pub trigger: TriggerStatus,
}

impl CycleReport {
    /// `true` unless the downstream process failed to start.
    #[must_use]
    pub fn handed_off(&self) -> bool {
        !matches!(self.trigger, TriggerStatus::Failed(_))
    }
}

/// Result of [`Cycle::run`].
#[derive(Debug)]
pub enum CycleOutcome {
    /// At least one gate was closed; nothing was done.
    Skipped(FreshnessDecision),
    /// The cycle ran to completion.
    Completed(CycleReport),
}

/// The refresh pipeline, assembled once per process.
pub struct Cycle {
    paths: PathsConfig,
    monitor: FreshnessMonitor,
    fetcher: RemoteFetcher,
    dedup: DedupEngine,
    trigger: Option<DownstreamTrigger>,
}

impl Cycle {
    /// Assemble a cycle around an explicit transport.
    #[must_use]
    pub fn new(config: &SelectConfig, transport: Box<dyn ListingTransport>) -> Self {
        Self {
            paths: config.paths.clone(),
            monitor: FreshnessMonitor::new(Duration::from_secs(config.freshness.stale_after_secs)),
            fetcher: RemoteFetcher::new(transport, config.paths.snapshot.clone()),
            dedup: DedupEngine::new(&config.paths),
            trigger: config
                .trigger
                .enabled
                .then(|| DownstreamTrigger::from_config(&config.trigger)),
        }
    }

    /// Assemble a cycle using the configured credential strategy.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::Config`](crate::CycleError::Config) if the
    /// configuration is invalid or the plaintext strategy has no netrc file.
    pub fn from_config(config: &SelectConfig, store: Arc<dyn SecretStore>) -> Result<Self> {
        config.validate()?;
        let resolver = CredentialResolver::from_config(&config.credentials, store)?;
        let transport = resolver.transport(&config.fetch)?;
        tracing::info!(
            strategy = resolver.strategy().name(),
            transport = transport.name(),
            "cycle ready"
        );
        Ok(Self::new(config, transport))
    }

    /// Evaluate the freshness gates without acting.
    #[must_use]
    pub fn check(&self, now: DateTime<Local>) -> FreshnessDecision {
        self.monitor.evaluate(&self.paths, now)
    }

    /// Run one cycle. `force` bypasses the freshness gates.
    ///
    /// # Errors
    ///
    /// Returns the dedup stage's error when the snapshot or committed set is
    /// unusable, or the pending queue cannot be written.
    pub async fn run(&self, now: DateTime<Local>, force: bool) -> Result<CycleOutcome> {
        let decision = self.check(now);
        if !decision.should_refresh() && !force {
            tracing::debug!(%decision, "cycle skipped");
            return Ok(CycleOutcome::Skipped(decision));
        }
        tracing::info!(%decision, forced = force, "cycle started");

        let fetch = self.fetcher.refresh().await;
        let diff = self.dedup.run()?;
        let trigger = self.hand_off();

        let report = CycleReport {
            decision,
            forced: force,
            fetch,
            diff,
            trigger,
        };
        tracing::info!(
            fetched = report.fetch.is_ok(),
            pending = report.diff.pending,
            handed_off = report.handed_off(),
            "cycle finished"
        );
        Ok(CycleOutcome::Completed(report))
    }

    fn hand_off(&self) -> TriggerStatus {
        let Some(trigger) = &self.trigger else {
            tracing::debug!("downstream trigger disabled");
            return TriggerStatus::Disabled;
        };
        match trigger.fire() {
            Ok(receipt) => TriggerStatus::Started(receipt),
            Err(e) => {
                tracing::error!(error = %e, "downstream process not started");
                TriggerStatus::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransport {
        calls: Arc<AtomicUsize>,
        body: Option<&'static str>,
    }

    #[async_trait]
    impl ListingTransport for CountingTransport {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn url(&self) -> &str {
            "https://listing.test/api"
        }

        async fn fetch(&self) -> std::result::Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.body {
                Some(body) => Ok(body.as_bytes().to_vec()),
                None => Err(FetchError::Transport {
                    url: self.url().to_owned(),
                    reason: "connection refused".to_owned(),
                }),
            }
        }
    }

    fn config_in(dir: &std::path::Path) -> SelectConfig {
        let mut config = SelectConfig::default();
        config.paths = PathsConfig::in_dir(dir);
        config.trigger.enabled = false;
        config
    }

    fn cycle(config: &SelectConfig, body: Option<&'static str>) -> (Cycle, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let transport = CountingTransport {
            calls: Arc::clone(&calls),
            body,
        };
        (Cycle::new(config, Box::new(transport)), calls)
    }

    #[tokio::test]
    async fn first_run_fetches_and_queues_everything() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path());
        let (cycle, calls) = cycle(&config, Some(r#"[{"id":1},{"id":2}]"#));

        let outcome = cycle.run(Local::now(), false).await.expect("run");

        let CycleOutcome::Completed(report) = outcome else {
            panic!("expected a completed cycle");
        };
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(report.fetch.is_ok());
        assert_eq!(report.diff.pending, 2);
        assert!(matches!(report.trigger, TriggerStatus::Disabled));
    }

    #[tokio::test]
    async fn committed_today_skips_without_fetching() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path());
        std::fs::write(&config.paths.committed, "[]").expect("write");
        let committed_at = DateTime::<Local>::from(
            std::fs::metadata(&config.paths.committed)
                .expect("metadata")
                .modified()
                .expect("mtime"),
        );
        let (cycle, calls) = cycle(&config, Some("[]"));

        let outcome = cycle.run(committed_at, false).await.expect("run");

        assert!(matches!(outcome, CycleOutcome::Skipped(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!config.paths.pending.exists());
    }

    #[tokio::test]
    async fn force_bypasses_gates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path());
        std::fs::write(&config.paths.committed, r#"[{"id":1}]"#).expect("write");
        let (cycle, calls) = cycle(&config, Some(r#"[{"id":1},{"id":2}]"#));

        let outcome = cycle.run(Local::now(), true).await.expect("run");

        let CycleOutcome::Completed(report) = outcome else {
            panic!("expected a completed cycle");
        };
        assert!(report.forced);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.diff.pending, 1);
    }

    #[tokio::test]
    async fn fetch_failure_still_recomputes_from_cached_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path());
        std::fs::write(&config.paths.snapshot, r#"[{"id":1},{"id":2}]"#).expect("write");
        let (cycle, _) = cycle(&config, None);

        let outcome = cycle.run(Local::now(), true).await.expect("run");

        let CycleOutcome::Completed(report) = outcome else {
            panic!("expected a completed cycle");
        };
        assert!(report.fetch.is_err());
        assert_eq!(report.diff.pending, 2);
    }

    #[tokio::test]
    async fn fetch_failure_without_snapshot_aborts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path());
        let (cycle, _) = cycle(&config, None);

        let result = cycle.run(Local::now(), false).await;

        assert!(matches!(result, Err(crate::CycleError::CacheRead { .. })));
        assert!(!config.paths.pending.exists());
    }

    #[tokio::test]
    async fn trigger_failure_is_reported_after_queue_written() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = config_in(dir.path());
        config.trigger.enabled = true;
        config.trigger.program = dir.path().join("missing-program");
        config.trigger.working_dir = dir.path().to_path_buf();
        let (cycle, _) = cycle(&config, Some(r#"[{"id":1}]"#));

        let outcome = cycle.run(Local::now(), false).await.expect("run");

        let CycleOutcome::Completed(report) = outcome else {
            panic!("expected a completed cycle");
        };
        assert!(!report.handed_off());
        assert!(config.paths.pending.exists());
    }
}

//! Cron entry point for select-cron.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use chrono::Local;
use clap::{Parser, Subcommand};
use select_cron::credentials::KeyringSecretStore;
use select_cron::dedup::DedupEngine;
use select_cron::freshness::FreshnessMonitor;
use select_cron::{Cycle, CycleOutcome, SelectConfig, TriggerStatus};

/// Refresh the weekly programme listing and queue programmes to record.
#[derive(Parser)]
#[command(name = "select-cron", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Run one refresh cycle if the freshness gates allow it.
    Run {
        /// Ignore the freshness gates.
        #[arg(long)]
        force: bool,
    },

    /// Show the freshness gate decision without acting.
    Status,

    /// Recompute the pending queue from the files on disk.
    Diff,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(SelectConfig::default_config_path);
    let loaded = SelectConfig::load_or_default(&config_path);

    let logging = loaded
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();
    let _guard = select_cron::logging::init(&logging)?;

    let config = loaded.inspect_err(|e| {
        tracing::error!(
            config = %config_path.display(),
            error = %e,
            "cannot load configuration"
        );
    })?;

    match cli.command.unwrap_or(Command::Run { force: false }) {
        Command::Run { force } => run_cycle(&config, force).await,
        Command::Status => show_status(&config),
        Command::Diff => run_diff(&config),
    }
}

async fn run_cycle(config: &SelectConfig, force: bool) -> anyhow::Result<()> {
    let cycle = Cycle::from_config(config, Arc::new(KeyringSecretStore::new())).inspect_err(
        |e| tracing::error!(error = %e, "cannot start cycle"),
    )?;

    let outcome = cycle
        .run(Local::now(), force)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "cycle aborted"))?;

    if let CycleOutcome::Completed(report) = outcome {
        if let TriggerStatus::Failed(reason) = report.trigger {
            bail!("pending queue written but downstream process not started: {reason}");
        }
    }
    Ok(())
}

fn show_status(config: &SelectConfig) -> anyhow::Result<()> {
    let monitor = FreshnessMonitor::new(Duration::from_secs(config.freshness.stale_after_secs));
    let decision = monitor.evaluate(&config.paths, Local::now());

    println!("select-cron v{}", env!("CARGO_PKG_VERSION"));
    println!("  daily gate:     {} ({})", gate(decision.daily.is_open()), decision.daily);
    println!(
        "  staleness gate: {} ({})",
        gate(decision.staleness.is_open()),
        decision.staleness
    );
    println!(
        "  next run:       {}",
        if decision.should_refresh() { "refresh" } else { "skip" }
    );
    println!("  snapshot:       {}", config.paths.snapshot.display());
    println!("  committed:      {}", config.paths.committed.display());
    println!("  pending:        {}", config.paths.pending.display());
    Ok(())
}

fn gate(open: bool) -> &'static str {
    if open { "open" } else { "closed" }
}

fn run_diff(config: &SelectConfig) -> anyhow::Result<()> {
    let report = DedupEngine::new(&config.paths).run()?;
    println!(
        "{} fresh, {} committed, {} pending -> {}",
        report.fresh,
        report.committed,
        report.pending,
        config.paths.pending.display()
    );
    Ok(())
}

//! Tracing setup for the cron binary.
//!
//! Records go to a daily-rolling file under the configured log directory
//! (`select-cron.YYYY-MM-DD.log`, oldest files pruned past
//! `logging.max_files`) and to stderr, which cron mails to the user.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use crate::config::LoggingConfig;
use crate::error::{CycleError, Result};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "select_cron=info,reqwest=warn,hyper=warn";

/// Build the rolling file appender described by `config`.
///
/// # Errors
///
/// Returns [`CycleError::Io`] if the log directory cannot be created, or
/// [`CycleError::Config`] if the appender cannot be opened in it.
pub fn file_appender(config: &LoggingConfig) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(&config.dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&config.file_prefix)
        .filename_suffix("log")
        .max_log_files(config.max_files.max(1))
        .build(&config.dir)
        .map_err(|e| {
            CycleError::Config(format!(
                "cannot open log directory {}: {e}",
                config.dir.display()
            ))
        })
}

/// Install the global subscriber. Keep the returned guard alive until exit
/// so buffered records are flushed.
///
/// # Errors
///
/// Returns an error if the log directory cannot be prepared.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard> {
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender(config)?);

    tracing_subscriber::fmt()
        .with_writer(non_blocking.and(std::io::stderr))
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_ansi(false)
        .with_target(false)
        .init();

    Ok(guard)
}

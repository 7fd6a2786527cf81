//! Hand-off to the downstream recording process.
//!
//! [`DownstreamTrigger::fire`] starts the configured program detached from
//! this process and returns as soon as the spawn succeeds. It never waits on
//! the child and never observes its exit status; the only data shared is
//! the pending queue file, which is fully written before the spawn.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::config::TriggerConfig;
use crate::error::{CycleError, Result};

/// Proof that the downstream process was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerReceipt {
    /// OS process id of the spawned child.
    pub pid: u32,
}

/// Fire-and-forget launcher for the downstream process.
#[derive(Debug, Clone)]
pub struct DownstreamTrigger {
    program: PathBuf,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl DownstreamTrigger {
    /// Build a trigger from configuration.
    #[must_use]
    pub fn from_config(config: &TriggerConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            working_dir: config.working_dir.clone(),
        }
    }

    /// Spawn the downstream process and return immediately.
    ///
    /// The child runs in its own process group with stdio detached, so it
    /// outlives this process.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::Trigger`] if the process cannot be spawned.
    pub fn fire(&self) -> Result<TriggerReceipt> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let child = command.spawn().map_err(|e| {
            CycleError::Trigger(format!(
                "failed to spawn {} in {}: {e}",
                self.program.display(),
                self.working_dir.display()
            ))
        })?;

        let receipt = TriggerReceipt { pid: child.id() };
        tracing::info!(
            pid = receipt.pid,
            program = %self.program.display(),
            cwd = %self.working_dir.display(),
            "downstream process started"
        );
        // Dropping the handle neither waits on nor kills the child.
        drop(child);
        Ok(receipt)
    }
}

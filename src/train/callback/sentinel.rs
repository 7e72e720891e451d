//! Cooperative cancellation through a sentinel file
//!
//! The run creates `running_PID.txt` in its saving directory. Deleting the
//! file asks the run to stop: the next epoch skips its batches and the run
//! ends at that epoch's boundary.

use super::traits::{CallbackAction, CallbackContext, TrainerCallback};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the sentinel file inside the saving directory
pub const SENTINEL_FILE: &str = "running_PID.txt";

/// Source of a stop request, polled once per epoch
pub trait CancellationSignal {
    /// Whether the run should stop.
    fn is_cancelled(&self) -> bool;
}

/// Cancelled once the sentinel file is gone
#[derive(Clone, Debug)]
pub struct SentinelFile {
    path: PathBuf,
}

impl SentinelFile {
    /// Sentinel at `<dir>/running_PID.txt`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self { path: dir.as_ref().join(SENTINEL_FILE) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file unless one is already there.
    pub fn arm(&self) -> std::io::Result<()> {
        if self.path.is_file() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, format!("Launched with pid {}\n", std::process::id()))
    }

    /// Remove the file if present.
    pub fn disarm(&self) -> std::io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

impl CancellationSignal for SentinelFile {
    fn is_cancelled(&self) -> bool {
        !self.path.exists()
    }
}

/// Skips the epoch once the file is gone and removes it at train end
///
/// The orchestrator arms the file before the first epoch.
impl TrainerCallback for SentinelFile {
    fn on_epoch_begin(&mut self, ctx: &CallbackContext) -> CallbackAction {
        if self.is_cancelled() {
            tracing::warn!(
                epoch = ctx.epoch,
                path = %self.path.display(),
                "sentinel file removed, skipping epoch"
            );
            return CallbackAction::SkipEpoch;
        }
        CallbackAction::Continue
    }

    fn on_train_end(&mut self, _ctx: &CallbackContext) {
        if let Err(e) = self.disarm() {
            tracing::warn!(path = %self.path.display(), error = %e, "could not remove sentinel file");
        }
    }

    fn name(&self) -> &'static str {
        "SentinelFile"
    }
}

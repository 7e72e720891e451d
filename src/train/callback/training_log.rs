//! Plain-text per-step training log

use super::traits::{CallbackAction, CallbackContext, TrainerCallback};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File name of the log inside the saving directory
pub const TRAINING_LOG_FILE: &str = "training.txt";

const HEADER: &str = "epochs steps loss train_accuracy train_f1 time";

/// Appends `epoch step loss accuracy f1 elapsed` after every step
pub struct TrainingLogCallback {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl TrainingLogCallback {
    /// Log to `<dir>/training.txt`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self { path: dir.as_ref().join(TRAINING_LOG_FILE), writer: None }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&mut self) -> std::io::Result<()> {
        let fresh = !self.path.exists();
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = BufWriter::new(file);
        if fresh {
            writeln!(writer, "{HEADER}")?;
        }
        self.writer = Some(writer);
        Ok(())
    }
}

impl TrainerCallback for TrainingLogCallback {
    fn on_train_begin(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        if let Err(e) = self.open() {
            tracing::warn!(path = %self.path.display(), error = %e, "training log disabled");
        }
        CallbackAction::Continue
    }

    fn on_step_end(&mut self, ctx: &CallbackContext) {
        if let Some(writer) = &mut self.writer {
            let line = writeln!(
                writer,
                "{} {} {:.3} {:.3} {:.3} {:.3}",
                ctx.epoch, ctx.step, ctx.loss, ctx.accuracy, ctx.f1, ctx.elapsed_secs
            );
            if let Err(e) = line {
                tracing::warn!(error = %e, "training log write failed");
                self.writer = None;
            }
        }
    }

    fn on_epoch_end(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        if let Some(writer) = &mut self.writer {
            let _ = writer.flush();
        }
        CallbackAction::Continue
    }

    fn on_train_end(&mut self, _ctx: &CallbackContext) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }

    fn name(&self) -> &'static str {
        "TrainingLogCallback"
    }
}

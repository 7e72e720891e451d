//! Progress callback for logging training progress

use super::traits::{CallbackAction, CallbackContext, TrainerCallback};
use std::time::{Duration, Instant};

/// Logs batch progress at most once per interval
#[derive(Clone, Debug)]
pub struct ProgressCallback {
    interval: Duration,
    last_display: Option<Instant>,
}

impl ProgressCallback {
    /// Log at most once every `interval_secs` seconds.
    pub fn new(interval_secs: f64) -> Self {
        Self { interval: Duration::from_secs_f64(interval_secs.max(0.0)), last_display: None }
    }

    fn due(&mut self) -> bool {
        let now = Instant::now();
        match self.last_display {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last_display = Some(now);
                true
            }
        }
    }
}

impl Default for ProgressCallback {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl TrainerCallback for ProgressCallback {
    fn on_epoch_begin(&mut self, ctx: &CallbackContext) -> CallbackAction {
        tracing::info!(
            epoch = ctx.epoch,
            max_epochs = ctx.max_epochs,
            lr = ctx.lr,
            "epoch starting"
        );
        CallbackAction::Continue
    }

    fn on_step_end(&mut self, ctx: &CallbackContext) {
        if self.due() {
            tracing::info!(
                "e{:03}-i{:04} ({:3.0}%) => L={:.3} acc={:3.0}% f1={:3.0}%",
                ctx.epoch,
                ctx.step,
                100.0 * ctx.epoch_progress(),
                ctx.loss,
                100.0 * ctx.accuracy,
                100.0 * ctx.f1
            );
        }
    }

    fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        tracing::info!(
            epoch = ctx.epoch,
            steps = ctx.step,
            elapsed_secs = ctx.elapsed_secs,
            "epoch finished"
        );
        CallbackAction::Continue
    }

    fn on_validation(&mut self, ctx: &CallbackContext) {
        if let Some(score) = ctx.val_score {
            tracing::info!(
                "validation mean IoU = {:.1}% (best {:.1}%)",
                100.0 * score,
                100.0 * ctx.best_val_score
            );
        }
    }

    fn name(&self) -> &'static str {
        "ProgressCallback"
    }
}

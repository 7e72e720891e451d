//! Hook points of the epoch loop
//!
//! The orchestrator fills a [`CallbackContext`] at every event and hands it
//! to each registered [`TrainerCallback`] in registration order.

/// Snapshot of the run handed to callbacks
#[derive(Clone, Debug, Default)]
pub struct CallbackContext {
    /// Epoch being processed; at epoch end, the epoch that just finished
    pub epoch: usize,
    pub max_epochs: usize,
    /// Batches processed in the current epoch
    pub step: usize,
    /// Batches per epoch reported by the loader
    pub steps_per_epoch: usize,
    pub global_step: usize,
    /// Loss of the last batch, or the epoch mean at epoch end
    pub loss: f32,
    /// Point accuracy of the last batch, or of the merged epoch votes
    pub accuracy: f64,
    /// F1 of the last batch, or of the merged epoch votes
    pub f1: f64,
    /// Base learning rate
    pub lr: f32,
    /// Validation mIoU of the epoch, when validation ran
    pub val_score: Option<f64>,
    /// Best validation mIoU so far
    pub best_val_score: f64,
    pub elapsed_secs: f64,
}

impl CallbackContext {
    /// Fraction of the current epoch's batches already processed.
    pub fn epoch_progress(&self) -> f64 {
        if self.steps_per_epoch == 0 {
            0.0
        } else {
            (self.step as f64 / self.steps_per_epoch as f64).min(1.0)
        }
    }

    /// Whether this epoch is the last one the run plans.
    pub fn is_last_epoch(&self) -> bool {
        self.epoch + 1 >= self.max_epochs
    }
}

/// What a callback asks of the epoch loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    Continue,
    /// End the run after the current boundary
    Stop,
    /// Skip the batches of the epoch about to start; the run then ends as cancelled
    SkipEpoch,
}

/// Observer of the epoch loop
///
/// Every hook defaults to a no-op. Train-begin and epoch hooks may steer
/// the run; step and validation hooks only observe.
pub trait TrainerCallback {
    fn on_train_begin(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Fires once, even when the run fails or is cancelled.
    fn on_train_end(&mut self, _ctx: &CallbackContext) {}

    /// Fires before the first batch of each epoch.
    fn on_epoch_begin(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Fires after training scores, validation and checkpoints of the epoch.
    fn on_epoch_end(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    fn on_step_end(&mut self, _ctx: &CallbackContext) {}

    /// Fires after a validation pass, with `val_score` set.
    fn on_validation(&mut self, _ctx: &CallbackContext) {}

    fn name(&self) -> &'static str {
        "TrainerCallback"
    }
}

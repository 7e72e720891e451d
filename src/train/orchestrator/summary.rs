//! Training summary

use crate::eval::SegmentationMetrics;
use crate::train::scheduler::StopReason;
use std::path::PathBuf;

/// Outcome of [`TrainingOrchestrator::train`](super::TrainingOrchestrator::train)
#[derive(Debug, Clone)]
pub struct TrainSummary {
    /// Completed epochs, counting those of a resumed run
    pub completed_epochs: usize,
    /// Epochs processed by this call
    pub epochs_run: usize,
    pub stop_reason: Option<StopReason>,
    /// Optimizer steps taken by this call
    pub global_step: usize,
    pub best_train_score: f64,
    pub best_val_score: f64,
    /// Scores of the merged training predictions of the last epoch
    pub last_train: Option<SegmentationMetrics>,
    /// Scores of the last validation pass
    pub last_validation: Option<SegmentationMetrics>,
    pub saving_path: Option<PathBuf>,
    pub elapsed_secs: f64,
}

impl TrainSummary {
    pub fn was_cancelled(&self) -> bool {
        self.stop_reason == Some(StopReason::Cancelled)
    }
}

//! On-disk checkpoint record

use crate::model::StateDict;
use crate::optim::OptimizerState;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Weights that older checkpoints may lack.
///
/// When absent from a stored record they are filled with the live model's
/// current value instead of failing the restore.
pub const LEGACY_DEFAULTABLE_KEYS: &[&str] = &["criterion.weight"];

/// Keys every record must carry.
pub const REQUIRED_KEYS: &[&str] = &["epoch", "model_state", "optimizer_state"];

/// Progress counters carried alongside the weights
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    /// Number of completed epochs
    pub epoch: usize,
    /// Batch counter inside the current epoch
    pub step: usize,
    /// Best mIoU of the merged training predictions
    pub best_train_score: f64,
    /// Best validation mIoU
    pub best_val_score: f64,
}

/// Everything needed to resume or finetune a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// Completed epochs when the record was written
    pub epoch: usize,
    pub model_state: StateDict,
    pub optimizer_state: OptimizerState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saving_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_state: Option<TrainingState>,
}

impl CheckpointRecord {
    pub fn new(epoch: usize, model_state: StateDict, optimizer_state: OptimizerState) -> Self {
        Self { epoch, model_state, optimizer_state, saving_path: None, training_state: None }
    }

    pub fn with_saving_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.saving_path = Some(path.into());
        self
    }

    pub fn with_training_state(mut self, state: TrainingState) -> Self {
        self.training_state = Some(state);
        self
    }
}

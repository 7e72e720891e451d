//! YAML schema definitions for declarative training configuration
//!
//! Every section is optional; missing values take the defaults of the
//! reference training setup.

use crate::error::Result;
use crate::eval::segmentation::ConfusionMode;
use crate::eval::DEFAULT_SMOOTHING;
use crate::labels::ClassLabelSpace;
use crate::optim::{default_decay_factor, LrDecayTable};
use crate::train::validation::TaskKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Format of generated run directories
pub const SAVING_PATH_FORMAT: &str = "results/Log_%Y-%m-%d_%H-%M-%S";

/// Complete training specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainSpec {
    /// Task name; only `cloud_segmentation` has a validation strategy
    #[serde(default = "default_task")]
    pub task: String,

    #[serde(default)]
    pub labels: LabelSpec,

    #[serde(default)]
    pub training: TrainingSpec,

    #[serde(default)]
    pub optimizer: OptimizerSpec,

    #[serde(default)]
    pub lr_decay: LrDecaySpec,

    #[serde(default)]
    pub validation: ValidationSpec,
}

fn default_task() -> String {
    "cloud_segmentation".to_string()
}

impl Default for TrainSpec {
    fn default() -> Self {
        Self {
            task: default_task(),
            labels: LabelSpec::default(),
            training: TrainingSpec::default(),
            optimizer: OptimizerSpec::default(),
            lr_decay: LrDecaySpec::default(),
            validation: ValidationSpec::default(),
        }
    }
}

impl TrainSpec {
    /// Parse the task name.
    pub fn task_kind(&self) -> Result<TaskKind> {
        self.task.parse()
    }

    /// Decay table over the configured epochs.
    pub fn decay_table(&self) -> LrDecayTable {
        self.lr_decay.to_table(self.training.max_epoch)
    }

    /// Write the resolved configuration as `parameters.yaml` under `dir`.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join("parameters.yaml");
        std::fs::write(&path, serde_yaml::to_string(self)?)?;
        Ok(path)
    }
}

/// Label values of the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSpec {
    /// Every label value, strictly ascending
    pub values: Vec<i32>,
    /// Values excluded from the model and from scoring
    #[serde(default)]
    pub ignored: Vec<i32>,
}

impl Default for LabelSpec {
    fn default() -> Self {
        Self { values: vec![0, 1], ignored: Vec::new() }
    }
}

impl LabelSpec {
    pub fn to_space(&self) -> Result<ClassLabelSpace> {
        ClassLabelSpace::new(self.values.clone(), self.ignored.clone())
    }
}

/// How gradients are clipped before each step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipMode {
    /// Clamp each element to `±grad_clip`
    #[default]
    Value,
    /// Rescale so the global norm is at most `grad_clip`
    Norm,
}

/// Epoch loop and persistence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSpec {
    pub max_epoch: usize,
    /// Snapshot every N completed epochs
    pub checkpoint_gap: usize,
    /// Clipping threshold; 0 disables clipping
    pub grad_clip: f32,
    pub clip_mode: ClipMode,
    /// Validate every N completed epochs
    pub validate_every: usize,
    /// Persist checkpoints, logs and predictions
    pub saving: bool,
    pub saving_path: Option<PathBuf>,
    /// Minimum seconds between two progress lines
    pub log_interval_secs: f64,
}

impl Default for TrainingSpec {
    fn default() -> Self {
        Self {
            max_epoch: 100,
            checkpoint_gap: 10,
            grad_clip: 100.0,
            clip_mode: ClipMode::Value,
            validate_every: 1,
            saving: true,
            saving_path: None,
            log_interval_secs: 1.0,
        }
    }
}

impl TrainingSpec {
    /// Run directory, generating a timestamped one when saving without a path.
    pub fn resolve_saving_path(&mut self) -> Option<&Path> {
        if self.saving && self.saving_path.is_none() {
            let generated = chrono::Utc::now().format(SAVING_PATH_FORMAT).to_string();
            self.saving_path = Some(PathBuf::from(generated));
        }
        if self.saving {
            self.saving_path.as_deref()
        } else {
            None
        }
    }
}

/// SGD hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSpec {
    pub learning_rate: f32,
    pub momentum: f32,
    pub weight_decay: f32,
    /// Multiplier of the learning rate for kernel offset parameters
    pub deform_lr_factor: f32,
}

impl Default for OptimizerSpec {
    fn default() -> Self {
        Self { learning_rate: 1e-2, momentum: 0.98, weight_decay: 1e-3, deform_lr_factor: 0.1 }
    }
}

/// Learning-rate decay schedule
///
/// ```yaml
/// lr_decay: none
/// lr_decay: !every_epoch 0.98
/// lr_decay: !table { 50: 0.5, 80: 0.1 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LrDecaySpec {
    #[serde(rename = "none")]
    Disabled,
    /// Same factor after every epoch from epoch 1
    EveryEpoch(f32),
    /// Factor keyed by finished epoch
    Table(BTreeMap<usize, f32>),
}

impl Default for LrDecaySpec {
    fn default() -> Self {
        Self::EveryEpoch(default_decay_factor())
    }
}

impl LrDecaySpec {
    pub fn to_table(&self, max_epoch: usize) -> LrDecayTable {
        match self {
            Self::Disabled => LrDecayTable::none(),
            Self::EveryEpoch(factor) => LrDecayTable::every_epoch(max_epoch, *factor),
            Self::Table(map) => LrDecayTable::from_map(map.clone()),
        }
    }
}

/// Validation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSpec {
    /// EMA coefficient of the probability buffers
    pub smoothing: f32,
    pub confusion: ConfusionMode,
    /// Write predicted clouds on snapshot epochs and new best scores
    pub save_predictions: bool,
}

impl Default for ValidationSpec {
    fn default() -> Self {
        Self { smoothing: DEFAULT_SMOOTHING, confusion: ConfusionMode::Global, save_predictions: true }
    }
}

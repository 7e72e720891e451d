//! Declarative YAML configuration
//!
//! A single [`TrainSpec`] document describes the label space, the epoch
//! loop, the optimizer, the decay schedule and validation.
//!
//! ```yaml
//! task: cloud_segmentation
//! labels:
//!   values: [0, 1]
//! training:
//!   max_epoch: 100
//!   checkpoint_gap: 10
//! optimizer:
//!   learning_rate: 0.01
//! lr_decay: !every_epoch 0.985
//! ```

mod loader;
mod schema;
pub mod validate;

pub use loader::{load_spec, parse_spec};
pub use schema::{
    ClipMode, LabelSpec, LrDecaySpec, OptimizerSpec, TrainSpec, TrainingSpec, ValidationSpec,
    SAVING_PATH_FORMAT,
};
pub use validate::{validate_spec, ValidationError};

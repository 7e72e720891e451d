//! Training loop for point-cloud segmentation
//!
//! This module provides:
//! - [`Batch`]: stacked sub-clouds produced by the loader
//! - [`EpochScheduler`]: epoch counter and lifecycle state machine
//! - [`callback`]: epoch and step hooks (progress, training log, cancellation)
//! - [`validation`]: per-task validation strategies
//! - [`TrainingOrchestrator`]: the epoch loop tying everything together
//!
//! # Example
//!
//! ```no_run
//! use pointseg::checkpoint::EntryMode;
//! use pointseg::config::TrainSpec;
//! use pointseg::data::{InMemoryLoader, InMemoryValidationSource};
//! use pointseg::model::SegmentationModel;
//! use pointseg::train::TrainingOrchestrator;
//!
//! # fn model() -> Box<dyn SegmentationModel> { todo!() }
//! let mut spec = TrainSpec::default();
//! spec.training.max_epoch = 10;
//! spec.training.saving = false;
//!
//! let mut orchestrator = TrainingOrchestrator::new(model(), spec, &EntryMode::Fresh)?;
//! let summary = orchestrator.train(
//!     &mut InMemoryLoader::new(Vec::new()),
//!     &mut InMemoryValidationSource::new(Vec::new(), Vec::new()),
//! )?;
//! assert_eq!(summary.completed_epochs, 10);
//! # Ok::<(), pointseg::Error>(())
//! ```

mod batch;
pub mod callback;
pub mod orchestrator;
pub mod scheduler;
pub mod validation;

pub use batch::{Batch, SubCloud};
pub use callback::{
    CallbackAction, CallbackContext, CallbackManager, ProgressCallback, SentinelFile,
    TrainerCallback, TrainingLogCallback,
};
pub use orchestrator::{TrainSummary, TrainingOrchestrator};
pub use scheduler::{EpochBoundary, EpochScheduler, SchedulerState, StopReason};
pub use validation::{TaskKind, ValidationReport, ValidationStrategy};

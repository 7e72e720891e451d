//! Training orchestration
//!
//! [`TrainingOrchestrator`] composes the model, the role-grouped optimizer,
//! the epoch scheduler, the validation aggregator, a metrics sink and the
//! checkpoint store, and runs the epoch loop over external loaders.

mod core;
mod epoch;
mod summary;

pub use core::TrainingOrchestrator;
pub use summary::TrainSummary;

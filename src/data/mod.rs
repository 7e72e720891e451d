//! Interfaces to the external point-cloud loader
//!
//! The sampling loader (grid subsampling, neighbour search, potentials) lives
//! outside this crate. The orchestrator only sees:
//! - [`BatchLoader`] - yields stacked sub-cloud batches for one pass
//! - [`ValidationSource`] - a loader that also describes the full validation clouds
//!
//! In-memory implementations are provided for small runs and tests.

mod cloud;
mod memory;

pub use cloud::{CloudInfo, EvaluationSet};
pub use memory::{InMemoryLoader, InMemoryValidationSource, ValidationCloud};

use crate::error::Result;
use crate::train::Batch;

/// Source of batches for one pass over a split
pub trait BatchLoader {
    /// Batches of the next pass, in arrival order.
    fn batches(&mut self) -> Box<dyn Iterator<Item = Result<Batch>> + '_>;

    /// Number of batches per pass, used for progress reporting only.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Validation loader that also exposes the full clouds it samples from
pub trait ValidationSource: BatchLoader {
    /// Validation clouds, indexed by cloud id.
    fn clouds(&self) -> &[CloudInfo];

    /// Ground-truth labels of every point of a validation cloud.
    fn validation_labels(&self, cloud_id: usize) -> Option<&[i32]>;

    /// Full-resolution evaluation points of a cloud with their projection index.
    fn evaluation_set(&self, cloud_id: usize) -> Option<&EvaluationSet>;
}

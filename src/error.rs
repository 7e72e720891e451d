//! Error types for training and validation
//!
//! Every fallible operation in the crate returns [`Result`]. Ratios with a zero
//! denominator are not errors: the metrics engine reports them as 0.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pointseg operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the training and validation core.
#[derive(Debug, Error)]
pub enum Error {
    /// Validation was requested for a task with no implemented strategy.
    #[error("Unsupported task '{0}' (supported: cloud_segmentation)")]
    UnsupportedTask(String),

    /// Checkpoint is unreadable or lacks required keys.
    #[error("Corrupt checkpoint {path}: {reason}")]
    CorruptCheckpoint { path: PathBuf, reason: String },

    /// Width or length disagreement between two collaborators.
    #[error("Shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch { context: String, expected: usize, actual: usize },

    /// Cloud id not registered with the aggregator.
    #[error("Unknown cloud id {0}")]
    UnknownCloud(usize),

    /// Point index outside its cloud.
    #[error("Point index {index} out of range for cloud {cloud} ({point_count} points)")]
    IndexOutOfRange { cloud: usize, index: usize, point_count: usize },

    /// Label value array violates the ordering contract.
    #[error("Label ordering contract violated: {0}")]
    LabelOrder(String),

    /// Malformed batch produced by a loader.
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    /// Epoch scheduler was driven through an illegal transition.
    #[error("Invalid scheduler transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure reported by the model collaborator.
    #[error("Model error: {0}")]
    Model(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Build a [`Error::CorruptCheckpoint`] for `path`.
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptCheckpoint { path: path.into(), reason: reason.into() }
    }

    /// Build a [`Error::ShapeMismatch`].
    pub fn shape(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch { context: context.into(), expected, actual }
    }

    /// Whether the run can recover by choosing a different input.
    ///
    /// A corrupt checkpoint is recoverable by falling back to an older snapshot.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::CorruptCheckpoint { .. } | Self::Config(_))
    }
}

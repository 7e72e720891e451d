//! Validation error types
//!
//! Defines all validation error variants for training specifications.

/// Validation error type
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Invalid learning rate: {0} (must be > 0.0 and <= 1.0)")]
    InvalidLearningRate(f32),

    #[error("Invalid momentum: {0} (must be in [0.0, 1.0))")]
    InvalidMomentum(f32),

    #[error("Invalid weight decay: {0} (must be >= 0.0)")]
    InvalidWeightDecay(f32),

    #[error("Invalid deformable learning rate factor: {0} (must be > 0.0)")]
    InvalidDeformFactor(f32),

    #[error("Invalid epochs: {0} (must be > 0)")]
    InvalidEpochs(usize),

    #[error("Invalid gradient clip value: {0} (must be >= 0.0, 0 disables)")]
    InvalidGradClip(f32),

    #[error("Invalid smoothing: {0} (must be in [0.0, 1.0))")]
    InvalidSmoothing(f32),

    #[error("Invalid decay factor {factor} at epoch {epoch} (must be > 0.0)")]
    InvalidDecayFactor { epoch: usize, factor: f32 },

    #[error("Invalid log interval: {0} (must be >= 0.0)")]
    InvalidLogInterval(f64),

    #[error("Invalid labels: {0}")]
    InvalidLabels(String),
}

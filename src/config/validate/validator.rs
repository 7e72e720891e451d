//! Configuration validation logic
//!
//! Validates training specifications for correctness before execution.

use super::error::ValidationError;
use crate::config::schema::{LrDecaySpec, TrainSpec};

/// Validate a training specification
///
/// Checks:
/// - Numeric values are in valid ranges
/// - Decay factors are positive
/// - Label values are strictly ascending and ignored values are known
///
/// The task name is checked separately by [`TrainSpec::task_kind`].
pub fn validate_spec(spec: &TrainSpec) -> Result<(), ValidationError> {
    let opt = &spec.optimizer;
    if opt.learning_rate <= 0.0 || opt.learning_rate > 1.0 {
        return Err(ValidationError::InvalidLearningRate(opt.learning_rate));
    }
    if !(0.0..1.0).contains(&opt.momentum) {
        return Err(ValidationError::InvalidMomentum(opt.momentum));
    }
    if opt.weight_decay < 0.0 {
        return Err(ValidationError::InvalidWeightDecay(opt.weight_decay));
    }
    if opt.deform_lr_factor <= 0.0 {
        return Err(ValidationError::InvalidDeformFactor(opt.deform_lr_factor));
    }

    let training = &spec.training;
    if training.max_epoch == 0 {
        return Err(ValidationError::InvalidEpochs(training.max_epoch));
    }
    if training.grad_clip < 0.0 {
        return Err(ValidationError::InvalidGradClip(training.grad_clip));
    }
    if training.log_interval_secs < 0.0 {
        return Err(ValidationError::InvalidLogInterval(training.log_interval_secs));
    }

    if !(0.0..1.0).contains(&spec.validation.smoothing) {
        return Err(ValidationError::InvalidSmoothing(spec.validation.smoothing));
    }

    match &spec.lr_decay {
        LrDecaySpec::Disabled => {}
        LrDecaySpec::EveryEpoch(factor) => {
            if *factor <= 0.0 {
                return Err(ValidationError::InvalidDecayFactor { epoch: 1, factor: *factor });
            }
        }
        LrDecaySpec::Table(map) => {
            if let Some((&epoch, &factor)) = map.iter().find(|(_, &f)| f <= 0.0) {
                return Err(ValidationError::InvalidDecayFactor { epoch, factor });
            }
        }
    }

    spec.labels.to_space().map_err(|e| ValidationError::InvalidLabels(e.to_string()))?;

    Ok(())
}

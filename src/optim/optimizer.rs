//! Optimizer trait

use crate::model::Parameter;

/// Trait for optimization algorithms
pub trait Optimizer {
    /// Perform a single optimization step
    fn step(&mut self, params: &mut [Parameter]);

    /// Zero out all gradients
    fn zero_grad(&mut self, params: &mut [Parameter]) {
        for param in params {
            param.zero_grad();
        }
    }

    /// Get base learning rate
    fn lr(&self) -> f32;

    /// Set base learning rate
    fn set_lr(&mut self, lr: f32);
}

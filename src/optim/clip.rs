//! Gradient clipping utilities

use crate::model::Parameter;

/// Clip every gradient element to `[-clip_value, clip_value]`
///
/// Returns the number of elements that were clipped.
pub fn clip_grad_value(params: &mut [Parameter], clip_value: f32) -> usize {
    let mut clipped = 0;
    for param in params.iter_mut() {
        for g in param.grad.iter_mut() {
            if g.abs() > clip_value {
                *g = g.clamp(-clip_value, clip_value);
                clipped += 1;
            }
        }
    }
    clipped
}

/// Clip gradients by global norm
///
/// Computes the global norm of all gradients and scales them down if the norm
/// exceeds max_norm, preserving relative magnitudes across parameters.
///
/// Returns the global norm before clipping.
pub fn clip_grad_norm(params: &mut [Parameter], max_norm: f32) -> f32 {
    let total_norm_sq: f32 = params.iter().map(|p| p.grad.iter().map(|&g| g * g).sum::<f32>()).sum();
    let global_norm = total_norm_sq.sqrt();

    if global_norm > max_norm {
        let clip_coef = max_norm / global_norm;
        for param in params.iter_mut() {
            param.grad *= clip_coef;
        }
    }

    global_norm
}

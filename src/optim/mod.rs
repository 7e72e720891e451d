//! Optimizers for training the segmentation network
//!
//! - [`SGD`] - momentum SGD with weight decay and named parameter groups
//! - [`ParameterGroupOptimizer`] - SGD split into standard and offset groups
//! - [`LrDecayTable`] - per-epoch learning rate decay
//! - [`clip_grad_value`] / [`clip_grad_norm`] - gradient clipping

mod clip;
mod decay;
mod groups;
mod optimizer;
mod sgd;

pub use clip::{clip_grad_norm, clip_grad_value};
pub use decay::{default_decay_factor, LrDecayTable};
pub use groups::{ParameterGroupOptimizer, OFFSET_GROUP, STANDARD_GROUP};
pub use optimizer::Optimizer;
pub use sgd::{OptimizerState, ParamGroup, SGD};

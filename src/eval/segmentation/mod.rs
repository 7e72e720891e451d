//! Segmentation metrics for point-cloud evaluation
//!
//! Provides:
//! - Confusion matrix over label values with ignored-class removal
//! - Rebalancing to true class proportions
//! - Binary counts and category rates
//! - Per-class and mean IoU, F1, accuracy
//! - Strict best-score tracking

mod best;
mod binary;
mod confusion;
mod metrics;

#[cfg(test)]
mod tests;

pub use best::{is_new_best, BestScore};
pub use binary::{BinaryConfusion, CategoryRates};
pub use confusion::{ConfusionMatrix, REBALANCE_EPSILON};
pub use metrics::{raw_accuracy, ConfusionMode, SegmentationMetrics};

//! Evaluation of segmentation predictions
//!
//! ## Architecture
//!
//! - `aggregator`: smoothed per-point probabilities over full validation clouds
//! - `segmentation`: confusion matrix, IoU, F1, accuracy and best-score tracking
//! - `votes`: majority-vote merge of overlapping training predictions

pub mod aggregator;
pub mod segmentation;
pub mod votes;

pub use aggregator::{ValidationProbabilityAggregator, DEFAULT_SMOOTHING};
pub use segmentation::{
    is_new_best, BestScore, BinaryConfusion, CategoryRates, ConfusionMatrix, ConfusionMode,
    SegmentationMetrics,
};
pub use votes::VoteAccumulator;

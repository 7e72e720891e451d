//! # pointseg
//!
//! Streaming validation aggregation and training orchestration for
//! point-cloud semantic segmentation.
//!
//! Training runs on small sub-clouds sampled from large scenes while
//! validation is judged on whole clouds. The crate provides:
//!
//! - `labels`: label value space with ignored classes
//! - `data`: batch and loader interfaces
//! - `model`: interface to the external network
//! - `optim`: role-grouped SGD, gradient clipping, decay tables
//! - `checkpoint`: atomic checkpoint records and entry modes
//! - `eval`: probability aggregation, confusion matrices, IoU and F1
//! - `monitor`: metric records and sinks
//! - `train`: epoch scheduler, callbacks, validation and the orchestrator
//! - `config`: declarative YAML configuration

pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod eval;
pub mod labels;
pub mod model;
pub mod monitor;
pub mod optim;
pub mod train;

pub use error::{Error, Result};

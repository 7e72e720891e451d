//! Validation strategies
//!
//! Each task kind has exactly one strategy. The set is closed: adding a task
//! means adding a [`TaskKind`] variant and the matching [`ValidationStrategy`]
//! arm.

mod cloud;
mod writer;

pub use cloud::{IOU_LOG_FILE, PREDICTION_DIR_PREFIX};
pub use writer::{AsciiCloudWriter, PredictionWriter};

use crate::data::ValidationSource;
use crate::error::{Error, Result};
use crate::eval::{BestScore, ConfusionMode, SegmentationMetrics, ValidationProbabilityAggregator};
use crate::labels::ClassLabelSpace;
use crate::model::SegmentationModel;
use crate::monitor::MetricsSink;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Kind of learning task driven by the orchestrator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Per-point labelling of whole scenes
    CloudSegmentation,
}

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::CloudSegmentation => "cloud_segmentation",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaskKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cloud_segmentation" => Ok(TaskKind::CloudSegmentation),
            other => Err(Error::UnsupportedTask(other.to_string())),
        }
    }
}

/// Everything a validation pass reads or updates
pub struct ValidationContext<'a> {
    pub aggregator: &'a mut ValidationProbabilityAggregator,
    pub space: &'a ClassLabelSpace,
    pub sink: &'a mut dyn MetricsSink,
    /// Best validation mIoU so far; updated in place
    pub best: &'a mut BestScore,
    pub mode: ConfusionMode,
    /// Completed epochs, used to name prediction directories
    pub completed: usize,
    /// Step reported to the metrics sink
    pub global_step: usize,
    /// Whether this epoch writes a snapshot
    pub snapshot: bool,
    /// Run directory; nothing is written when `None`
    pub saving_path: Option<&'a Path>,
    pub writer: Option<&'a dyn PredictionWriter>,
}

/// Outcome of one validation pass
#[derive(Clone, Debug, Default)]
pub struct ValidationReport {
    /// Scores of the pass, `None` when validation was skipped
    pub metrics: Option<SegmentationMetrics>,
    pub is_new_best: bool,
    pub best_score: f64,
    /// Predicted cloud files written during the pass
    pub prediction_files: Vec<PathBuf>,
}

impl ValidationReport {
    /// Report of a pass that had nothing to validate.
    pub fn skipped(best_score: f64) -> Self {
        Self { best_score, ..Self::default() }
    }

    pub fn is_skipped(&self) -> bool {
        self.metrics.is_none()
    }

    pub fn mean_iou(&self) -> Option<f64> {
        self.metrics.as_ref().map(|m| m.mean_iou)
    }
}

/// Validation procedure selected from the task kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationStrategy {
    CloudSegmentation,
}

impl ValidationStrategy {
    pub fn from_task(task: TaskKind) -> Self {
        match task {
            TaskKind::CloudSegmentation => ValidationStrategy::CloudSegmentation,
        }
    }

    /// Run one validation pass over `source`.
    ///
    /// The model is switched to evaluation mode for the pass and back to
    /// training mode afterwards.
    pub fn run<M, V>(
        &self,
        model: &mut M,
        source: &mut V,
        ctx: &mut ValidationContext<'_>,
    ) -> Result<ValidationReport>
    where
        M: SegmentationModel + ?Sized,
        V: ValidationSource + ?Sized,
    {
        match self {
            ValidationStrategy::CloudSegmentation => cloud::validate(model, source, ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_kind_parse() {
        assert_eq!("cloud_segmentation".parse::<TaskKind>().unwrap(), TaskKind::CloudSegmentation);
        assert_eq!(TaskKind::CloudSegmentation.to_string(), "cloud_segmentation");
    }

    #[test]
    fn test_unknown_task_is_unsupported() {
        let err = "slam".parse::<TaskKind>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedTask(ref t) if t == "slam"));
    }

    #[test]
    fn test_strategy_from_task() {
        assert_eq!(
            ValidationStrategy::from_task(TaskKind::CloudSegmentation),
            ValidationStrategy::CloudSegmentation
        );
    }

    #[test]
    fn test_skipped_report() {
        let report = ValidationReport::skipped(0.4);
        assert!(report.is_skipped());
        assert!(!report.is_new_best);
        assert_eq!(report.best_score, 0.4);
        assert!(report.mean_iou().is_none());
    }
}

//! Segmentation scores derived from a confusion matrix

use super::binary::{BinaryConfusion, CategoryRates};
use super::confusion::{ratio, ConfusionMatrix};
use crate::error::{Error, Result};
use crate::labels::ClassLabelSpace;
use serde::{Deserialize, Serialize};

/// How validation confusions are built
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfusionMode {
    /// One confusion over every stacked prediction, no rebalancing
    #[default]
    Global,
    /// Per-sub-cloud confusions summed and rescaled to the true class
    /// proportions of the validation clouds
    Balanced,
}

/// Scores of one evaluation pass
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentationMetrics {
    /// Confusion over the model classes (ignored labels removed)
    pub confusion: ConfusionMatrix,
    /// Two-class split, when the model has exactly two classes
    pub binary: Option<BinaryConfusion>,
    /// IoU per model class
    pub ious: Vec<f64>,
    pub mean_iou: f64,
    /// Positive-class F1 for two classes, macro F1 otherwise
    pub f1: f64,
    /// Fraction of points whose predicted label equals the true label
    pub accuracy: f64,
}

impl SegmentationMetrics {
    /// Score stacked labels with a single confusion.
    pub fn global(truth: &[i32], pred: &[i32], space: &ClassLabelSpace) -> Result<Self> {
        let mut cm = ConfusionMatrix::with_labels(truth, pred, space.label_values())?;
        cm.remove_ignored(space.ignored());
        Ok(Self::from_confusion(cm, raw_accuracy(truth, pred)))
    }

    /// Score per-sub-cloud label pairs, rebalanced to `proportions`.
    ///
    /// `proportions` holds one entry per model class, in channel order.
    pub fn balanced<'a, I>(parts: I, space: &ClassLabelSpace, proportions: &[f64]) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a [i32], &'a [i32])>,
    {
        let mut total = ConfusionMatrix::new(space.label_values().to_vec());
        let (mut matches, mut count) = (0usize, 0usize);
        for (truth, pred) in parts {
            total.add(&ConfusionMatrix::with_labels(truth, pred, space.label_values())?)?;
            matches += truth.iter().zip(pred).filter(|(t, p)| t == p).count();
            count += truth.len();
        }
        total.remove_ignored(space.ignored());
        total.rebalance(proportions)?;
        Ok(Self::from_confusion(total, ratio(matches as f64, count as f64)))
    }

    /// Score with the strategy selected by `mode`.
    pub fn evaluate(
        mode: ConfusionMode,
        parts: &[(Vec<i32>, Vec<i32>)],
        space: &ClassLabelSpace,
        proportions: &[f64],
    ) -> Result<Self> {
        match mode {
            ConfusionMode::Global => {
                let truth: Vec<i32> = parts.iter().flat_map(|(t, _)| t.iter().copied()).collect();
                let pred: Vec<i32> = parts.iter().flat_map(|(_, p)| p.iter().copied()).collect();
                Self::global(&truth, &pred, space)
            }
            ConfusionMode::Balanced => {
                if proportions.len() != space.num_model_classes() {
                    return Err(Error::shape(
                        "validation proportions",
                        space.num_model_classes(),
                        proportions.len(),
                    ));
                }
                Self::balanced(
                    parts.iter().map(|(t, p)| (t.as_slice(), p.as_slice())),
                    space,
                    proportions,
                )
            }
        }
    }

    /// Derive every score from a confusion over the model classes.
    pub fn from_confusion(confusion: ConfusionMatrix, accuracy: f64) -> Self {
        let binary = BinaryConfusion::from_matrix(&confusion);
        let f1 = binary.map_or_else(|| confusion.macro_f1(), |b| b.f1());
        Self {
            ious: confusion.ious(),
            mean_iou: confusion.mean_iou(),
            binary,
            f1,
            accuracy,
            confusion,
        }
    }

    pub fn rates(&self) -> Option<CategoryRates> {
        self.binary.map(|b| b.rates())
    }
}

/// Share of equal pairs, 0 for empty input
pub fn raw_accuracy(truth: &[i32], pred: &[i32]) -> f64 {
    let matches = truth.iter().zip(pred).filter(|(t, p)| t == p).count();
    ratio(matches as f64, truth.len() as f64)
}

//! Confusion matrix over label values

use crate::error::{Error, Result};
use ndarray::{Array2, Axis};
use std::fmt;

/// Guard added to row sums when rebalancing
pub const REBALANCE_EPSILON: f64 = 1e-6;

/// Confusion matrix over an ordered list of label values
///
/// Element `[i][j]` counts points whose true label is `labels[i]` and whose
/// predicted label is `labels[j]`. Counts are stored as `f64` so a matrix
/// can be rescaled to true class proportions.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfusionMatrix {
    matrix: Array2<f64>,
    labels: Vec<i32>,
}

impl ConfusionMatrix {
    /// Empty matrix over `labels`.
    pub fn new(labels: Vec<i32>) -> Self {
        let n = labels.len();
        Self { matrix: Array2::zeros((n, n)), labels }
    }

    /// Matrix over the sorted union of the values seen in `truth` and `pred`.
    pub fn from_labels(truth: &[i32], pred: &[i32]) -> Result<Self> {
        let mut labels: Vec<i32> = truth.iter().chain(pred).copied().collect();
        labels.sort_unstable();
        labels.dedup();
        Self::with_labels(truth, pred, &labels)
    }

    /// Matrix over a fixed label list. Pairs with a value outside `labels`
    /// are not counted.
    pub fn with_labels(truth: &[i32], pred: &[i32], labels: &[i32]) -> Result<Self> {
        if truth.len() != pred.len() {
            return Err(Error::shape("confusion predictions", truth.len(), pred.len()));
        }
        let mut cm = Self::new(labels.to_vec());
        for (&t, &p) in truth.iter().zip(pred) {
            if let (Some(i), Some(j)) = (cm.index_of(t), cm.index_of(p)) {
                cm.matrix[[i, j]] += 1.0;
            }
        }
        Ok(cm)
    }

    fn index_of(&self, value: i32) -> Option<usize> {
        self.labels.iter().position(|&l| l == value)
    }

    /// Accumulate another matrix over the same labels.
    pub fn add(&mut self, other: &ConfusionMatrix) -> Result<()> {
        if self.labels != other.labels {
            return Err(Error::shape("confusion labels", self.labels.len(), other.labels.len()));
        }
        self.matrix += &other.matrix;
        Ok(())
    }

    /// Drop the row and column of `value`, if present.
    pub fn remove_label(&mut self, value: i32) {
        let Some(k) = self.index_of(value) else {
            return;
        };
        let keep: Vec<usize> = (0..self.labels.len()).filter(|&i| i != k).collect();
        self.matrix = self.matrix.select(Axis(0), &keep).select(Axis(1), &keep);
        self.labels.remove(k);
    }

    /// Drop the rows and columns of every ignored label.
    pub fn remove_ignored(&mut self, ignored: &[i32]) {
        for &value in ignored {
            self.remove_label(value);
        }
    }

    /// Rescale each row `i` by `proportions[i] / (row_sum_i + 1e-6)`.
    ///
    /// Turns counts measured on a sampled subset into the class balance of
    /// the full clouds. Apply after ignored labels have been removed.
    pub fn rebalance(&mut self, proportions: &[f64]) -> Result<()> {
        if proportions.len() != self.n_classes() {
            return Err(Error::shape("rebalance proportions", self.n_classes(), proportions.len()));
        }
        for (mut row, &prop) in self.matrix.axis_iter_mut(Axis(0)).zip(proportions) {
            let scale = prop / (row.sum() + REBALANCE_EPSILON);
            row *= scale;
        }
        Ok(())
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    pub fn n_classes(&self) -> usize {
        self.labels.len()
    }

    /// Element at `[true_index][predicted_index]`
    pub fn get(&self, true_index: usize, predicted_index: usize) -> f64 {
        self.matrix[[true_index, predicted_index]]
    }

    pub fn true_positives(&self, class: usize) -> f64 {
        self.matrix[[class, class]]
    }

    /// Predicted as `class` but wasn't
    pub fn false_positives(&self, class: usize) -> f64 {
        self.matrix.column(class).sum() - self.true_positives(class)
    }

    /// Was `class` but predicted differently
    pub fn false_negatives(&self, class: usize) -> f64 {
        self.matrix.row(class).sum() - self.true_positives(class)
    }

    pub fn true_negatives(&self, class: usize) -> f64 {
        self.total()
            - self.true_positives(class)
            - self.false_positives(class)
            - self.false_negatives(class)
    }

    /// Total true instances of `class`
    pub fn support(&self, class: usize) -> f64 {
        self.matrix.row(class).sum()
    }

    pub fn total(&self) -> f64 {
        self.matrix.sum()
    }

    /// `trace / total`, 0 for an empty matrix
    pub fn accuracy(&self) -> f64 {
        ratio(self.matrix.diag().sum(), self.total())
    }

    /// `tp / (tp + fp + fn)`, 0 when the class never occurs
    pub fn iou(&self, class: usize) -> f64 {
        let tp = self.true_positives(class);
        ratio(tp, tp + self.false_positives(class) + self.false_negatives(class))
    }

    pub fn ious(&self) -> Vec<f64> {
        (0..self.n_classes()).map(|c| self.iou(c)).collect()
    }

    /// Whether `class` appears in the truth or the predictions
    pub fn is_present(&self, class: usize) -> bool {
        self.support(class) + self.false_positives(class) > 0.0
    }

    /// Mean IoU over the classes present in truth or predictions
    pub fn mean_iou(&self) -> f64 {
        self.macro_over_present(|c| self.iou(c))
    }

    pub fn precision(&self, class: usize) -> f64 {
        let tp = self.true_positives(class);
        ratio(tp, tp + self.false_positives(class))
    }

    pub fn recall(&self, class: usize) -> f64 {
        let tp = self.true_positives(class);
        ratio(tp, tp + self.false_negatives(class))
    }

    pub fn f1(&self, class: usize) -> f64 {
        let (p, r) = (self.precision(class), self.recall(class));
        ratio(2.0 * p * r, p + r)
    }

    /// Macro F1 over the classes present in truth or predictions
    pub fn macro_f1(&self) -> f64 {
        self.macro_over_present(|c| self.f1(c))
    }

    fn macro_over_present(&self, metric: impl Fn(usize) -> f64) -> f64 {
        let present: Vec<usize> = (0..self.n_classes()).filter(|&c| self.is_present(c)).collect();
        if present.is_empty() {
            return 0.0;
        }
        present.iter().map(|&c| metric(c)).sum::<f64>() / present.len() as f64
    }
}

/// `num / den`, 0 when the denominator is 0
pub(crate) fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Confusion Matrix:")?;

        write!(f, "        ")?;
        for l in &self.labels {
            write!(f, "Pred {l:<3}")?;
        }
        writeln!(f)?;

        for (i, l) in self.labels.iter().enumerate() {
            write!(f, "True {l:<3}")?;
            for j in 0..self.n_classes() {
                write!(f, "{:>8.0}", self.matrix[[i, j]])?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

//! Binary confusion counts and category rates

use super::confusion::{ratio, ConfusionMatrix};
use serde::{Deserialize, Serialize};

/// Counts of a two-class confusion, the second label being positive
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BinaryConfusion {
    pub tn: f64,
    pub fp: f64,
    pub fn_: f64,
    pub tp: f64,
}

impl BinaryConfusion {
    /// Split a 2×2 matrix; `None` for any other size.
    pub fn from_matrix(cm: &ConfusionMatrix) -> Option<Self> {
        if cm.n_classes() != 2 {
            return None;
        }
        Some(Self { tn: cm.get(0, 0), fp: cm.get(0, 1), fn_: cm.get(1, 0), tp: cm.get(1, 1) })
    }

    pub fn rates(&self) -> CategoryRates {
        CategoryRates {
            tpr: ratio(self.tp, self.tp + self.fn_),
            fpr: ratio(self.fp, self.tn + self.fp),
            fnr: ratio(self.fn_, self.tp + self.fn_),
            tnr: ratio(self.tn, self.tn + self.fp),
        }
    }

    /// F1 of the positive class
    pub fn f1(&self) -> f64 {
        ratio(2.0 * self.tp, 2.0 * self.tp + self.fp + self.fn_)
    }
}

/// Per-category rates; a zero denominator yields 0
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryRates {
    /// `tp / (tp + fn)`
    pub tpr: f64,
    /// `fp / (tn + fp)`
    pub fpr: f64,
    /// `fn / (tp + fn)`
    pub fnr: f64,
    /// `tn / (tn + fp)`
    pub tnr: f64,
}

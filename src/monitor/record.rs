//! Metric records

use crate::eval::segmentation::SegmentationMetrics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prefix of training-set scores
pub const TRAIN_PREFIX: &str = "Train";
/// Prefix of validation-set scores
pub const VALIDATION_PREFIX: &str = "Validation";

/// Named scalar values logged together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricRecord {
    values: BTreeMap<String, f64>,
}

impl MetricRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    /// Builder form of [`MetricRecord::insert`].
    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

/// Record of segmentation scores under `prefix/`.
///
/// Binary counts and category rates are only present for two-class models.
pub fn record_from_metrics(prefix: &str, metrics: &SegmentationMetrics) -> MetricRecord {
    let mut record = MetricRecord::new();
    let mut put = |name: &str, value: f64| record.insert(format!("{prefix}/{name}"), value);

    if let Some(b) = metrics.binary {
        put("TN", b.tn);
        put("FP", b.fp);
        put("FN", b.fn_);
        put("TP", b.tp);
        let rates = b.rates();
        put("category-TP", rates.tpr);
        put("category-FP", rates.fpr);
        put("category-FN", rates.fnr);
        put("category-TN", rates.tnr);
    }
    put("F1", metrics.f1);
    put("mIoU", metrics.mean_iou);
    put("accuracy", metrics.accuracy);
    record
}

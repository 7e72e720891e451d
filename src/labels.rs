//! Label value space shared by the dataset and the model
//!
//! The dataset knows every label value, ignored ones included. The model only
//! predicts the non-ignored values: output channel `c` is the `c`-th
//! non-ignored value in ascending order.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Ordered label values plus the ignored subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLabelSpace {
    label_values: Vec<i32>,
    ignored: Vec<i32>,
    model_values: Vec<i32>,
}

impl ClassLabelSpace {
    /// Create a label space.
    ///
    /// `label_values` must be strictly ascending. Ignored values that are not
    /// part of `label_values` are rejected.
    pub fn new(label_values: Vec<i32>, ignored: Vec<i32>) -> Result<Self> {
        if let Some(w) = label_values.windows(2).find(|w| w[0] >= w[1]) {
            return Err(Error::LabelOrder(format!(
                "label values must be strictly ascending, found {} before {}",
                w[0], w[1]
            )));
        }
        if let Some(v) = ignored.iter().find(|v| !label_values.contains(v)) {
            return Err(Error::LabelOrder(format!("ignored label {v} is not a known label value")));
        }

        let model_values = label_values.iter().copied().filter(|v| !ignored.contains(v)).collect();

        Ok(Self { label_values, ignored, model_values })
    }

    /// All label values, ignored included.
    pub fn label_values(&self) -> &[i32] {
        &self.label_values
    }

    /// Ignored label values.
    pub fn ignored(&self) -> &[i32] {
        &self.ignored
    }

    /// Label values predicted by the model, in channel order.
    pub fn model_values(&self) -> &[i32] {
        &self.model_values
    }

    /// Number of label values including ignored ones.
    pub fn num_classes(&self) -> usize {
        self.label_values.len()
    }

    /// Number of model output channels.
    pub fn num_model_classes(&self) -> usize {
        self.model_values.len()
    }

    pub fn is_ignored(&self, value: i32) -> bool {
        self.ignored.contains(&value)
    }

    /// Label value for a model output channel.
    pub fn channel_to_label(&self, channel: usize) -> Option<i32> {
        self.model_values.get(channel).copied()
    }

    /// Label values for a sequence of model channels.
    pub fn channels_to_labels(&self, channels: &[usize]) -> Result<Vec<i32>> {
        channels
            .iter()
            .map(|&c| {
                self.channel_to_label(c)
                    .ok_or_else(|| Error::shape("model classes", self.num_model_classes(), c + 1))
            })
            .collect()
    }

    /// Model output channel for a label value, `None` for ignored or unknown values.
    pub fn label_to_channel(&self, value: i32) -> Option<usize> {
        self.model_values.binary_search(&value).ok()
    }

    /// Count of each model class among `labels`, in channel order.
    ///
    /// These are the true class proportions used to rebalance confusion
    /// matrices computed on a sampled subset.
    pub fn proportions<'a, I>(&self, labels: I) -> Vec<f64>
    where
        I: IntoIterator<Item = &'a [i32]>,
    {
        let mut counts = vec![0.0; self.num_model_classes()];
        for cloud in labels {
            for &value in cloud {
                if let Some(c) = self.label_to_channel(value) {
                    counts[c] += 1.0;
                }
            }
        }
        counts
    }
}

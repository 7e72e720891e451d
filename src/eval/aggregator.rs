//! Smoothed per-point class probabilities over full validation clouds
//!
//! Validation batches cover overlapping sub-clouds that arrive in no
//! particular order. Each prediction is folded into a per-cloud buffer with
//! an exponential moving average:
//!
//! ```text
//! buffer[i] = α · buffer[i] + (1 − α) · probs[i]
//! ```
//!
//! Buffers start at zero, are allocated on the first update of a cloud and
//! persist across epochs.

use crate::data::CloudInfo;
use crate::error::{Error, Result};
use crate::labels::ClassLabelSpace;
use crate::model::argmax_rows;
use ndarray::{Array2, ArrayView2, Axis};
use std::collections::BTreeMap;

/// Default EMA coefficient
pub const DEFAULT_SMOOTHING: f32 = 0.95;

struct CloudSlot {
    point_count: usize,
    buffer: Option<Array2<f32>>,
}

/// Running per-point probabilities for every validation cloud
pub struct ValidationProbabilityAggregator {
    num_classes: usize,
    smoothing: f32,
    clouds: BTreeMap<usize, CloudSlot>,
}

impl ValidationProbabilityAggregator {
    /// Register `clouds` for `num_model_classes` channels.
    ///
    /// `smoothing` must lie in `[0, 1)`.
    pub fn new(clouds: &[CloudInfo], num_model_classes: usize, smoothing: f32) -> Result<Self> {
        if !(0.0..1.0).contains(&smoothing) {
            return Err(Error::Config(format!("smoothing must be in [0, 1), got {smoothing}")));
        }
        let clouds = clouds
            .iter()
            .map(|c| (c.id, CloudSlot { point_count: c.point_count, buffer: None }))
            .collect();
        Ok(Self { num_classes: num_model_classes, smoothing, clouds })
    }

    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Fold the rows of one cloud from one batch into its buffer.
    ///
    /// Row `k` of `probs` belongs to point `local_indices[k]`. When an index
    /// repeats inside one call every blended row is computed from the buffer
    /// as it was before the call and rows are written in order, so the last
    /// occurrence wins.
    pub fn update(
        &mut self,
        cloud_id: usize,
        local_indices: &[usize],
        probs: ArrayView2<'_, f32>,
    ) -> Result<()> {
        if probs.ncols() != self.num_classes {
            return Err(Error::shape("probability width", self.num_classes, probs.ncols()));
        }
        if probs.nrows() != local_indices.len() {
            return Err(Error::shape("probability rows", local_indices.len(), probs.nrows()));
        }
        let num_classes = self.num_classes;
        let alpha = self.smoothing;
        let slot = self.clouds.get_mut(&cloud_id).ok_or(Error::UnknownCloud(cloud_id))?;
        if let Some(&index) = local_indices.iter().find(|&&i| i >= slot.point_count) {
            return Err(Error::IndexOutOfRange {
                cloud: cloud_id,
                index,
                point_count: slot.point_count,
            });
        }

        let point_count = slot.point_count;
        let buffer =
            slot.buffer.get_or_insert_with(|| Array2::zeros((point_count, num_classes)));
        let mut blended = buffer.select(Axis(0), local_indices);
        blended *= alpha;
        blended.scaled_add(1.0 - alpha, &probs);
        for (row, &i) in blended.axis_iter(Axis(0)).zip(local_indices) {
            buffer.row_mut(i).assign(&row);
        }
        Ok(())
    }

    /// Read-only view of a cloud buffer; `None` until its first update.
    pub fn snapshot(&self, cloud_id: usize) -> Option<ArrayView2<'_, f32>> {
        self.clouds.get(&cloud_id).and_then(|s| s.buffer.as_ref()).map(|b| b.view())
    }

    /// Most likely label value of every point of a cloud.
    ///
    /// A cloud that never received an update predicts the first model class
    /// everywhere.
    pub fn predicted_labels(&self, cloud_id: usize, space: &ClassLabelSpace) -> Result<Vec<i32>> {
        let slot = self.clouds.get(&cloud_id).ok_or(Error::UnknownCloud(cloud_id))?;
        let channels = match &slot.buffer {
            Some(buffer) => argmax_rows(buffer),
            None => vec![0; slot.point_count],
        };
        space.channels_to_labels(&channels)
    }

    /// Predicted labels of full-resolution points.
    ///
    /// `projection[k]` is the buffer point nearest to evaluation point `k`.
    pub fn reproject(
        &self,
        cloud_id: usize,
        projection: &[usize],
        space: &ClassLabelSpace,
    ) -> Result<Vec<i32>> {
        let labels = self.predicted_labels(cloud_id, space)?;
        projection
            .iter()
            .map(|&i| {
                labels.get(i).copied().ok_or(Error::IndexOutOfRange {
                    cloud: cloud_id,
                    index: i,
                    point_count: labels.len(),
                })
            })
            .collect()
    }
}

//! Batch of stacked sub-clouds

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView2, Axis, Slice};
use std::collections::BTreeMap;
use std::ops::Range;

/// A batch of sub-clouds stacked along the point axis
///
/// Produced by the loader, consumed once by the orchestrator.
#[derive(Clone, Debug)]
pub struct Batch {
    /// Point coordinates, shape `[N, 3]`
    pub points: Array2<f32>,
    /// Ground-truth label value per point
    pub labels: Vec<i32>,
    /// Index of each point inside its source cloud
    pub input_indices: Vec<usize>,
    /// Source cloud id of each point
    pub cloud_ids: Vec<usize>,
    /// Number of points in each stacked sub-cloud
    pub lengths: Vec<usize>,
}

/// One sub-cloud inside a [`Batch`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubCloud {
    /// Source cloud id
    pub cloud_id: usize,
    /// Row range inside the stacked batch
    pub range: Range<usize>,
}

impl Batch {
    /// Create a batch, checking that every per-point field agrees with `lengths`.
    pub fn new(
        points: Array2<f32>,
        labels: Vec<i32>,
        input_indices: Vec<usize>,
        cloud_ids: Vec<usize>,
        lengths: Vec<usize>,
    ) -> Result<Self> {
        let batch = Self { points, labels, input_indices, cloud_ids, lengths };
        batch.validate()?;
        Ok(batch)
    }

    /// Total number of stacked points
    pub fn size(&self) -> usize {
        self.labels.len()
    }

    /// Number of stacked sub-clouds
    pub fn num_subclouds(&self) -> usize {
        self.lengths.len()
    }

    /// Check field lengths and that each sub-cloud comes from a single cloud.
    pub fn validate(&self) -> Result<()> {
        let n: usize = self.lengths.iter().sum();
        for (name, len) in [
            ("points", self.points.nrows()),
            ("labels", self.labels.len()),
            ("input_indices", self.input_indices.len()),
            ("cloud_ids", self.cloud_ids.len()),
        ] {
            if len != n {
                return Err(Error::InvalidBatch(format!(
                    "{name} has {len} rows but lengths sum to {n}"
                )));
            }
        }

        for sub in self.subclouds() {
            let ids = &self.cloud_ids[sub.range.clone()];
            if ids.iter().any(|&id| id != sub.cloud_id) {
                return Err(Error::InvalidBatch(format!(
                    "sub-cloud at rows {:?} mixes source clouds",
                    sub.range
                )));
            }
        }
        Ok(())
    }

    /// Iterate over the stacked sub-clouds in order.
    pub fn subclouds(&self) -> impl Iterator<Item = SubCloud> + '_ {
        let mut start = 0;
        self.lengths.iter().filter(|&&len| len > 0).map(move |&len| {
            let range = start..start + len;
            start += len;
            SubCloud { cloud_id: self.cloud_ids[range.start], range }
        })
    }

    /// Rows of a per-point matrix belonging to one sub-cloud.
    pub fn slice_rows<'a>(&self, matrix: &'a Array2<f32>, sub: &SubCloud) -> ArrayView2<'a, f32> {
        matrix.slice_axis(Axis(0), Slice::from(sub.range.clone()))
    }

    /// Batch rows of each source cloud, in stacking order.
    pub fn rows_by_cloud(&self) -> BTreeMap<usize, Vec<usize>> {
        let mut rows: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for sub in self.subclouds() {
            rows.entry(sub.cloud_id).or_default().extend(sub.range);
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_subclouds() -> Batch {
        Batch::new(
            Array2::zeros((5, 3)),
            vec![0, 1, 1, 0, 1],
            vec![10, 11, 12, 0, 1],
            vec![0, 0, 0, 2, 2],
            vec![3, 2],
        )
        .unwrap()
    }

    #[test]
    fn test_batch_creation() {
        let batch = two_subclouds();
        assert_eq!(batch.size(), 5);
        assert_eq!(batch.num_subclouds(), 2);
    }

    #[test]
    fn test_subclouds_ranges() {
        let batch = two_subclouds();
        let subs: Vec<_> = batch.subclouds().collect();
        assert_eq!(subs[0], SubCloud { cloud_id: 0, range: 0..3 });
        assert_eq!(subs[1], SubCloud { cloud_id: 2, range: 3..5 });
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = Batch::new(Array2::zeros((4, 3)), vec![0; 4], vec![0; 4], vec![0; 4], vec![3])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidBatch(_)));
    }

    #[test]
    fn test_mixed_cloud_subcloud_rejected() {
        let err = Batch::new(Array2::zeros((2, 3)), vec![0; 2], vec![0, 1], vec![0, 1], vec![2])
            .unwrap_err();
        assert!(err.to_string().contains("mixes"));
    }

    #[test]
    fn test_slice_rows() {
        let batch = two_subclouds();
        let probs = Array2::from_shape_fn((5, 2), |(i, _)| i as f32);
        let sub = batch.subclouds().nth(1).unwrap();
        let view = batch.slice_rows(&probs, &sub);
        assert_eq!(view.nrows(), 2);
        assert_eq!(view[[0, 0]], 3.0);
        assert_eq!(view[[1, 1]], 4.0);
    }

    #[test]
    fn test_rows_by_cloud_merges_subclouds_of_one_cloud() {
        let batch = Batch::new(
            Array2::zeros((5, 3)),
            vec![0; 5],
            vec![0, 1, 7, 0, 2],
            vec![1, 1, 0, 1, 1],
            vec![2, 1, 2],
        )
        .unwrap();
        let rows = batch.rows_by_cloud();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[&0], vec![2]);
        assert_eq!(rows[&1], vec![0, 1, 3, 4]);
    }
}

//! Majority-vote merge of training predictions
//!
//! Training sub-clouds overlap, so a point can be predicted several times in
//! one epoch. Votes are collected per `(cloud, point)` and merged into one
//! prediction per point before scoring.

use crate::error::{Error, Result};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct PointVotes {
    truth: i32,
    counts: BTreeMap<i32, u32>,
}

impl PointVotes {
    /// Most voted label, the smallest one on ties.
    fn winner(&self) -> i32 {
        let mut best = (self.truth, 0);
        for (&label, &count) in &self.counts {
            if count > best.1 {
                best = (label, count);
            }
        }
        best.0
    }
}

/// Per-point prediction votes of one training epoch
#[derive(Debug, Clone, Default)]
pub struct VoteAccumulator {
    points: BTreeMap<(usize, usize), PointVotes>,
}

impl VoteAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one vote per stacked point.
    pub fn add(
        &mut self,
        cloud_ids: &[usize],
        indices: &[usize],
        truth: &[i32],
        pred: &[i32],
    ) -> Result<()> {
        let n = indices.len();
        for (name, len) in [("cloud_ids", cloud_ids.len()), ("truth", truth.len()), ("pred", pred.len())] {
            if len != n {
                return Err(Error::shape(format!("vote {name}"), n, len));
            }
        }
        for k in 0..n {
            let entry = self
                .points
                .entry((cloud_ids[k], indices[k]))
                .or_insert_with(|| PointVotes { truth: truth[k], counts: BTreeMap::new() });
            *entry.counts.entry(pred[k]).or_insert(0) += 1;
        }
        Ok(())
    }

    /// Number of distinct points voted on
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Truth and merged prediction per distinct point, ordered by `(cloud, point)`.
    pub fn merged(&self) -> (Vec<i32>, Vec<i32>) {
        self.points.values().map(|v| (v.truth, v.winner())).unzip()
    }
}

//! Source cloud descriptors

use crate::error::{Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Immutable description of a source point cloud
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudInfo {
    /// Cloud id, as carried by batches
    pub id: usize,
    /// File stem or display name
    pub name: String,
    /// Number of sampled points the loader indexes into
    pub point_count: usize,
}

impl CloudInfo {
    pub fn new(id: usize, name: impl Into<String>, point_count: usize) -> Self {
        Self { id, name: name.into(), point_count }
    }
}

/// Full-resolution evaluation points of a cloud
///
/// `projection[j]` is the sampled point nearest to evaluation point `j`,
/// precomputed by the loader.
#[derive(Debug, Clone)]
pub struct EvaluationSet {
    /// Coordinates, shape `[M, 3]`
    pub points: Array2<f32>,
    /// Ground-truth label value of each evaluation point
    pub labels: Vec<i32>,
    /// Nearest sampled point of each evaluation point
    pub projection: Vec<usize>,
}

impl EvaluationSet {
    pub fn new(points: Array2<f32>, labels: Vec<i32>, projection: Vec<usize>) -> Result<Self> {
        let m = points.nrows();
        if labels.len() != m {
            return Err(Error::shape("evaluation labels", m, labels.len()));
        }
        if projection.len() != m {
            return Err(Error::shape("evaluation projection", m, projection.len()));
        }
        Ok(Self { points, labels, projection })
    }

    pub fn len(&self) -> usize {
        self.projection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projection.is_empty()
    }
}

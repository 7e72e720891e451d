//! Per-epoch learning rate decay table
//!
//! Multiplies every group learning rate by a factor keyed by the epoch that
//! just finished. Epochs without an entry leave the rates unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sparse map from finished epoch index to a multiplicative decay factor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LrDecayTable {
    factors: BTreeMap<usize, f32>,
}

impl LrDecayTable {
    /// Table with no decay at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// The same factor for every epoch in `1..max_epoch`.
    ///
    /// Epoch 0 carries no entry, so the first decay lands after the second epoch.
    pub fn every_epoch(max_epoch: usize, factor: f32) -> Self {
        Self { factors: (1..max_epoch).map(|e| (e, factor)).collect() }
    }

    /// Explicit table.
    pub fn from_map(factors: BTreeMap<usize, f32>) -> Self {
        Self { factors }
    }

    /// Default decay: divide the rate by 10 every 150 epochs.
    pub fn default_for(max_epoch: usize) -> Self {
        Self::every_epoch(max_epoch, default_decay_factor())
    }

    /// Factor registered for exactly this epoch.
    pub fn factor_for(&self, epoch: usize) -> Option<f32> {
        self.factors.get(&epoch).copied()
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Product of the factors applied while finishing epochs `from..to`.
    pub fn cumulative(&self, from: usize, to: usize) -> f32 {
        self.factors.range(from..to).map(|(_, f)| f).product()
    }
}

/// `0.1^(1/150)`
pub fn default_decay_factor() -> f32 {
    0.1f32.powf(1.0 / 150.0)
}

//! Two-group SGD keyed on parameter roles
//!
//! Kernel deformation offsets train at `learning_rate * deform_lr_factor`,
//! everything else at the base rate. Membership comes from the
//! [`ParamRole`] tag each parameter carries, never from its name.

use super::{Optimizer, OptimizerState, ParamGroup, SGD};
use crate::config::OptimizerSpec;
use crate::error::{Error, Result};
use crate::model::{ParamRole, Parameter};
use std::path::Path;

/// Group name for [`ParamRole::Standard`] parameters
pub const STANDARD_GROUP: &str = "standard";
/// Group name for [`ParamRole::Offset`] parameters
pub const OFFSET_GROUP: &str = "offset";

/// SGD with one learning rate per parameter role
pub struct ParameterGroupOptimizer {
    sgd: SGD,
    deform_lr_factor: f32,
}

impl ParameterGroupOptimizer {
    /// Partition `params` by role. Either group may be empty.
    pub fn new(params: &[Parameter], spec: &OptimizerSpec) -> Self {
        let members = |role: ParamRole| -> Vec<String> {
            params.iter().filter(|p| p.role == role).map(|p| p.name.clone()).collect()
        };
        let standard = members(ParamRole::Standard);
        let offset = members(ParamRole::Offset);
        tracing::debug!(
            standard = standard.len(),
            offset = offset.len(),
            "partitioned parameters into optimizer groups"
        );

        let sgd = SGD::new(spec.learning_rate, spec.momentum)
            .with_weight_decay(spec.weight_decay)
            .with_group(ParamGroup::new(STANDARD_GROUP, spec.learning_rate, standard))
            .with_group(ParamGroup::new(
                OFFSET_GROUP,
                spec.learning_rate * spec.deform_lr_factor,
                offset,
            ));
        Self { sgd, deform_lr_factor: spec.deform_lr_factor }
    }

    pub fn groups(&self) -> &[ParamGroup] {
        self.sgd.groups()
    }

    /// Current learning rate of each group, in group order.
    pub fn learning_rates(&self) -> Vec<(&str, f32)> {
        self.sgd.groups().iter().map(|g| (g.name.as_str(), g.lr)).collect()
    }

    /// Multiply every group learning rate by `factor`.
    pub fn scale_learning_rate(&mut self, factor: f32) {
        for (_, lr) in self.sgd.group_lrs_mut() {
            *lr *= factor;
        }
        let base = self.sgd.lr() * factor;
        self.sgd.set_lr(base);
    }

    pub fn state(&self) -> OptimizerState {
        self.sgd.state()
    }

    /// Restore a state captured by [`ParameterGroupOptimizer::state`].
    ///
    /// The stored groups must have the same names and members as the live
    /// ones, otherwise the record at `origin` is reported as corrupt.
    pub fn load_state(&mut self, state: OptimizerState, origin: &Path) -> Result<()> {
        let live = self.sgd.groups();
        if live.len() != state.groups.len() {
            return Err(Error::corrupt(
                origin,
                format!(
                    "optimizer has {} parameter groups, checkpoint has {}",
                    live.len(),
                    state.groups.len()
                ),
            ));
        }
        for (ours, theirs) in live.iter().zip(&state.groups) {
            if ours.name != theirs.name {
                return Err(Error::corrupt(
                    origin,
                    format!("optimizer group '{}' stored as '{}'", ours.name, theirs.name),
                ));
            }
            let mut a = ours.members.clone();
            let mut b = theirs.members.clone();
            a.sort();
            b.sort();
            if a != b {
                return Err(Error::corrupt(
                    origin,
                    format!("optimizer group '{}' members differ from the model", ours.name),
                ));
            }
        }

        let base = state
            .groups
            .iter()
            .find(|g| g.name == STANDARD_GROUP)
            .map_or(self.sgd.lr(), |g| g.lr);
        self.sgd.load_state(state);
        self.sgd.set_lr(base);
        Ok(())
    }
}

impl Optimizer for ParameterGroupOptimizer {
    fn step(&mut self, params: &mut [Parameter]) {
        self.sgd.step(params);
    }

    fn lr(&self) -> f32 {
        self.sgd.lr()
    }

    /// Set the base rate; the offset group follows at `lr * deform_lr_factor`.
    fn set_lr(&mut self, lr: f32) {
        let factor = self.deform_lr_factor;
        for (name, group_lr) in self.sgd.group_lrs_mut() {
            *group_lr = if name == OFFSET_GROUP { lr * factor } else { lr };
        }
        self.sgd.set_lr(lr);
    }
}

//! Stochastic Gradient Descent with momentum, weight decay and parameter groups

use super::Optimizer;
use crate::model::Parameter;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A named set of parameters sharing one learning rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGroup {
    pub name: String,
    pub lr: f32,
    pub members: Vec<String>,
}

impl ParamGroup {
    pub fn new(name: impl Into<String>, lr: f32, members: Vec<String>) -> Self {
        Self { name: name.into(), lr, members }
    }
}

/// Serializable SGD state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerState {
    pub momentum: f32,
    pub weight_decay: f32,
    pub groups: Vec<ParamGroup>,
    /// Momentum buffer per parameter name
    pub velocities: BTreeMap<String, Vec<f32>>,
}

/// SGD optimizer
///
/// Update rule per parameter, with `lr` taken from the parameter's group:
///
/// ```text
/// d = grad + weight_decay * p
/// v = momentum * v + d        (v = d on the first step)
/// p = p - lr * v
/// ```
///
/// Parameters outside every group use the base learning rate.
pub struct SGD {
    lr: f32,
    momentum: f32,
    weight_decay: f32,
    groups: Vec<ParamGroup>,
    /// Group index per member name
    group_of: HashMap<String, usize>,
    velocities: BTreeMap<String, Array1<f32>>,
}

impl SGD {
    /// Create a new SGD optimizer
    pub fn new(lr: f32, momentum: f32) -> Self {
        Self {
            lr,
            momentum,
            weight_decay: 0.0,
            groups: Vec::new(),
            group_of: HashMap::new(),
            velocities: BTreeMap::new(),
        }
    }

    /// Set L2 weight decay
    pub fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Add a parameter group with its own learning rate
    pub fn with_group(mut self, group: ParamGroup) -> Self {
        self.groups.push(group);
        self.reindex();
        self
    }

    /// Earlier groups win when a name appears in several.
    fn reindex(&mut self) {
        self.group_of.clear();
        for (i, group) in self.groups.iter().enumerate() {
            for member in &group.members {
                self.group_of.entry(member.clone()).or_insert(i);
            }
        }
    }

    pub fn groups(&self) -> &[ParamGroup] {
        &self.groups
    }

    /// Group names with mutable learning rates; membership stays fixed.
    pub fn group_lrs_mut(&mut self) -> impl Iterator<Item = (&str, &mut f32)> {
        self.groups.iter_mut().map(|g| (g.name.as_str(), &mut g.lr))
    }

    pub fn momentum(&self) -> f32 {
        self.momentum
    }

    pub fn weight_decay(&self) -> f32 {
        self.weight_decay
    }

    /// Learning rate applied to the named parameter
    pub fn lr_for(&self, name: &str) -> f32 {
        self.group_of.get(name).map_or(self.lr, |&i| self.groups[i].lr)
    }

    pub fn state(&self) -> OptimizerState {
        OptimizerState {
            momentum: self.momentum,
            weight_decay: self.weight_decay,
            groups: self.groups.clone(),
            velocities: self.velocities.iter().map(|(k, v)| (k.clone(), v.to_vec())).collect(),
        }
    }

    /// Replace hyperparameters, group learning rates and momentum buffers.
    pub fn load_state(&mut self, state: OptimizerState) {
        self.momentum = state.momentum;
        self.weight_decay = state.weight_decay;
        self.groups = state.groups;
        self.reindex();
        self.velocities =
            state.velocities.into_iter().map(|(k, v)| (k, Array1::from(v))).collect();
    }
}

impl Optimizer for SGD {
    fn step(&mut self, params: &mut [Parameter]) {
        for param in params.iter_mut() {
            let lr = self.lr_for(&param.name);

            let mut d = param.grad.clone();
            if self.weight_decay != 0.0 {
                d.scaled_add(self.weight_decay, &param.data);
            }

            if self.momentum > 0.0 {
                let momentum = self.momentum;
                let velocity =
                    self.velocities.entry(param.name.clone()).or_insert_with(|| Array1::zeros(0));
                if velocity.len() == d.len() && !velocity.is_empty() {
                    *velocity *= momentum;
                    *velocity += &d;
                } else {
                    *velocity = d;
                }
                param.data.scaled_add(-lr, &*velocity);
            } else {
                param.data.scaled_add(-lr, &d);
            }
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}

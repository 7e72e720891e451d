//! Interface to the external segmentation network
//!
//! The network architecture, its loss and its gradient computation live
//! outside this crate. The orchestrator drives it through
//! [`SegmentationModel`] and reads its weights as a [`StateDict`].

use crate::error::{Error, Result};
use crate::train::Batch;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Optimizer role of a parameter, assigned when the model is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamRole {
    /// Trained at the base learning rate
    #[default]
    Standard,
    /// Kernel deformation offsets, trained at a scaled learning rate
    Offset,
}

/// A named trainable parameter with its gradient
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub role: ParamRole,
    pub shape: Vec<usize>,
    pub data: Array1<f32>,
    pub grad: Array1<f32>,
}

impl Parameter {
    /// Create a zero-initialised standard parameter.
    pub fn zeros(name: impl Into<String>, shape: Vec<usize>) -> Self {
        let len: usize = shape.iter().product();
        Self {
            name: name.into(),
            role: ParamRole::Standard,
            shape,
            data: Array1::zeros(len),
            grad: Array1::zeros(len),
        }
    }

    /// Create a parameter from flat values.
    pub fn from_vec(name: impl Into<String>, shape: Vec<usize>, values: Vec<f32>) -> Result<Self> {
        let len: usize = shape.iter().product();
        if values.len() != len {
            return Err(Error::shape("parameter values", len, values.len()));
        }
        Ok(Self {
            name: name.into(),
            role: ParamRole::Standard,
            shape,
            data: Array1::from(values),
            grad: Array1::zeros(len),
        })
    }

    /// Tag the parameter with an optimizer role.
    pub fn with_role(mut self, role: ParamRole) -> Self {
        self.role = role;
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn zero_grad(&mut self) {
        self.grad.fill(0.0);
    }

    /// Snapshot of the values as serializable tensor data.
    pub fn to_tensor_data(&self) -> TensorData {
        TensorData { shape: self.shape.clone(), data: self.data.to_vec() }
    }
}

/// Serializable tensor: shape plus row-major values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorData {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl TensorData {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
        Self { shape, data }
    }
}

/// Named weights of a model, parameters and buffers alike
pub type StateDict = BTreeMap<String, TensorData>;

/// Execution mode of the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelMode {
    Train,
    Eval,
}

/// Segmentation network driven by the orchestrator
pub trait SegmentationModel {
    /// Width of the last layer (number of model classes).
    fn num_classes(&self) -> usize;

    /// Raw class scores for every stacked point, shape `[N, num_classes]`.
    fn forward(&mut self, batch: &Batch) -> Result<Array2<f32>>;

    /// Compute the loss of `scores` against the batch labels and fill the
    /// parameter gradients. Returns the loss value.
    fn backward(&mut self, scores: &Array2<f32>, batch: &Batch) -> Result<f32>;

    fn parameters(&self) -> &[Parameter];

    fn parameters_mut(&mut self) -> &mut [Parameter];

    fn set_mode(&mut self, mode: ModelMode);

    /// Non-trainable persisted tensors, e.g. `criterion.weight`.
    fn buffers(&self) -> StateDict {
        StateDict::new()
    }

    /// Restore one buffer returned by [`SegmentationModel::buffers`].
    fn load_buffer(&mut self, name: &str, _value: &TensorData) -> Result<()> {
        Err(Error::Model(format!("model has no buffer '{name}'")))
    }

    /// Parameters and buffers keyed by name.
    fn state_dict(&self) -> StateDict {
        let mut state = self.buffers();
        for p in self.parameters() {
            state.insert(p.name.clone(), p.to_tensor_data());
        }
        state
    }

    /// Restore every parameter and buffer. Missing or unexpected keys and
    /// shape mismatches are errors.
    fn load_state_dict(&mut self, state: &StateDict) -> Result<()> {
        let buffer_names: Vec<String> = self.buffers().into_keys().collect();
        let expected = self.parameters().len() + buffer_names.len();

        for p in self.parameters_mut() {
            let value = state
                .get(&p.name)
                .ok_or_else(|| Error::Model(format!("missing weight '{}'", p.name)))?;
            if value.shape != p.shape {
                return Err(Error::Model(format!(
                    "weight '{}' has shape {:?}, expected {:?}",
                    p.name, value.shape, p.shape
                )));
            }
            p.data = Array1::from(value.data.clone());
        }
        for name in &buffer_names {
            let value = state
                .get(name)
                .ok_or_else(|| Error::Model(format!("missing buffer '{name}'")))?;
            self.load_buffer(name, value)?;
        }
        if state.len() != expected {
            let known: Vec<&str> = self
                .parameters()
                .iter()
                .map(|p| p.name.as_str())
                .chain(buffer_names.iter().map(String::as_str))
                .collect();
            let extra: Vec<&String> = state.keys().filter(|k| !known.contains(&k.as_str())).collect();
            return Err(Error::Model(format!("unexpected weights {extra:?}")));
        }
        Ok(())
    }
}

impl<T: SegmentationModel + ?Sized> SegmentationModel for Box<T> {
    fn num_classes(&self) -> usize {
        (**self).num_classes()
    }

    fn forward(&mut self, batch: &Batch) -> Result<Array2<f32>> {
        (**self).forward(batch)
    }

    fn backward(&mut self, scores: &Array2<f32>, batch: &Batch) -> Result<f32> {
        (**self).backward(scores, batch)
    }

    fn parameters(&self) -> &[Parameter] {
        (**self).parameters()
    }

    fn parameters_mut(&mut self) -> &mut [Parameter] {
        (**self).parameters_mut()
    }

    fn set_mode(&mut self, mode: ModelMode) {
        (**self).set_mode(mode);
    }

    fn buffers(&self) -> StateDict {
        (**self).buffers()
    }

    fn load_buffer(&mut self, name: &str, value: &TensorData) -> Result<()> {
        (**self).load_buffer(name, value)
    }

    fn state_dict(&self) -> StateDict {
        (**self).state_dict()
    }

    fn load_state_dict(&mut self, state: &StateDict) -> Result<()> {
        (**self).load_state_dict(state)
    }
}

/// Row-wise softmax of raw scores.
pub fn softmax(scores: &Array2<f32>) -> Array2<f32> {
    let mut probs = scores.clone();
    for mut row in probs.axis_iter_mut(Axis(0)) {
        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        if sum > 0.0 {
            row /= sum;
        }
    }
    probs
}

/// Index of the largest value of each row (first one on ties).
pub fn argmax_rows(matrix: &Array2<f32>) -> Vec<usize> {
    matrix
        .axis_iter(Axis(0))
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) })
                .0
        })
        .collect()
}

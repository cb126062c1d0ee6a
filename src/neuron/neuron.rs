use serde::{Deserialize, Serialize};

use crate::activation::{sigmoid, sigmoid_derivative};
use crate::error::{check_all_finite, check_finite, NetworkError};

/// What one forward pass through a neuron produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeuronTrace {
    pub activity: f64,
    pub activation: f64,
}

/// Pending parameter change `−η · δ · x` (and `−η · δ` for the bias); it is
/// subtracted from the current parameters when applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightUpdate {
    pub weights: Vec<f64>,
    pub bias: f64,
}

/// A single sigmoid unit with its own weight vector and bias.
///
/// The training path works on explicit values: [`Neuron::forward`] returns a
/// [`NeuronTrace`], [`Neuron::delta_for`] and [`Neuron::weight_update`] read
/// only their arguments, and [`Neuron::apply_update`] is the one mutation.
///
/// The stepwise API (`calc_activity` → `calc_activation` → `set_delta` →
/// `set_delta_weights` → `update_weights`) wraps the same functions and keeps
/// the intermediate values on the neuron between calls, failing with
/// `NotReady` when a prerequisite step has not run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neuron {
    weights: Vec<f64>,
    bias: f64,
    configured: bool,
    inputs: Option<Vec<f64>>,
    activity: Option<f64>,
    activation: Option<f64>,
    delta: Option<f64>,
    pending: Option<WeightUpdate>,
}

impl Neuron {
    /// Builds a neuron; the weight-vector length becomes its fixed input size.
    pub fn new(weights: Vec<f64>, bias: f64) -> Result<Neuron, NetworkError> {
        if weights.is_empty() {
            return Err(NetworkError::InvalidValue("weight vector is empty".into()));
        }
        check_all_finite(&weights, "weight")?;
        check_finite(bias, "bias")?;
        Ok(Neuron {
            weights,
            bias,
            configured: true,
            inputs: None,
            activity: None,
            activation: None,
            delta: None,
            pending: None,
        })
    }

    pub fn input_size(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn activity(&self) -> Option<f64> {
        self.activity
    }

    pub fn activation(&self) -> Option<f64> {
        self.activation
    }

    pub fn delta(&self) -> Option<f64> {
        self.delta
    }

    pub fn delta_weights(&self) -> Option<&[f64]> {
        self.pending.as_ref().map(|u| u.weights.as_slice())
    }

    pub fn delta_bias(&self) -> Option<f64> {
        self.pending.as_ref().map(|u| u.bias)
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Replaces the weight vector. The length may not change.
    ///
    /// A rejected value leaves the neuron unconfigured until a valid
    /// weight vector is set again.
    pub fn set_weights(&mut self, weights: Vec<f64>) -> Result<(), NetworkError> {
        self.configured = false;
        if weights.len() != self.weights.len() {
            return Err(NetworkError::DimensionMismatch {
                expected: self.weights.len(),
                got: weights.len(),
            });
        }
        check_all_finite(&weights, "weight")?;
        self.weights = weights;
        self.configured = true;
        Ok(())
    }

    /// Replaces the bias; same configured-state rules as `set_weights`.
    pub fn set_bias(&mut self, bias: f64) -> Result<(), NetworkError> {
        self.configured = false;
        self.bias = check_finite(bias, "bias")?;
        self.configured = true;
        Ok(())
    }

    fn ensure_configured(&self) -> Result<(), NetworkError> {
        if self.configured {
            Ok(())
        } else {
            Err(NetworkError::NotConfigured(
                "weights or bias were rejected; set valid values first".into(),
            ))
        }
    }

    fn check_inputs(&self, inputs: &[f64]) -> Result<(), NetworkError> {
        if inputs.len() != self.weights.len() {
            return Err(NetworkError::DimensionMismatch {
                expected: self.weights.len(),
                got: inputs.len(),
            });
        }
        check_all_finite(inputs, "input")
    }

    /// Weighted sum of `inputs` plus bias.
    pub fn activity_for(&self, inputs: &[f64]) -> Result<f64, NetworkError> {
        self.ensure_configured()?;
        self.check_inputs(inputs)?;
        let sum: f64 = self.weights.iter().zip(inputs).map(|(w, x)| w * x).sum();
        Ok(sum + self.bias)
    }

    pub fn forward(&self, inputs: &[f64]) -> Result<NeuronTrace, NetworkError> {
        let activity = self.activity_for(inputs)?;
        Ok(NeuronTrace { activity, activation: sigmoid(activity) })
    }

    /// `δ = e · y · (1 − y)` for the upstream error signal `e`.
    pub fn delta_for(&self, trace: &NeuronTrace, e: f64) -> Result<f64, NetworkError> {
        self.ensure_configured()?;
        let e = check_finite(e, "error signal")?;
        Ok(e * sigmoid_derivative(trace.activation))
    }

    /// `−η · δ · x` for every weight and `−η · δ` for the bias.
    pub fn weight_update(
        &self,
        inputs: &[f64],
        delta: f64,
        eta: f64,
    ) -> Result<WeightUpdate, NetworkError> {
        self.ensure_configured()?;
        let eta = check_finite(eta, "learning rate")?;
        if eta <= 0.0 {
            return Err(NetworkError::InvalidValue(format!(
                "learning rate must be positive, got {eta}"
            )));
        }
        let delta = check_finite(delta, "delta")?;
        self.check_inputs(inputs)?;
        Ok(WeightUpdate {
            weights: inputs.iter().map(|x| -eta * delta * x).collect(),
            bias: -eta * delta,
        })
    }

    /// Subtracts `update` from weights and bias.
    pub fn apply_update(&mut self, update: &WeightUpdate) -> Result<(), NetworkError> {
        self.ensure_configured()?;
        if update.weights.len() != self.weights.len() {
            return Err(NetworkError::DimensionMismatch {
                expected: self.weights.len(),
                got: update.weights.len(),
            });
        }
        for (w, dw) in self.weights.iter_mut().zip(&update.weights) {
            *w -= dw;
        }
        self.bias -= update.bias;
        Ok(())
    }

    /// Computes and stores the activity for `inputs`; the inputs are kept
    /// for the weight-update step of this sample.
    pub fn calc_activity(&mut self, inputs: &[f64]) -> Result<f64, NetworkError> {
        let activity = self.activity_for(inputs)?;
        self.inputs = Some(inputs.to_vec());
        self.activity = Some(activity);
        self.activation = None;
        self.delta = None;
        self.pending = None;
        Ok(activity)
    }

    /// Applies the sigmoid to the stored activity, or to `activity` when
    /// given (the override also replaces the stored activity).
    pub fn calc_activation(&mut self, activity: Option<f64>) -> Result<f64, NetworkError> {
        self.ensure_configured()?;
        let activity = match activity {
            Some(a) => check_finite(a, "activity")?,
            None => self
                .activity
                .ok_or_else(|| NetworkError::NotReady("calc_activity has not run".into()))?,
        };
        let activation = sigmoid(activity);
        self.activity = Some(activity);
        self.activation = Some(activation);
        Ok(activation)
    }

    pub fn set_delta(&mut self, e: f64) -> Result<f64, NetworkError> {
        let (activity, activation) = match (self.activity, self.activation) {
            (Some(a), Some(y)) => (a, y),
            _ => return Err(NetworkError::NotReady("calc_activation has not run".into())),
        };
        let delta = self.delta_for(&NeuronTrace { activity, activation }, e)?;
        self.delta = Some(delta);
        Ok(delta)
    }

    pub fn set_delta_weights(&mut self, eta: f64) -> Result<(), NetworkError> {
        let delta = self
            .delta
            .ok_or_else(|| NetworkError::NotReady("set_delta has not run".into()))?;
        let inputs = self
            .inputs
            .as_ref()
            .ok_or_else(|| NetworkError::NotReady("calc_activity has not run".into()))?;
        self.pending = Some(self.weight_update(inputs, delta, eta)?);
        Ok(())
    }

    /// Applies the pending update. Consumes it, so a second call for the
    /// same sample fails.
    pub fn update_weights(&mut self) -> Result<(), NetworkError> {
        self.ensure_configured()?;
        let update = self
            .pending
            .take()
            .ok_or_else(|| NetworkError::NotReady("set_delta_weights has not run".into()))?;
        self.apply_update(&update)
    }
}

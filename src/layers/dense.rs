use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::NetworkError;
use crate::neuron::{Neuron, NeuronTrace, WeightUpdate};

/// One layer's forward values for one sample: the shared input vector and
/// each neuron's activity and activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerTrace {
    pub inputs: Vec<f64>,
    pub neurons: Vec<NeuronTrace>,
}

impl LayerTrace {
    pub fn activations(&self) -> Vec<f64> {
        self.neurons.iter().map(|t| t.activation).collect()
    }
}

/// A fully-connected layer of sigmoid neurons sharing one input vector.
///
/// Neuron order matters: neuron `j` here is the `j`-th input of every neuron
/// in the downstream layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub is_output: bool,
    input_size: usize,
    neurons: Vec<Neuron>,
    /// Raw `target − activation` errors from the last `get_error_vector` call.
    errors: Option<Vec<f64>>,
}

impl Layer {
    /// Builds a layer from a `size × input_size` weight matrix and `size` biases.
    pub fn new(
        is_output: bool,
        size: usize,
        weights: Vec<Vec<f64>>,
        biases: Vec<f64>,
    ) -> Result<Layer, NetworkError> {
        if size == 0 {
            return Err(NetworkError::InvalidTopology("layer has no neurons".into()));
        }
        if weights.len() != size {
            return Err(NetworkError::DimensionMismatch { expected: size, got: weights.len() });
        }
        if biases.len() != size {
            return Err(NetworkError::DimensionMismatch { expected: size, got: biases.len() });
        }
        let input_size = weights[0].len();
        let neurons = weights
            .into_iter()
            .zip(biases)
            .map(|(row, bias)| {
                if row.len() != input_size {
                    return Err(NetworkError::DimensionMismatch {
                        expected: input_size,
                        got: row.len(),
                    });
                }
                Neuron::new(row, bias)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Layer { is_output, input_size, neurons, errors: None })
    }

    /// Builds a layer with weights and biases drawn uniformly from `[0, 1)`.
    pub fn random<R: Rng + ?Sized>(
        is_output: bool,
        size: usize,
        input_size: usize,
        rng: &mut R,
    ) -> Result<Layer, NetworkError> {
        if input_size == 0 {
            return Err(NetworkError::InvalidTopology("layer input dimension is 0".into()));
        }
        let weights = (0..size)
            .map(|_| (0..input_size).map(|_| rng.gen::<f64>()).collect())
            .collect();
        let biases = (0..size).map(|_| rng.gen::<f64>()).collect();
        Layer::new(is_output, size, weights, biases)
    }

    pub fn size(&self) -> usize {
        self.neurons.len()
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    fn check_inputs(&self, inputs: &[f64]) -> Result<(), NetworkError> {
        if inputs.len() != self.input_size {
            return Err(NetworkError::DimensionMismatch {
                expected: self.input_size,
                got: inputs.len(),
            });
        }
        Ok(())
    }

    fn check_len(&self, got: usize) -> Result<(), NetworkError> {
        if got != self.neurons.len() {
            return Err(NetworkError::DimensionMismatch { expected: self.neurons.len(), got });
        }
        Ok(())
    }

    fn ensure_output(&self) -> Result<(), NetworkError> {
        if self.is_output {
            Ok(())
        } else {
            Err(NetworkError::InvalidTopology(
                "operation is only valid on the output layer".into(),
            ))
        }
    }

    // -----------------------------------------------------------------------
    // Explicit path: every value the backward pass needs is passed in
    // -----------------------------------------------------------------------

    pub fn forward(&self, inputs: &[f64]) -> Result<LayerTrace, NetworkError> {
        self.check_inputs(inputs)?;
        let neurons = self
            .neurons
            .iter()
            .map(|n| n.forward(inputs))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LayerTrace { inputs: inputs.to_vec(), neurons })
    }

    /// Output-layer deltas seeded with `target − activation`.
    pub fn output_deltas(
        &self,
        trace: &LayerTrace,
        targets: &[f64],
    ) -> Result<Vec<f64>, NetworkError> {
        self.ensure_output()?;
        self.check_len(trace.neurons.len())?;
        self.check_len(targets.len())?;
        self.neurons
            .iter()
            .zip(&trace.neurons)
            .zip(targets)
            .map(|((n, t), target)| n.delta_for(t, target - t.activation))
            .collect()
    }

    /// Hidden-layer deltas from the downstream layer's weights and deltas.
    pub fn hidden_deltas(
        &self,
        trace: &LayerTrace,
        downstream: &Layer,
        downstream_deltas: &[f64],
    ) -> Result<Vec<f64>, NetworkError> {
        self.check_len(trace.neurons.len())?;
        let errors = self.backpropagated_errors(downstream, downstream_deltas)?;
        self.neurons
            .iter()
            .zip(&trace.neurons)
            .zip(errors)
            .map(|((n, t), e)| n.delta_for(t, e))
            .collect()
    }

    /// Per-neuron `−η · δ · x` updates for this sample.
    pub fn weight_updates(
        &self,
        trace: &LayerTrace,
        deltas: &[f64],
        eta: f64,
    ) -> Result<Vec<WeightUpdate>, NetworkError> {
        self.check_len(deltas.len())?;
        self.neurons
            .iter()
            .zip(deltas)
            .map(|(n, d)| n.weight_update(&trace.inputs, *d, eta))
            .collect()
    }

    pub fn apply_updates(&mut self, updates: &[WeightUpdate]) -> Result<(), NetworkError> {
        self.check_len(updates.len())?;
        self.neurons.iter_mut().zip(updates).try_for_each(|(n, u)| n.apply_update(u))
    }

    /// Error reaching neuron `j`: `Σ_k downstream.weight[k][j] · delta[k]`.
    fn backpropagated_errors(
        &self,
        downstream: &Layer,
        downstream_deltas: &[f64],
    ) -> Result<Vec<f64>, NetworkError> {
        if self.is_output {
            return Err(NetworkError::InvalidTopology(
                "output layer has no downstream layer".into(),
            ));
        }
        if downstream.input_size != self.neurons.len() {
            return Err(NetworkError::DimensionMismatch {
                expected: self.neurons.len(),
                got: downstream.input_size,
            });
        }
        downstream.check_len(downstream_deltas.len())?;
        Ok((0..self.neurons.len())
            .map(|j| {
                downstream
                    .neurons
                    .iter()
                    .zip(downstream_deltas)
                    .map(|(k, d)| k.weights()[j] * d)
                    .sum()
            })
            .collect())
    }

    // -----------------------------------------------------------------------
    // Stepwise path: values are kept on the neurons between calls
    // -----------------------------------------------------------------------

    /// Activations stored by the last stepwise forward pass, in neuron order.
    pub fn activations(&self) -> Result<Vec<f64>, NetworkError> {
        self.neurons
            .iter()
            .map(|n| {
                n.activation()
                    .ok_or_else(|| NetworkError::NotReady("layer has not been fed".into()))
            })
            .collect()
    }

    pub fn get_layer_output_vector(&mut self, inputs: &[f64]) -> Result<Vec<f64>, NetworkError> {
        self.check_inputs(inputs)?;
        self.errors = None;
        self.neurons
            .iter_mut()
            .map(|n| {
                n.calc_activity(inputs)?;
                n.calc_activation(None)
            })
            .collect()
    }

    /// Returns `target − activation` per neuron and remembers it for
    /// `set_output_layer_delta_values`.
    pub fn get_error_vector(&mut self, targets: &[f64]) -> Result<Vec<f64>, NetworkError> {
        self.ensure_output()?;
        self.check_len(targets.len())?;
        let errors = self
            .activations()?
            .iter()
            .zip(targets)
            .map(|(y, t)| t - y)
            .collect::<Vec<_>>();
        self.errors = Some(errors.clone());
        Ok(errors)
    }

    pub fn set_output_layer_delta_values(&mut self) -> Result<(), NetworkError> {
        self.ensure_output()?;
        let errors = self
            .errors
            .as_ref()
            .ok_or_else(|| NetworkError::NotReady("get_error_vector has not run".into()))?;
        for (n, e) in self.neurons.iter_mut().zip(errors) {
            n.set_delta(*e)?;
        }
        Ok(())
    }

    pub fn set_hidden_layer_delta_values(
        &mut self,
        downstream: &Layer,
    ) -> Result<(), NetworkError> {
        let deltas = downstream
            .neurons
            .iter()
            .map(|n| {
                n.delta()
                    .ok_or_else(|| NetworkError::NotReady("downstream deltas not set".into()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let errors = self.backpropagated_errors(downstream, &deltas)?;
        for (n, e) in self.neurons.iter_mut().zip(errors) {
            n.set_delta(e)?;
        }
        Ok(())
    }

    pub fn calc_layer_delta_weights(&mut self, eta: f64) -> Result<(), NetworkError> {
        self.neurons.iter_mut().try_for_each(|n| n.set_delta_weights(eta))
    }

    pub fn update_layer_weights(&mut self) -> Result<(), NetworkError> {
        self.neurons.iter_mut().try_for_each(|n| n.update_weights())
    }
}

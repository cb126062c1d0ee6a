use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::NetworkError;
use crate::layers::{Layer, LayerTrace};
use crate::loss::squared_error;
use crate::neuron::WeightUpdate;

/// Raw pixel intensities are recentred around zero by this amount before
/// they reach the first layer, keeping activities out of sigmoid overflow.
pub const NORMALIZATION_OFFSET: f64 = 128.0;

/// Subtracts [`NORMALIZATION_OFFSET`] from every feature.
pub fn normalize(features: &[f64]) -> Vec<f64> {
    features.iter().map(|x| x - NORMALIZATION_OFFSET).collect()
}

/// Per-layer forward values of one sample, input layer first.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardTrace {
    pub layers: Vec<LayerTrace>,
}

impl ForwardTrace {
    /// Activation of the single output neuron.
    pub fn output(&self) -> f64 {
        self.layers
            .last()
            .and_then(|l| l.neurons.first())
            .map(|t| t.activation)
            .unwrap_or(f64::NAN)
    }

    /// The network input followed by every layer's activations.
    pub fn layer_outputs(&self) -> Vec<Vec<f64>> {
        let input = self.layers.first().map(|l| l.inputs.clone()).unwrap_or_default();
        std::iter::once(input).chain(self.layers.iter().map(LayerTrace::activations)).collect()
    }
}

/// Result of the backward pass for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Backprop {
    /// Deltas per layer, aligned with `ForwardTrace::layers`.
    pub deltas: Vec<Vec<f64>>,
    /// `0.5 · (target − activation)²` of the sample.
    pub squared_error: f64,
}

/// Ordered input → hidden → output stack with one sigmoid output neuron.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    layers: Vec<Layer>,
}

impl Network {
    /// Builds the topology for `length × width` inputs and the given hidden
    /// sizes, with a single-neuron output layer on top. Weights and biases
    /// are uniform in `[0, 1)`.
    pub fn build<R: Rng + ?Sized>(
        input_shape: (usize, usize),
        hidden_layers: &[usize],
        rng: &mut R,
    ) -> Result<Network, NetworkError> {
        if hidden_layers.is_empty() {
            return Err(NetworkError::InvalidTopology("hidden-layer list is empty".into()));
        }
        if let Some(i) = hidden_layers.iter().position(|&s| s == 0) {
            return Err(NetworkError::InvalidTopology(format!("hidden layer {i} has size 0")));
        }
        let input_size = input_shape.0 * input_shape.1;
        if input_size == 0 {
            return Err(NetworkError::InvalidTopology("input shape has no elements".into()));
        }

        let mut layers = Vec::with_capacity(hidden_layers.len() + 1);
        let mut fan_in = input_size;
        for &size in hidden_layers {
            layers.push(Layer::random(false, size, fan_in, rng)?);
            fan_in = size;
        }
        layers.push(Layer::random(true, 1, fan_in, rng)?);
        Network::from_layers(layers)
    }

    /// Wraps pre-built layers after checking that they chain and that only
    /// the last one is a single-neuron output layer.
    pub fn from_layers(layers: Vec<Layer>) -> Result<Network, NetworkError> {
        let Some(last) = layers.last() else {
            return Err(NetworkError::InvalidTopology("network has no layers".into()));
        };
        if layers.len() < 2 {
            return Err(NetworkError::InvalidTopology(
                "at least one hidden layer is required".into(),
            ));
        }
        if !last.is_output || last.size() != 1 {
            return Err(NetworkError::InvalidTopology(
                "last layer must be an output layer with exactly one neuron".into(),
            ));
        }
        if layers[..layers.len() - 1].iter().any(|l| l.is_output) {
            return Err(NetworkError::InvalidTopology(
                "only the last layer may be an output layer".into(),
            ));
        }
        for pair in layers.windows(2) {
            if pair[1].input_size() != pair[0].size() {
                return Err(NetworkError::DimensionMismatch {
                    expected: pair[0].size(),
                    got: pair[1].input_size(),
                });
            }
        }
        Ok(Network { layers })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].input_size()
    }

    /// Forward pass returning every value the backward pass reads. Does not
    /// mutate the network, so it is safe to run from several threads.
    pub fn forward(&self, inputs: &[f64]) -> Result<ForwardTrace, NetworkError> {
        let mut layers: Vec<LayerTrace> = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let trace = match layers.last() {
                Some(prev) => layer.forward(&prev.activations())?,
                None => layer.forward(inputs)?,
            };
            layers.push(trace);
        }
        Ok(ForwardTrace { layers })
    }

    /// Output activation for `inputs`.
    pub fn evaluate(&self, inputs: &[f64]) -> Result<f64, NetworkError> {
        Ok(self.forward(inputs)?.output())
    }

    fn check_trace(&self, trace: &ForwardTrace) -> Result<(), NetworkError> {
        if trace.layers.len() != self.layers.len() {
            return Err(NetworkError::DimensionMismatch {
                expected: self.layers.len(),
                got: trace.layers.len(),
            });
        }
        Ok(())
    }

    /// Deltas for every layer, output first then back through the hidden
    /// layers, computed against the current (not yet updated) weights.
    pub fn backward(&self, trace: &ForwardTrace, target: f64) -> Result<Backprop, NetworkError> {
        self.check_trace(trace)?;
        let last = self.layers.len() - 1;
        let mut deltas = vec![Vec::new(); self.layers.len()];
        deltas[last] = self.layers[last].output_deltas(&trace.layers[last], &[target])?;
        for l in (0..last).rev() {
            let downstream = &self.layers[l + 1];
            deltas[l] = self.layers[l].hidden_deltas(&trace.layers[l], downstream, &deltas[l + 1])?;
        }
        Ok(Backprop { deltas, squared_error: squared_error(target, trace.output()) })
    }

    /// Weight updates for every layer, including the first.
    pub fn calc_delta_weights(
        &self,
        trace: &ForwardTrace,
        backprop: &Backprop,
        eta: f64,
    ) -> Result<Vec<Vec<WeightUpdate>>, NetworkError> {
        self.check_trace(trace)?;
        self.layers
            .iter()
            .zip(&trace.layers)
            .zip(&backprop.deltas)
            .map(|((layer, t), d)| layer.weight_updates(t, d, eta))
            .collect()
    }

    pub fn update_weights(&mut self, updates: &[Vec<WeightUpdate>]) -> Result<(), NetworkError> {
        if updates.len() != self.layers.len() {
            return Err(NetworkError::DimensionMismatch {
                expected: self.layers.len(),
                got: updates.len(),
            });
        }
        self.layers.iter_mut().zip(updates).rev().try_for_each(|(l, u)| l.apply_updates(u))
    }

    /// One online-SGD step on a single (already normalized) sample. Returns
    /// the squared error measured before the update.
    pub fn train_step(
        &mut self,
        inputs: &[f64],
        target: f64,
        eta: f64,
    ) -> Result<f64, NetworkError> {
        let trace = self.forward(inputs)?;
        let backprop = self.backward(&trace, target)?;
        let updates = self.calc_delta_weights(&trace, &backprop, eta)?;
        self.update_weights(&updates)?;
        Ok(backprop.squared_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn tiny() -> Network {
        Network::from_layers(vec![
            Layer::new(false, 1, vec![vec![0.1, 0.2]], vec![0.1]).unwrap(),
            Layer::new(true, 1, vec![vec![0.3]], vec![0.1]).unwrap(),
        ])
        .unwrap()
    }

    fn weights(net: &Network) -> Vec<Vec<f64>> {
        net.layers()
            .iter()
            .flat_map(|l| l.neurons())
            .map(|n| {
                let mut w = n.weights().to_vec();
                w.push(n.bias());
                w
            })
            .collect()
    }

    #[test]
    fn build_wires_layer_dimensions() {
        let mut rng = StdRng::seed_from_u64(1);
        let net = Network::build((4, 3), &[5, 2], &mut rng).unwrap();
        let dims: Vec<(usize, usize)> =
            net.layers().iter().map(|l| (l.input_size(), l.size())).collect();
        assert_eq!(dims, vec![(12, 5), (5, 2), (2, 1)]);
        assert!(net.layers()[2].is_output);
        assert!(!net.layers()[0].is_output);
    }

    #[test]
    fn empty_hidden_list_is_invalid_topology() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            Network::build((2, 2), &[], &mut rng),
            Err(NetworkError::InvalidTopology(_))
        ));
        assert!(matches!(
            Network::build((2, 2), &[3, 0], &mut rng),
            Err(NetworkError::InvalidTopology(_))
        ));
    }

    #[test]
    fn misplaced_output_layer_is_rejected() {
        let layers = vec![
            Layer::new(true, 1, vec![vec![0.1]], vec![0.0]).unwrap(),
            Layer::new(true, 1, vec![vec![0.1]], vec![0.0]).unwrap(),
        ];
        assert!(matches!(Network::from_layers(layers), Err(NetworkError::InvalidTopology(_))));
    }

    #[test]
    fn normalize_recentres_pixels() {
        assert_eq!(normalize(&[0.0, 128.0, 255.0]), vec![-128.0, 0.0, 127.0]);
    }

    #[test]
    fn forward_trace_keeps_every_layer_output() {
        let net = tiny();
        let trace = net.forward(&[0.5, -0.5]).unwrap();
        let outputs = trace.layer_outputs();
        assert_eq!(outputs.len(), 3);
        assert_eq!(outputs[0], vec![0.5, -0.5]);
        assert_eq!(trace.layers[1].inputs, outputs[1]);
        assert_eq!(trace.output(), net.evaluate(&[0.5, -0.5]).unwrap());
    }

    #[test]
    fn train_step_reduces_error_on_the_same_sample() {
        let mut net = tiny();
        let input = [0.5, -0.5];
        let before = net.train_step(&input, 1.0, 0.1).unwrap();
        let y = net.evaluate(&input).unwrap();
        let after = 0.5 * (1.0 - y) * (1.0 - y);
        assert!(after < before, "{after} !< {before}");
    }

    #[test]
    fn train_step_updates_the_first_layer_too() {
        let mut net = tiny();
        let w0 = net.layers()[0].neurons()[0].weights().to_vec();
        net.train_step(&[0.5, -0.5], 0.0, 0.1).unwrap();
        assert_ne!(net.layers()[0].neurons()[0].weights(), w0.as_slice());
    }

    #[test]
    fn interleaved_forward_does_not_change_the_update() {
        let input = [0.5, -0.5];
        let mut a = tiny();
        let mut b = tiny();

        let trace_a = a.forward(&input).unwrap();
        let trace_b = b.forward(&input).unwrap();
        // another sample goes through `b` before its update is computed
        let other = b.forward(&[5.0, 5.0]).unwrap();
        assert_ne!(other.output(), trace_b.output());

        for (net, trace) in [(&mut a, &trace_a), (&mut b, &trace_b)] {
            let backprop = net.backward(trace, 1.0).unwrap();
            let updates = net.calc_delta_weights(trace, &backprop, 0.1).unwrap();
            net.update_weights(&updates).unwrap();
        }
        assert_eq!(weights(&a), weights(&b));

        let mut c = tiny();
        c.train_step(&input, 1.0, 0.1).unwrap();
        assert_eq!(weights(&a), weights(&c));
    }

    #[test]
    fn update_uses_the_trace_inputs() {
        let net = tiny();
        let trace = net.forward(&[0.5, -0.5]).unwrap();
        let backprop = net.backward(&trace, 1.0).unwrap();
        let updates = net.calc_delta_weights(&trace, &backprop, 0.1).unwrap();
        let d = backprop.deltas[0][0];
        assert_eq!(updates[0][0].weights, vec![-0.1 * d * 0.5, -0.1 * d * -0.5]);
        assert_eq!(updates[0][0].bias, -0.1 * d);
    }

    #[test]
    fn trace_from_another_network_is_rejected() {
        let mut rng = StdRng::seed_from_u64(2);
        let deep = Network::build((1, 2), &[2, 2], &mut rng).unwrap();
        let trace = deep.forward(&[0.1, 0.2]).unwrap();
        assert!(matches!(
            tiny().backward(&trace, 1.0),
            Err(NetworkError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn repeated_steps_keep_descending() {
        let mut net = tiny();
        let mut last = f64::INFINITY;
        for _ in 0..20 {
            let e = net.train_step(&[1.0, 2.0], 0.0, 0.5).unwrap();
            assert!(e < last);
            last = e;
        }
    }

    #[test]
    fn wrong_input_size_propagates() {
        let mut net = tiny();
        assert_eq!(
            net.train_step(&[1.0], 1.0, 0.1),
            Err(NetworkError::DimensionMismatch { expected: 2, got: 1 })
        );
    }

    proptest! {
        #[test]
        fn forward_is_deterministic(
            x in proptest::collection::vec(-3.0f64..3.0, 6),
            seed in 0u64..1000,
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let net = Network::build((2, 3), &[4, 3], &mut rng).unwrap();
            let a = net.forward(&x).unwrap().output();
            let b = net.forward(&x).unwrap().output();
            prop_assert_eq!(a, b);
            prop_assert_eq!(a, net.evaluate(&x).unwrap());
        }
    }
}

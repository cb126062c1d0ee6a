pub mod neuron;

pub use neuron::{Neuron, NeuronTrace, WeightUpdate};

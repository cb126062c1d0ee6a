pub mod network;

pub use network::{normalize, Backprop, ForwardTrace, Network, NORMALIZATION_OFFSET};

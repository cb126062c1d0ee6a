pub mod activation;
pub mod data;
pub mod error;
pub mod experiment;
pub mod layers;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod neuron;
pub mod train;

// Convenience re-exports
pub use data::{DatasetProvider, ImageFolderProvider, InMemoryProvider, Sample, SyntheticProvider};
pub use error::{Error, NetworkError};
pub use experiment::{Experiment, ExperimentReport};
pub use layers::Layer;
pub use metrics::{ConfusionMatrix, MetricsSink, TracingSink};
pub use network::Network;
pub use neuron::Neuron;
pub use train::{EpochStats, StopReason, TestOutcome, TrainConfig};

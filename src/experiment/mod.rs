pub mod experiment;

pub use experiment::{Experiment, ExperimentReport};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::Sample;
use crate::error::NetworkError;
use crate::loss::{mean_error, squared_error};
use crate::network::{normalize, Network};

/// Maps an output activation to a binary label: `1.0` at or above
/// `threshold`, `0.0` below.
pub fn classify(activation: f64, threshold: f64) -> f64 {
    if activation >= threshold {
        1.0
    } else {
        0.0
    }
}

/// Parallel per-sample results of the testing pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub truth: Vec<f64>,
    pub predicted: Vec<f64>,
    pub errors: Vec<f64>,
}

impl TestOutcome {
    pub fn len(&self) -> usize {
        self.truth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.truth.is_empty()
    }

    pub fn mean_error(&self) -> f64 {
        mean_error(&self.errors)
    }
}

/// Forward-only pass over `samples`, thresholding each output.
pub fn run_testing(
    network: &Network,
    samples: &[Sample],
    lesion_threshold: f64,
) -> Result<TestOutcome, NetworkError> {
    let mut outcome = TestOutcome::default();
    for s in samples {
        let y = network.evaluate(&normalize(&s.features))?;
        outcome.truth.push(s.label);
        outcome.errors.push(squared_error(s.label, y));
        outcome.predicted.push(classify(y, lesion_threshold));
    }
    info!(samples = outcome.len(), mean_error = outcome.mean_error(), "testing pass done");
    Ok(outcome)
}

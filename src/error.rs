use thiserror::Error;

/// Failures raised by the numeric core (neurons, layers, network).
///
/// None of these are recovered locally: they propagate to whoever drives the
/// training step and abort the current run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    /// An input vector (or weight matrix row) has the wrong length.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A weight, bias, input or hyperparameter is NaN or infinite.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Empty hidden-layer list, zero-sized layer, or a misplaced output layer.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// The neuron holds invalid parameters after a rejected update.
    #[error("neuron not configured: {0}")]
    NotConfigured(String),

    /// A step was invoked before its prerequisite in the per-sample cycle.
    #[error("not ready: {0}")]
    NotReady(String),
}

/// Crate-level error returned by the experiment harness and data providers.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fails with `InvalidValue` unless `value` is a finite number.
pub(crate) fn check_finite(value: f64, what: &str) -> Result<f64, NetworkError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(NetworkError::InvalidValue(format!("{what} is not a finite number ({value})")))
    }
}

/// Fails with `InvalidValue` on the first non-finite element of `values`.
pub(crate) fn check_all_finite(values: &[f64], what: &str) -> Result<(), NetworkError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(NetworkError::InvalidValue(format!(
            "{what}[{i}] is not a finite number ({})",
            values[i]
        ))),
        None => Ok(()),
    }
}

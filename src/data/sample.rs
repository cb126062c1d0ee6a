use serde::{Deserialize, Serialize};

/// One labelled, flattened image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// `1.0` for a lesion, `0.0` otherwise.
    pub label: f64,
    /// Row-major pixel intensities in `0..=255`.
    pub features: Vec<f64>,
    pub id: String,
}

impl Sample {
    pub fn new(label: f64, features: Vec<f64>, id: impl Into<String>) -> Sample {
        Sample { label, features, id: id.into() }
    }
}

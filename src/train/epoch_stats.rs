use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One epoch's outcome, appended to the run history and never changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 0-based epoch index.
    pub epoch: usize,
    /// Mean `0.5 · e²` over the training set, measured before each update.
    pub train_error: f64,
    /// Mean `0.5 · e²` over the validation set after the training pass.
    pub val_error: f64,
    /// Wall-clock time of the training pass alone.
    pub elapsed: Duration,
}

use serde::{Deserialize, Serialize};

/// Why the epoch loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Validation error fell below the configured threshold.
    BelowThreshold,
    /// Validation error did not improve on the previous epoch.
    NoImprovement,
    /// Every allowed epoch ran.
    MaxEpochs,
}

/// Validation-based stopping rule.
///
/// Epoch 0 only sets the baseline. From epoch 1 on, training stops when the
/// validation error is below `threshold` or is not lower than the previous
/// epoch's; otherwise it becomes the new baseline.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    threshold: f64,
    previous: Option<f64>,
}

impl EarlyStopping {
    pub fn new(threshold: f64) -> EarlyStopping {
        EarlyStopping { threshold, previous: None }
    }

    pub fn check(&mut self, epoch: usize, val_error: f64) -> Option<StopReason> {
        if epoch != 0 {
            let previous = self.previous.unwrap_or(f64::INFINITY);
            if val_error < self.threshold {
                return Some(StopReason::BelowThreshold);
            }
            if val_error >= previous {
                return Some(StopReason::NoImprovement);
            }
        }
        self.previous = Some(val_error);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_epoch_never_stops() {
        let mut stop = EarlyStopping::new(1.0);
        assert_eq!(stop.check(0, 0.01), None);
        assert_eq!(stop.check(1, 0.5), Some(StopReason::BelowThreshold));
    }

    #[test]
    fn equal_error_counts_as_no_improvement() {
        let mut stop = EarlyStopping::new(0.0);
        assert_eq!(stop.check(0, 0.4), None);
        assert_eq!(stop.check(1, 0.3), None);
        assert_eq!(stop.check(2, 0.3), Some(StopReason::NoImprovement));
    }
}

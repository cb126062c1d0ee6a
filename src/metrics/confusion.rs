use serde::{Deserialize, Serialize};

use crate::error::NetworkError;

/// 2×2 confusion counts for binary labels (`0.0` negative, `1.0` positive).
///
/// Laid out rows = true label, columns = predicted label:
///
/// ```text
///              pred 0   pred 1
///   true 0  [    tn  ,    fp  ]
///   true 1  [    fn  ,    tp  ]
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

fn as_class(label: f64) -> Result<bool, NetworkError> {
    if label == 1.0 {
        Ok(true)
    } else if label == 0.0 {
        Ok(false)
    } else {
        Err(NetworkError::InvalidValue(format!("label {label} is neither 0 nor 1")))
    }
}

impl ConfusionMatrix {
    pub fn from_labels(truth: &[f64], predicted: &[f64]) -> Result<ConfusionMatrix, NetworkError> {
        if truth.len() != predicted.len() {
            return Err(NetworkError::DimensionMismatch {
                expected: truth.len(),
                got: predicted.len(),
            });
        }
        let mut cm = ConfusionMatrix::default();
        for (t, p) in truth.iter().zip(predicted) {
            match (as_class(*t)?, as_class(*p)?) {
                (false, false) => cm.true_negative += 1,
                (false, true) => cm.false_positive += 1,
                (true, false) => cm.false_negative += 1,
                (true, true) => cm.true_positive += 1,
            }
        }
        Ok(cm)
    }

    pub fn as_array(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negative, self.false_positive],
            [self.false_negative, self.true_positive],
        ]
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    pub fn accuracy(&self) -> Option<f64> {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    /// True-positive rate; `None` when there are no positive samples.
    pub fn sensitivity(&self) -> Option<f64> {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    /// True-negative rate; `None` when there are no negative samples.
    pub fn specificity(&self) -> Option<f64> {
        ratio(self.true_negative, self.true_negative + self.false_positive)
    }
}

fn ratio(num: usize, den: usize) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

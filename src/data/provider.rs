use tracing::debug;

use crate::data::sample::Sample;
use crate::error::{Error, NetworkError, Result};

/// Source of labelled samples for an experiment.
pub trait DatasetProvider {
    /// Returns `count` samples whose features have `length · width` entries.
    /// The order is the order the experiment slices in.
    fn generate(&mut self, length: usize, width: usize, count: usize) -> Result<Vec<Sample>>;
}

/// Serves a fixed list of samples, front first.
pub struct InMemoryProvider {
    samples: Vec<Sample>,
}

impl InMemoryProvider {
    pub fn new(samples: Vec<Sample>) -> InMemoryProvider {
        InMemoryProvider { samples }
    }
}

impl DatasetProvider for InMemoryProvider {
    fn generate(&mut self, length: usize, width: usize, count: usize) -> Result<Vec<Sample>> {
        if self.samples.len() < count {
            return Err(Error::Dataset(format!(
                "requested {count} samples, only {} available",
                self.samples.len()
            )));
        }
        let expected = length * width;
        if let Some(s) = self.samples[..count].iter().find(|s| s.features.len() != expected) {
            return Err(NetworkError::DimensionMismatch { expected, got: s.features.len() }.into());
        }
        Ok(self.samples[..count].to_vec())
    }
}

/// Training, validation and testing slices of one dataset.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub training: Vec<Sample>,
    pub validation: Vec<Sample>,
    pub testing: Vec<Sample>,
}

/// Splits `samples` into contiguous training, validation and testing
/// slices, in that order. Extra samples at the end are ignored.
pub fn partition(
    mut samples: Vec<Sample>,
    training_len: usize,
    validation_len: usize,
    testing_len: usize,
) -> Result<Partition> {
    let needed = training_len + validation_len + testing_len;
    if samples.len() < needed {
        return Err(Error::Dataset(format!("need {needed} samples, got {}", samples.len())));
    }
    samples.truncate(needed);
    let testing = samples.split_off(training_len + validation_len);
    let validation = samples.split_off(training_len);
    let part = Partition { training: samples, validation, testing };

    let slices = [
        ("training", &part.training),
        ("validation", &part.validation),
        ("testing", &part.testing),
    ];
    for (name, slice) in slices {
        let ids: Vec<&str> = slice.iter().map(|s| s.id.as_str()).collect();
        debug!(set = name, ?ids, "partition");
    }
    Ok(part)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(n: usize) -> Vec<Sample> {
        (0..n).map(|i| Sample::new((i % 2) as f64, vec![i as f64; 4], format!("s{i}"))).collect()
    }

    #[test]
    fn partition_is_contiguous_and_ordered() {
        let p = partition(samples(7), 3, 2, 1).unwrap();
        let ids = |v: &[Sample]| v.iter().map(|s| s.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&p.training), vec!["s0", "s1", "s2"]);
        assert_eq!(ids(&p.validation), vec!["s3", "s4"]);
        assert_eq!(ids(&p.testing), vec!["s5"]);
    }

    #[test]
    fn partition_needs_enough_samples() {
        assert!(matches!(partition(samples(3), 2, 1, 1), Err(Error::Dataset(_))));
    }

    #[test]
    fn in_memory_checks_feature_length() {
        let mut provider = InMemoryProvider::new(samples(4));
        assert_eq!(provider.generate(2, 2, 4).unwrap().len(), 4);
        assert!(matches!(
            provider.generate(3, 2, 4),
            Err(Error::Network(NetworkError::DimensionMismatch { expected: 6, got: 4 }))
        ));
        assert!(matches!(provider.generate(2, 2, 5), Err(Error::Dataset(_))));
    }
}

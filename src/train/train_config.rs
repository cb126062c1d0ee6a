use serde::{Deserialize, Serialize};

use crate::error::{Error, NetworkError, Result};

fn default_lesion_threshold() -> f64 {
    0.5
}

/// Hyperparameters and dataset sizes for one experiment.
///
/// Loaded from / saved to JSON so a run can be reproduced from its report.
/// `seed` pins the weight initialization; without it weights come from
/// entropy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Image rows.
    pub input_length: usize,
    /// Image columns.
    pub input_width: usize,
    /// Hidden-layer sizes, input side first.
    pub hidden_layers: Vec<usize>,
    pub learning_rate: f64,
    pub training_len: usize,
    pub validation_len: usize,
    pub testing_len: usize,
    pub max_epochs: usize,
    /// Training stops once the validation error drops below this.
    pub error_threshold: f64,
    /// Output activations at or above this are classified positive.
    #[serde(default = "default_lesion_threshold")]
    pub lesion_threshold: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl TrainConfig {
    pub fn input_shape(&self) -> (usize, usize) {
        (self.input_length, self.input_width)
    }

    /// Total number of samples the dataset provider must produce.
    pub fn sample_count(&self) -> usize {
        self.training_len + self.validation_len + self.testing_len
    }

    /// Rejects configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        if self.hidden_layers.is_empty() {
            return Err(NetworkError::InvalidTopology("hidden-layer list is empty".into()).into());
        }
        if self.hidden_layers.contains(&0) {
            let msg = "hidden-layer sizes must be positive";
            return Err(NetworkError::InvalidTopology(msg.into()).into());
        }
        if self.input_length == 0 || self.input_width == 0 {
            return Err(NetworkError::InvalidTopology("input shape must be positive".into()).into());
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(Error::Config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        for (name, len) in [
            ("training_len", self.training_len),
            ("validation_len", self.validation_len),
            ("testing_len", self.testing_len),
            ("max_epochs", self.max_epochs),
        ] {
            if len == 0 {
                return Err(Error::Config(format!("{name} must be positive")));
            }
        }
        if !self.error_threshold.is_finite() {
            return Err(NetworkError::InvalidValue("error_threshold is not finite".into()).into());
        }
        if !self.lesion_threshold.is_finite() {
            return Err(NetworkError::InvalidValue("lesion_threshold is not finite".into()).into());
        }
        Ok(())
    }

    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load_json(path: &str) -> Result<TrainConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: TrainConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
pub(crate) fn sample_config() -> TrainConfig {
    TrainConfig {
        input_length: 2,
        input_width: 2,
        hidden_layers: vec![3],
        learning_rate: 0.1,
        training_len: 6,
        validation_len: 2,
        testing_len: 2,
        max_epochs: 5,
        error_threshold: 0.0,
        lesion_threshold: 0.5,
        seed: Some(3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesion_threshold_and_seed_default() {
        let json = r#"{
            "input_length": 8, "input_width": 8, "hidden_layers": [4, 2],
            "learning_rate": 0.05, "training_len": 10, "validation_len": 4,
            "testing_len": 4, "max_epochs": 20, "error_threshold": 0.01
        }"#;
        let config: TrainConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.lesion_threshold, 0.5);
        assert_eq!(config.seed, None);
        assert_eq!(config.sample_count(), 18);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_hidden_layers_fail_validation() {
        let config = TrainConfig { hidden_layers: vec![], ..sample_config() };
        assert!(matches!(
            config.validate(),
            Err(Error::Network(NetworkError::InvalidTopology(_)))
        ));
    }

    #[test]
    fn zero_sizes_and_bad_eta_fail_validation() {
        assert!(matches!(
            TrainConfig { testing_len: 0, ..sample_config() }.validate(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            TrainConfig { learning_rate: -0.1, ..sample_config() }.validate(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn json_file_round_trip() {
        let path = std::env::temp_dir().join(format!("ffbp-config-{}.json", std::process::id()));
        let path = path.to_str().unwrap();
        sample_config().save_json(path).unwrap();
        assert_eq!(TrainConfig::load_json(path).unwrap(), sample_config());
        std::fs::remove_file(path).unwrap();
    }
}

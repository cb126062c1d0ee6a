use std::time::Duration;

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::{partition, DatasetProvider, Sample};
use crate::error::{check_finite, NetworkError, Result};
use crate::metrics::{ConfusionMatrix, MetricsSink};
use crate::network::Network;
use crate::train::{run_testing, train_loop, EpochStats, StopReason, TestOutcome, TrainConfig};

/// Everything a finished run produced, ready to be written as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentReport {
    pub config: TrainConfig,
    pub lesion_threshold: f64,
    pub stop_reason: Option<StopReason>,
    pub history: Vec<EpochStats>,
    pub outcome: TestOutcome,
    pub confusion: ConfusionMatrix,
}

/// Training / validation / testing harness around one [`Network`].
///
/// If a run fails, epochs recorded before the failure are still available
/// through [`Experiment::history`].
pub struct Experiment {
    config: TrainConfig,
    network: Network,
    lesion_threshold: f64,
    history: Vec<EpochStats>,
    stop_reason: Option<StopReason>,
    testing: Vec<Sample>,
    outcome: Option<TestOutcome>,
}

impl Experiment {
    /// Validates `config` and builds a randomly initialized network for it.
    pub fn new(config: TrainConfig) -> Result<Experiment> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let network = Network::build(config.input_shape(), &config.hidden_layers, &mut rng)?;
        Ok(Experiment::with_network(config, network))
    }

    /// Uses a caller-built network, e.g. one with known weights.
    pub fn with_network(config: TrainConfig, network: Network) -> Experiment {
        Experiment {
            lesion_threshold: config.lesion_threshold,
            config,
            network,
            history: Vec::new(),
            stop_reason: None,
            testing: Vec::new(),
            outcome: None,
        }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn history(&self) -> &[EpochStats] {
        &self.history
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn outcome(&self) -> Option<&TestOutcome> {
        self.outcome.as_ref()
    }

    /// Training-pass wall time of every completed epoch.
    pub fn computing_time(&self) -> Vec<Duration> {
        self.history.iter().map(|s| s.elapsed).collect()
    }

    pub fn lesion_threshold(&self) -> f64 {
        self.lesion_threshold
    }

    /// Changes the classification cutoff for subsequent testing passes.
    pub fn set_lesion_threshold(&mut self, threshold: f64) -> Result<(), NetworkError> {
        self.lesion_threshold = check_finite(threshold, "lesion threshold")?;
        Ok(())
    }

    /// Fetches the dataset, trains with early stopping, then tests.
    pub fn run(
        &mut self,
        provider: &mut dyn DatasetProvider,
        sink: &mut dyn MetricsSink,
    ) -> Result<&TestOutcome> {
        let (length, width) = self.config.input_shape();
        let samples = provider.generate(length, width, self.config.sample_count())?;
        let part = partition(
            samples,
            self.config.training_len,
            self.config.validation_len,
            self.config.testing_len,
        )?;

        self.history.clear();
        self.stop_reason = None;
        self.outcome = None;
        self.testing = part.testing;

        info!(
            training = part.training.len(),
            validation = part.validation.len(),
            testing = self.testing.len(),
            "starting experiment"
        );
        let reason = train_loop(
            &mut self.network,
            &part.training,
            &part.validation,
            self.config.learning_rate,
            self.config.max_epochs,
            self.config.error_threshold,
            &mut self.history,
            sink,
        )?;
        self.stop_reason = Some(reason);
        info!(epochs = self.history.len(), ?reason, "training finished");

        self.retest(sink)
    }

    /// Re-runs the testing pass on the last testing slice, using the current
    /// lesion threshold.
    pub fn retest(&mut self, sink: &mut dyn MetricsSink) -> Result<&TestOutcome> {
        let outcome = run_testing(&self.network, &self.testing, self.lesion_threshold)?;
        sink.record_outcome(&outcome);
        Ok(&*self.outcome.insert(outcome))
    }

    pub fn confusion_matrix(&self) -> Result<ConfusionMatrix, NetworkError> {
        let outcome = self
            .outcome
            .as_ref()
            .ok_or_else(|| NetworkError::NotReady("no testing pass has run".into()))?;
        ConfusionMatrix::from_labels(&outcome.truth, &outcome.predicted)
    }

    pub fn report(&self) -> Result<ExperimentReport> {
        let confusion = self.confusion_matrix()?;
        Ok(ExperimentReport {
            config: self.config.clone(),
            lesion_threshold: self.lesion_threshold,
            stop_reason: self.stop_reason,
            history: self.history.clone(),
            outcome: self.outcome.clone().unwrap_or_default(),
            confusion,
        })
    }
}

impl ExperimentReport {
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DatasetProvider, InMemoryProvider, SyntheticProvider};
    use crate::error::Error;
    use crate::layers::Layer;
    use crate::metrics::NullSink;
    use crate::train::train_config::sample_config;

    #[test]
    fn full_run_fills_history_and_outcome() {
        let config = sample_config();
        let mut exp = Experiment::new(config.clone()).unwrap();
        let outcome = exp.run(&mut SyntheticProvider::new(5), &mut NullSink).unwrap().clone();

        assert_eq!(outcome.len(), config.testing_len);
        assert_eq!(outcome.predicted.len(), outcome.errors.len());
        assert!(!exp.history().is_empty() && exp.history().len() <= config.max_epochs);
        assert_eq!(exp.computing_time().len(), exp.history().len());
        assert!(exp.stop_reason().is_some());
        assert_eq!(exp.confusion_matrix().unwrap().total(), config.testing_len);
    }

    #[test]
    fn threshold_change_only_affects_later_tests() {
        let mut exp = Experiment::new(sample_config()).unwrap();
        exp.run(&mut SyntheticProvider::new(5), &mut NullSink).unwrap();
        let before = exp.outcome().unwrap().clone();

        exp.set_lesion_threshold(2.0).unwrap();
        assert_eq!(exp.outcome().unwrap(), &before);

        let after = exp.retest(&mut NullSink).unwrap();
        assert!(after.predicted.iter().all(|p| *p == 0.0));
        assert_eq!(after.errors, before.errors);
    }

    #[test]
    fn non_finite_threshold_is_rejected() {
        let mut exp = Experiment::new(sample_config()).unwrap();
        assert!(matches!(exp.set_lesion_threshold(f64::NAN), Err(NetworkError::InvalidValue(_))));
    }

    #[test]
    fn confusion_before_testing_is_not_ready() {
        let exp = Experiment::new(sample_config()).unwrap();
        assert!(matches!(exp.confusion_matrix(), Err(NetworkError::NotReady(_))));
    }

    #[test]
    fn bad_validation_sample_aborts_run() {
        let config =
            TrainConfig { training_len: 2, validation_len: 2, testing_len: 1, ..sample_config() };
        let good = |i: usize| {
            Sample::new((i % 2) as f64, vec![100.0, 140.0, 90.0, 200.0], format!("ok{i}"))
        };
        // the second validation sample carries a NaN pixel
        let mut samples: Vec<Sample> = (0..5).map(good).collect();
        samples[3].features[1] = f64::NAN;

        let network = Network::from_layers(vec![
            Layer::new(false, 1, vec![vec![0.01; 4]], vec![0.0]).unwrap(),
            Layer::new(true, 1, vec![vec![0.5]], vec![0.0]).unwrap(),
        ])
        .unwrap();
        let mut exp = Experiment::with_network(config, network);
        let err = exp.run(&mut InMemoryProvider::new(samples), &mut NullSink).unwrap_err();
        assert!(matches!(err, Error::Network(NetworkError::InvalidValue(_))));
        assert!(exp.history().is_empty());
        assert!(exp.outcome().is_none());
    }

    #[test]
    fn failed_testing_pass_keeps_epoch_history() {
        let config =
            TrainConfig { training_len: 2, validation_len: 2, testing_len: 1, ..sample_config() };
        let mut samples = SyntheticProvider::new(4).generate(2, 2, 5).unwrap();
        samples[4].features[0] = f64::INFINITY;

        let mut exp = Experiment::new(config).unwrap();
        assert!(exp.run(&mut InMemoryProvider::new(samples), &mut NullSink).is_err());
        assert!(!exp.history().is_empty());
        assert!(exp.stop_reason().is_some());
        assert!(exp.outcome().is_none());
    }

    #[test]
    fn report_mirrors_the_run() {
        let mut exp = Experiment::new(sample_config()).unwrap();
        exp.run(&mut SyntheticProvider::new(2), &mut NullSink).unwrap();
        let report = exp.report().unwrap();
        assert_eq!(report.history, exp.history());
        assert_eq!(report.confusion, exp.confusion_matrix().unwrap());
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"stop_reason\""));
    }
}

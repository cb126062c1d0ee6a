use std::time::Instant;

use tracing::{debug, info, warn};

use crate::data::Sample;
use crate::error::NetworkError;
use crate::loss::{mean_error, squared_error};
use crate::metrics::MetricsSink;
use crate::network::{normalize, Network};
use crate::train::early_stopping::{EarlyStopping, StopReason};
use crate::train::epoch_stats::EpochStats;

// ---------------------------------------------------------------------------
// Epoch control
// ---------------------------------------------------------------------------

/// Drives up to `max_epochs` calls of `run_epoch`, appending each record to
/// `history` and handing it to `sink`, until `stopper` fires.
///
/// Records already pushed stay in `history` if a later epoch fails.
pub fn run_epochs<F>(
    max_epochs: usize,
    stopper: &mut EarlyStopping,
    history: &mut Vec<EpochStats>,
    sink: &mut dyn MetricsSink,
    mut run_epoch: F,
) -> Result<StopReason, NetworkError>
where
    F: FnMut(usize) -> Result<EpochStats, NetworkError>,
{
    for epoch in 0..max_epochs {
        let stats = run_epoch(epoch)?;
        let val_error = stats.val_error;
        sink.record_epoch(&stats);
        history.push(stats);

        if let Some(reason) = stopper.check(epoch, val_error) {
            warn!(epoch, val_error, ?reason, "stopping early");
            return Ok(reason);
        }
    }
    Ok(StopReason::MaxEpochs)
}

/// Trains `network` online over `training`, validating on `validation`
/// after every epoch.
#[allow(clippy::too_many_arguments)]
pub fn train_loop(
    network: &mut Network,
    training: &[Sample],
    validation: &[Sample],
    learning_rate: f64,
    max_epochs: usize,
    error_threshold: f64,
    history: &mut Vec<EpochStats>,
    sink: &mut dyn MetricsSink,
) -> Result<StopReason, NetworkError> {
    let mut stopper = EarlyStopping::new(error_threshold);
    run_epochs(max_epochs, &mut stopper, history, sink, |epoch| {
        let t_start = Instant::now();
        let train_error = run_one_epoch(network, training, learning_rate)?;
        let elapsed = t_start.elapsed();
        info!(epoch, train_error, ?elapsed, "training pass done");

        let val_error = evaluation_error(network, validation)?;
        info!(epoch, val_error, "validation pass done");

        Ok(EpochStats { epoch, train_error, val_error, elapsed })
    })
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

/// One online-SGD pass in dataset order; returns the mean training error.
pub fn run_one_epoch(
    network: &mut Network,
    samples: &[Sample],
    learning_rate: f64,
) -> Result<f64, NetworkError> {
    let errors = samples
        .iter()
        .map(|s| -> Result<f64, NetworkError> {
            let e = network.train_step(&normalize(&s.features), s.label, learning_rate)?;
            debug!(id = %s.id, error = e, "trained");
            Ok(e)
        })
        .collect::<Result<Vec<_>, NetworkError>>()?;
    Ok(mean_error(&errors))
}

/// Mean error over `samples` without touching the weights.
pub fn evaluation_error(network: &Network, samples: &[Sample]) -> Result<f64, NetworkError> {
    let errors = samples
        .iter()
        .map(|s| -> Result<f64, NetworkError> {
            Ok(squared_error(s.label, network.evaluate(&normalize(&s.features))?))
        })
        .collect::<Result<Vec<_>, NetworkError>>()?;
    Ok(mean_error(&errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::NullSink;
    use std::time::Duration;

    fn scripted(
        val_errors: &[f64],
        threshold: f64,
        max_epochs: usize,
    ) -> (StopReason, Vec<EpochStats>) {
        let mut history = Vec::new();
        let mut stopper = EarlyStopping::new(threshold);
        let reason = run_epochs(max_epochs, &mut stopper, &mut history, &mut NullSink, |epoch| {
            Ok(EpochStats {
                epoch,
                train_error: 1.0,
                val_error: val_errors[epoch],
                elapsed: Duration::ZERO,
            })
        })
        .unwrap();
        (reason, history)
    }

    #[test]
    fn rising_validation_error_stops_after_third_epoch() {
        let (reason, history) = scripted(&[0.9, 0.5, 0.6, 0.1], 0.0, 10);
        assert_eq!(reason, StopReason::NoImprovement);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn error_below_threshold_stops_after_second_epoch() {
        let (reason, history) = scripted(&[0.9, 0.05, 0.01], 0.1, 10);
        assert_eq!(reason, StopReason::BelowThreshold);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn improving_run_exhausts_max_epochs() {
        let (reason, history) = scripted(&[0.9, 0.8, 0.7, 0.6], 0.0, 4);
        assert_eq!(reason, StopReason::MaxEpochs);
        assert_eq!(history.iter().map(|s| s.epoch).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn failing_epoch_keeps_earlier_history() {
        let mut history = Vec::new();
        let mut stopper = EarlyStopping::new(0.0);
        let result = run_epochs(5, &mut stopper, &mut history, &mut NullSink, |epoch| {
            if epoch == 2 {
                return Err(NetworkError::NotReady("boom".into()));
            }
            Ok(EpochStats {
                epoch,
                train_error: 0.0,
                val_error: 1.0 - epoch as f64 * 0.1,
                elapsed: Duration::ZERO,
            })
        });
        assert!(result.is_err());
        assert_eq!(history.len(), 2);
    }
}

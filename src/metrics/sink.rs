use std::sync::mpsc;

use tracing::{debug, info};

use crate::train::{EpochStats, TestOutcome};

/// Receives per-epoch records and the final test outcome of a run.
pub trait MetricsSink {
    fn record_epoch(&mut self, stats: &EpochStats);

    fn record_outcome(&mut self, _outcome: &TestOutcome) {}
}

/// Discards everything.
pub struct NullSink;

impl MetricsSink for NullSink {
    fn record_epoch(&mut self, _stats: &EpochStats) {}
}

/// Logs every record through `tracing`.
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn record_epoch(&mut self, stats: &EpochStats) {
        info!(
            epoch = stats.epoch,
            train_error = stats.train_error,
            val_error = stats.val_error,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "epoch complete"
        );
    }

    fn record_outcome(&mut self, outcome: &TestOutcome) {
        info!(samples = outcome.len(), mean_error = outcome.mean_error(), "test outcome");
    }
}

/// Progress channel: each epoch record is sent to the receiver. Once the
/// receiver is gone, records are dropped and training carries on.
impl MetricsSink for mpsc::Sender<EpochStats> {
    fn record_epoch(&mut self, stats: &EpochStats) {
        if self.send(stats.clone()).is_err() {
            debug!(epoch = stats.epoch, "progress receiver disconnected");
        }
    }
}

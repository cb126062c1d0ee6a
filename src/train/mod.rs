pub mod early_stopping;
pub mod epoch_stats;
pub mod loop_fn;
pub mod test_pass;
pub mod train_config;

pub use early_stopping::{EarlyStopping, StopReason};
pub use epoch_stats::EpochStats;
pub use loop_fn::{evaluation_error, run_epochs, run_one_epoch, train_loop};
pub use test_pass::{classify, run_testing, TestOutcome};
pub use train_config::TrainConfig;

pub mod confusion;
pub mod sink;

pub use confusion::ConfusionMatrix;
pub use sink::{MetricsSink, NullSink, TracingSink};

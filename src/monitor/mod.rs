//! Metric logging
//!
//! Scores are logged as [`MetricRecord`]s keyed `Train/<name>` or
//! `Validation/<name>` to any [`MetricsSink`]: structured `tracing` events,
//! a JSON-lines file, or memory for tests.

mod record;
mod sink;

pub use record::{record_from_metrics, MetricRecord, TRAIN_PREFIX, VALIDATION_PREFIX};
pub use sink::{FanOutSink, InMemorySink, JsonLinesSink, MetricsSink, TracingSink};

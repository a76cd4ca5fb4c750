//! ReviewLens Telemetry
//!
//! In-process counters and Prometheus metric names for the sentiment
//! service. Every `record_*` call updates the local snapshot and the global
//! `metrics` recorder, if one is installed.

pub mod metrics;

pub use crate::metrics::{describe_metrics, MetricsCollector, MetricsSnapshot};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::metrics::{MetricsCollector, MetricsSnapshot};
}

//! Metrics collection and reporting

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const CLASSIFICATIONS_TOTAL: &str = "reviewlens_classifications_total";
pub const FEEDBACK_TOTAL: &str = "reviewlens_feedback_total";
pub const MODEL_SWAPS_TOTAL: &str = "reviewlens_model_swaps_total";
pub const ERRORS_TOTAL: &str = "reviewlens_errors_total";
pub const CLASSIFY_LATENCY_US: &str = "reviewlens_classify_latency_us";

/// Register descriptions with the installed recorder
pub fn describe_metrics() {
    metrics::describe_counter!(
        CLASSIFICATIONS_TOTAL,
        "Total number of documents classified, by label"
    );
    metrics::describe_counter!(
        FEEDBACK_TOTAL,
        "Total number of feedback updates applied, by verdict"
    );
    metrics::describe_counter!(MODEL_SWAPS_TOTAL, "Total number of successful model swaps");
    metrics::describe_counter!(ERRORS_TOTAL, "Total number of errors by kind");
    metrics::describe_histogram!(
        CLASSIFY_LATENCY_US,
        metrics::Unit::Microseconds,
        "Classification latency in microseconds"
    );
}

/// Metrics collector for the sentiment service
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    classifications: AtomicU64,
    feedback: AtomicU64,
    model_swaps: AtomicU64,
    errors: AtomicU64,
    classify_latency_us: AtomicU64,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                classifications: AtomicU64::new(0),
                feedback: AtomicU64::new(0),
                model_swaps: AtomicU64::new(0),
                errors: AtomicU64::new(0),
                classify_latency_us: AtomicU64::new(0),
            }),
        }
    }

    /// Record one classified document
    pub fn record_classification(&self, label: &'static str, latency_us: u64) {
        self.inner.classifications.fetch_add(1, Ordering::Relaxed);
        self.inner
            .classify_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);

        metrics::counter!(CLASSIFICATIONS_TOTAL, "label" => label).increment(1);
        metrics::histogram!(CLASSIFY_LATENCY_US).record(latency_us as f64);
    }

    /// Record one applied feedback update
    pub fn record_feedback(&self, verdict: &'static str) {
        self.inner.feedback.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(FEEDBACK_TOTAL, "verdict" => verdict).increment(1);
    }

    /// Record a successful model swap
    pub fn record_model_swap(&self, model: &str) {
        self.inner.model_swaps.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(MODEL_SWAPS_TOTAL, "model" => model.to_string()).increment(1);
    }

    /// Record an error by kind
    pub fn record_error(&self, kind: &'static str) {
        self.inner.errors.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(ERRORS_TOTAL, "kind" => kind).increment(1);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            classifications: self.inner.classifications.load(Ordering::Relaxed),
            feedback: self.inner.feedback.load(Ordering::Relaxed),
            model_swaps: self.inner.model_swaps.load(Ordering::Relaxed),
            errors: self.inner.errors.load(Ordering::Relaxed),
            classify_latency_us: self.inner.classify_latency_us.load(Ordering::Relaxed),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub classifications: u64,
    pub feedback: u64,
    pub model_swaps: u64,
    pub errors: u64,
    pub classify_latency_us: u64,
}

impl MetricsSnapshot {
    /// Average classification latency
    pub fn avg_classify_latency_us(&self) -> u64 {
        if self.classifications == 0 {
            0
        } else {
            self.classify_latency_us / self.classifications
        }
    }

    /// Share of operations that failed
    pub fn error_rate(&self) -> f64 {
        let total = self.classifications + self.feedback + self.errors;
        if total == 0 {
            0.0
        } else {
            self.errors as f64 / total as f64
        }
    }
}

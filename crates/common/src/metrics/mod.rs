//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Runweave metrics
pub const METRICS_PREFIX: &str = "runweave";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.00,
];

/// Buckets for upstream model calls (typically slower)
pub const UPSTREAM_BUCKETS: &[f64] = &[
    0.050, 0.100, 0.250, 0.500, 1.000, 2.000, 5.000, 10.00, 30.00,
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{}_retrieval_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of retrieval pipeline invocations"
    );

    describe_histogram!(
        format!("{}_retrieval_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end retrieval pipeline latency in seconds"
    );

    describe_counter!(
        format!("{}_candidates_retrieved_total", METRICS_PREFIX),
        Unit::Count,
        "Candidates returned by knowledge-store searches, pre-dedup"
    );

    describe_counter!(
        format!("{}_grading_fail_open_total", METRICS_PREFIX),
        Unit::Count,
        "Grading calls recovered by the fail-open default"
    );

    describe_counter!(
        format!("{}_sources_returned_total", METRICS_PREFIX),
        Unit::Count,
        "Source documents returned to the generation step"
    );
}

/// Record one retrieval pipeline invocation
pub fn record_retrieval(duration_secs: f64, candidates: usize, sources: usize) {
    counter!(format!("{}_retrieval_queries_total", METRICS_PREFIX)).increment(1);
    histogram!(format!("{}_retrieval_duration_seconds", METRICS_PREFIX)).record(duration_secs);
    counter!(format!("{}_candidates_retrieved_total", METRICS_PREFIX))
        .increment(candidates as u64);
    counter!(format!("{}_sources_returned_total", METRICS_PREFIX)).increment(sources as u64);
}

/// Record one fail-open grading recovery
pub fn record_grading_fail_open() {
    counter!(format!("{}_grading_fail_open_total", METRICS_PREFIX)).increment(1);
}

/// Simple scope timer that records into a histogram on drop
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        histogram!(self.name.clone()).record(self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        register_metrics();
        register_metrics();
    }

    #[test]
    fn test_timer_records_on_drop() {
        let timer = Timer::new(format!("{}_test_duration_seconds", METRICS_PREFIX));
        drop(timer);
    }
}

//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with SLO-aligned histograms
//! and standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Auditbase metrics
pub const METRICS_PREFIX: &str = "auditbase";

/// SLO-aligned histogram buckets for request latency (in seconds)
/// Targets: P50 < 50ms, P99 < 150ms
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms - P50 target
    0.075,  // 75ms
    0.100,  // 100ms
    0.150,  // 150ms - P99 target
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
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

    // Attachment metrics
    describe_counter!(
        format!("{}_attachments_uploaded_total", METRICS_PREFIX),
        Unit::Count,
        "Total attachments uploaded"
    );

    describe_counter!(
        format!("{}_attachment_bytes_total", METRICS_PREFIX),
        Unit::Bytes,
        "Total uploaded attachment bytes"
    );

    describe_counter!(
        format!("{}_attachments_served_total", METRICS_PREFIX),
        Unit::Count,
        "Total attachments served"
    );

    describe_counter!(
        format!("{}_attachments_deleted_total", METRICS_PREFIX),
        Unit::Count,
        "Total attachments deleted"
    );

    describe_counter!(
        format!("{}_storage_drift_total", METRICS_PREFIX),
        Unit::Count,
        "Attachment metadata served or deleted with no backing file on disk"
    );

    describe_counter!(
        format!("{}_file_cleanup_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Backing-file deletions that failed for reasons other than absence"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record a completed upload batch
pub fn record_upload(resource: &str, files: usize, bytes: u64) {
    counter!(
        format!("{}_attachments_uploaded_total", METRICS_PREFIX),
        "resource" => resource.to_string()
    )
    .increment(files as u64);

    counter!(
        format!("{}_attachment_bytes_total", METRICS_PREFIX),
        "resource" => resource.to_string()
    )
    .increment(bytes);
}

/// Record an attachment download or inline view
pub fn record_serve(resource: &str) {
    counter!(
        format!("{}_attachments_served_total", METRICS_PREFIX),
        "resource" => resource.to_string()
    )
    .increment(1);
}

/// Record an attachment deletion
pub fn record_delete(resource: &str) {
    counter!(
        format!("{}_attachments_deleted_total", METRICS_PREFIX),
        "resource" => resource.to_string()
    )
    .increment(1);
}

/// Record metadata observed without its backing file
pub fn record_storage_drift(resource: &str) {
    counter!(
        format!("{}_storage_drift_total", METRICS_PREFIX),
        "resource" => resource.to_string()
    )
    .increment(1);
}

/// Record a backing-file deletion failure that was not simple absence
pub fn record_cleanup_failure(resource: &str) {
    counter!(
        format!("{}_file_cleanup_failures_total", METRICS_PREFIX),
        "resource" => resource.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets() {
        // Verify buckets are sorted and contain SLO targets
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }

        assert!(LATENCY_BUCKETS.contains(&0.050));
        assert!(LATENCY_BUCKETS.contains(&0.150));
    }

    #[test]
    fn test_request_metrics() {
        let metrics = RequestMetrics::start("GET", "/api/audits");
        std::thread::sleep(std::time::Duration::from_millis(10));
        metrics.finish(200);
        // Just verify it runs without panic
    }
}

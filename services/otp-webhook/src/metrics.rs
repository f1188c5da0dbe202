//! Prometheus metrics exposition
//!
//! Webhook-surface metrics:
//!
//! - `otp_webhook_requests_total` (counter): labels `endpoint`, `outcome`
//! - `otp_webhook_request_duration_seconds` (histogram): label `endpoint`
//!
//! The core crate additionally emits `otp_issue_total`, `otp_verify_total`,
//! `otp_swept_records_total`, and the `otp_pending_records` gauge through
//! the same recorder. Labels carry only outcome categories — never subject
//! ids, phone numbers, or codes.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
///
/// Buckets cover 5ms..10s: webhook handlers are bounded by the 5 s SMS
/// send timeout, so anything beyond that is pathological.
pub fn install_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Full(
                "otp_webhook_request_duration_seconds".to_string(),
            ),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )
        .expect("failed to set histogram buckets")
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Record a completed webhook request with endpoint and outcome labels.
pub fn record_request(endpoint: &'static str, outcome: &'static str, duration_secs: f64) {
    metrics::counter!(
        "otp_webhook_requests_total",
        "endpoint" => endpoint,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("otp_webhook_request_duration_seconds", "endpoint" => endpoint)
        .record(duration_secs);
}

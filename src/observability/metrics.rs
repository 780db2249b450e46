//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mock_requests_total` (counter): requests served, by method and status
//! - `mock_request_duration_seconds` (histogram): handling latency, by method
//! - `mock_rule_resolutions_total` (counter): outcome = rule | default | error
//! - `mock_rule_refreshes_total` (counter): completed bulk rebuilds
//! - `mock_rule_files_cached` (gauge): domains currently cached
//! - `mock_rule_files_skipped_total` (counter): rule files rejected by a rebuild

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
///
/// Must be called from inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a served request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "mock_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("mock_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record how a request was resolved.
pub fn record_resolution(outcome: &'static str) {
    ::metrics::counter!("mock_rule_resolutions_total", "outcome" => outcome).increment(1);
}

/// Record a completed bulk rebuild that cached `loaded` rule files.
pub fn record_rule_refresh(loaded: usize) {
    ::metrics::counter!("mock_rule_refreshes_total").increment(1);
    record_cached_rule_files(loaded);
}

pub fn record_cached_rule_files(count: usize) {
    ::metrics::gauge!("mock_rule_files_cached").set(count as f64);
}

pub fn record_rule_file_skipped() {
    ::metrics::counter!("mock_rule_files_skipped_total").increment(1);
}

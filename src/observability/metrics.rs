//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define monitor metrics (probes, latency, alerts, store failures)
//! - Expose Prometheus-compatible metrics endpoint
//! - Serve as the observability hook for swallowed downstream failures
//!
//! # Metrics
//! - `monitor_probes_total` (counter): probes by classified state
//! - `monitor_probe_latency_ms` (histogram): probe round-trip latency
//! - `monitor_probes_in_flight` (gauge): probes currently running
//! - `monitor_pass_duration_seconds` (histogram): full pass duration
//! - `monitor_targets` (gauge): targets probed in the last pass
//! - `monitor_pass_skipped_total` (counter): passes skipped on target-list errors
//! - `monitor_alerts_total` (counter): alerts by channel, severity, outcome
//! - `monitor_store_failures_total` (counter): swallowed store errors by operation
//! - `monitor_throttle_entries` (gauge): tracked throttle keys
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; a no-op when no exporter is installed
//! - Labels are low-cardinality (no URLs)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe(state: &'static str, latency_ms: Option<u64>) {
    metrics::counter!("monitor_probes_total", "state" => state).increment(1);
    if let Some(latency) = latency_ms {
        metrics::histogram!("monitor_probe_latency_ms").record(latency as f64);
    }
}

pub fn record_in_flight(delta: f64) {
    metrics::gauge!("monitor_probes_in_flight").increment(delta);
}

pub fn record_pass(targets: usize, start: Instant) {
    metrics::histogram!("monitor_pass_duration_seconds").record(start.elapsed().as_secs_f64());
    metrics::gauge!("monitor_targets").set(targets as f64);
}

pub fn record_pass_skipped() {
    metrics::counter!("monitor_pass_skipped_total").increment(1);
}

pub fn record_alert(channel: &'static str, severity: &'static str, delivered: bool) {
    let outcome = if delivered { "sent" } else { "failed" };
    metrics::counter!(
        "monitor_alerts_total",
        "channel" => channel,
        "severity" => severity,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_store_failure(operation: &'static str) {
    metrics::counter!("monitor_store_failures_total", "operation" => operation).increment(1);
}

pub fn record_throttle_entries(count: usize) {
    metrics::gauge!("monitor_throttle_entries").set(count as f64);
}

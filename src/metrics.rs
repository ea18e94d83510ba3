//! Metrics and telemetry for report search
//!
//! Prometheus metrics for report requests, archive fetches, path searches and
//! the gateway cache.
//!
//! Recording is process-wide and on by default; [`init_metrics`] applies the
//! `monitoring.metrics_enabled` setting.

use crate::config::MonitoringConfig;
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};
use std::sync::atomic::{AtomicBool, Ordering};

static METRICS_ENABLED: AtomicBool = AtomicBool::new(true);

lazy_static! {
    /// Report requests by report name and status
    pub static ref REPORT_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "reports_requests_total",
        "Total report requests",
        &["report", "status"]
    ).expect("register reports_requests_total");

    /// Archive fetches by dataset and status
    pub static ref GATEWAY_FETCHES_TOTAL: CounterVec = register_counter_vec!(
        "reports_gateway_fetches_total",
        "Total archive gateway fetches",
        &["dataset", "status"]
    ).expect("register reports_gateway_fetches_total");

    /// Archive fetch latency
    pub static ref GATEWAY_FETCH_DURATION: HistogramVec = register_histogram_vec!(
        "reports_gateway_fetch_duration_seconds",
        "Archive gateway fetch latency in seconds",
        &["dataset"],
        vec![0.0005, 0.001, 0.01, 0.1, 0.5, 1.0, 5.0]
    ).expect("register reports_gateway_fetch_duration_seconds");

    /// Path searches by outcome (found, not_found)
    pub static ref PATH_SEARCHES_TOTAL: CounterVec = register_counter_vec!(
        "reports_path_searches_total",
        "Total label path searches",
        &["outcome"]
    ).expect("register reports_path_searches_total");

    /// Gateway cache lookups by result (hit, miss)
    pub static ref CACHE_LOOKUPS_TOTAL: CounterVec = register_counter_vec!(
        "reports_cache_lookups_total",
        "Total gateway cache lookups",
        &["result"]
    ).expect("register reports_cache_lookups_total");
}

/// Apply the monitoring settings to metric recording
pub fn init_metrics(config: &MonitoringConfig) {
    set_enabled(config.metrics_enabled);
}

/// Turn recording on or off for the whole process
pub fn set_enabled(enabled: bool) {
    METRICS_ENABLED.store(enabled, Ordering::Relaxed);
}

/// True when `record_*` calls update the registry
#[inline]
pub fn is_enabled() -> bool {
    METRICS_ENABLED.load(Ordering::Relaxed)
}

/// Get metrics in Prometheus text format
pub fn gather_metrics() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("Failed to encode metrics: {}", e))?;

    String::from_utf8(buffer).map_err(|e| format!("Metrics contain invalid UTF-8: {}", e))
}

/// Record a report request
#[inline]
pub fn record_report(report: &str, success: bool) {
    if !is_enabled() {
        return;
    }
    let status = if success { "success" } else { "error" };
    REPORT_REQUESTS_TOTAL
        .with_label_values(&[report, status])
        .inc();
}

/// Record an archive fetch
#[inline]
pub fn record_fetch(dataset: &str, duration_secs: f64, success: bool) {
    if !is_enabled() {
        return;
    }
    let status = if success { "success" } else { "error" };

    GATEWAY_FETCHES_TOTAL
        .with_label_values(&[dataset, status])
        .inc();

    GATEWAY_FETCH_DURATION
        .with_label_values(&[dataset])
        .observe(duration_secs);
}

/// Record the outcome of one path search branch
#[inline]
pub fn record_search(found: bool) {
    if !is_enabled() {
        return;
    }
    let outcome = if found { "found" } else { "not_found" };
    PATH_SEARCHES_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record a gateway cache lookup
#[inline]
pub fn record_cache_lookup(hit: bool) {
    if !is_enabled() {
        return;
    }
    let result = if hit { "hit" } else { "miss" };
    CACHE_LOOKUPS_TOTAL.with_label_values(&[result]).inc();
}

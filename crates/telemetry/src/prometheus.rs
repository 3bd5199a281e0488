// Path: crates/telemetry/src/prometheus.rs
//! Prometheus backend for the metrics sinks.

use crate::sinks::*;
use once_cell::sync::OnceCell;
use prometheus::{
    exponential_buckets, register_histogram_vec, register_int_counter, register_int_counter_vec,
    HistogramVec, IntCounter, IntCounterVec,
};

static PROXY_REQUESTS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static PROXY_REQUEST_DURATION_SECONDS: OnceCell<HistogramVec> = OnceCell::new();
static PROXY_UPSTREAM_FAILURES_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static PROXY_RATE_LIMITED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static PUBLISH_VERSION_ATTEMPTS: OnceCell<HistogramVec> = OnceCell::new();
static PUBLISH_SIMULATION_SKIPPED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static ERRORS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

#[derive(Debug, Clone, Copy)]
pub struct PrometheusSink;

/// Skips the observation when the collector is not registered.
macro_rules! with_metric {
    ($metric:ident, |$m:ident| $body:expr) => {
        if let Some($m) = $metric.get() {
            $body;
        }
    };
}

impl ProxyMetricsSink for PrometheusSink {
    fn observe_request_duration(&self, route: &str, duration_secs: f64) {
        with_metric!(PROXY_REQUEST_DURATION_SECONDS, |m| m
            .with_label_values(&[route])
            .observe(duration_secs));
    }
    fn inc_requests_total(&self, route: &str, status_code: u16) {
        with_metric!(PROXY_REQUESTS_TOTAL, |m| m
            .with_label_values(&[route, &status_code.to_string()])
            .inc());
    }
    fn inc_upstream_failure(&self, route: &str, kind: &'static str) {
        with_metric!(PROXY_UPSTREAM_FAILURES_TOTAL, |m| m
            .with_label_values(&[route, kind])
            .inc());
    }
    fn inc_rate_limited(&self) {
        with_metric!(PROXY_RATE_LIMITED_TOTAL, |m| m.inc());
    }
}

impl PublishMetricsSink for PrometheusSink {
    fn observe_version_attempts(&self, network: &str, attempts: usize) {
        with_metric!(PUBLISH_VERSION_ATTEMPTS, |m| m
            .with_label_values(&[network])
            .observe(attempts as f64));
    }
    fn inc_simulation_skipped(&self, network: &str) {
        with_metric!(PUBLISH_SIMULATION_SKIPPED_TOTAL, |m| m
            .with_label_values(&[network])
            .inc());
    }
}

impl ErrorMetricsSink for PrometheusSink {
    fn inc_error(&self, kind: &'static str, code: &'static str) {
        with_metric!(ERRORS_TOTAL, |m| m.with_label_values(&[kind, code]).inc());
    }
}

fn set_once<T>(cell: &OnceCell<T>, value: T) -> Result<(), prometheus::Error> {
    cell.set(value)
        .map_err(|_| prometheus::Error::Msg("metrics already installed".into()))
}

/// Registers every collector with the default registry and publishes the sink
/// through [`SINK`]. Call once at start-up.
pub fn install() -> Result<&'static dyn MetricsSink, prometheus::Error> {
    set_once(
        &PROXY_REQUESTS_TOTAL,
        register_int_counter_vec!(
            "daokit_proxy_requests_total",
            "Proxied requests by route and response status.",
            &["route", "status"]
        )?,
    )?;
    set_once(
        &PROXY_REQUEST_DURATION_SECONDS,
        register_histogram_vec!(
            "daokit_proxy_request_duration_seconds",
            "End-to-end latency of proxied requests.",
            &["route"],
            exponential_buckets(0.001, 2.0, 15)?
        )?,
    )?;
    set_once(
        &PROXY_UPSTREAM_FAILURES_TOTAL,
        register_int_counter_vec!(
            "daokit_proxy_upstream_failures_total",
            "Upstream calls that failed, by route and failure kind.",
            &["route", "kind"]
        )?,
    )?;
    set_once(
        &PROXY_RATE_LIMITED_TOTAL,
        register_int_counter!(
            "daokit_proxy_rate_limited_total",
            "Requests rejected by the per-IP rate limiter."
        )?,
    )?;
    set_once(
        &PUBLISH_VERSION_ATTEMPTS,
        register_histogram_vec!(
            "daokit_publish_version_attempts",
            "Version candidates simulated per publish.",
            &["network"],
            vec![1.0, 2.0, 3.0, 4.0, 6.0, 8.0]
        )?,
    )?;
    set_once(
        &PUBLISH_SIMULATION_SKIPPED_TOTAL,
        register_int_counter_vec!(
            "daokit_publish_simulation_skipped_total",
            "createDao transactions returned without a successful simulation.",
            &["network"]
        )?,
    )?;
    set_once(
        &ERRORS_TOTAL,
        register_int_counter_vec!(
            "daokit_errors_total",
            "Errors by kind and stable code.",
            &["kind", "code"]
        )?,
    )?;

    static PROM: PrometheusSink = PrometheusSink;
    let sink: &'static dyn MetricsSink = &PROM;
    // A second install fails above, so this set cannot collide.
    let _ = SINK.set(sink);
    Ok(sink)
}

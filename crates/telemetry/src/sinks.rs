// Path: crates/telemetry/src/sinks.rs
//! Metrics traits, so instrumented code does not depend on the backend.

use once_cell::sync::OnceCell;

/// Discards everything. Used until a backend is installed.
#[derive(Debug, Clone, Copy)]
pub struct NopSink;

/// The installed backend, if any.
pub static SINK: OnceCell<&'static dyn MetricsSink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

pub fn proxy_metrics() -> &'static dyn ProxyMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

pub fn publish_metrics() -> &'static dyn PublishMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

pub fn error_metrics() -> &'static dyn ErrorMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Gateway routes (`/api/rpc`, `/api/backend`, `/api/admin-backend`).
pub trait ProxyMetricsSink: Send + Sync + std::fmt::Debug {
    /// Observes end-to-end latency of a proxied request, labeled by route.
    fn observe_request_duration(&self, route: &str, duration_secs: f64);
    /// Counts responses by route and status code.
    fn inc_requests_total(&self, route: &str, status_code: u16);
    /// Counts failed upstream calls by route and failure kind.
    fn inc_upstream_failure(&self, route: &str, kind: &'static str);
    /// Counts requests rejected by the per-IP limiter.
    fn inc_rate_limited(&self);
}
impl ProxyMetricsSink for NopSink {
    fn observe_request_duration(&self, _route: &str, _duration_secs: f64) {}
    fn inc_requests_total(&self, _route: &str, _status_code: u16) {}
    fn inc_upstream_failure(&self, _route: &str, _kind: &'static str) {}
    fn inc_rate_limited(&self) {}
}

/// DAO publish flow.
pub trait PublishMetricsSink: Send + Sync + std::fmt::Debug {
    /// Version candidates simulated before one succeeded or all failed.
    fn observe_version_attempts(&self, network: &str, attempts: usize);
    /// A `createDao` transaction was returned without a successful simulation.
    fn inc_simulation_skipped(&self, network: &str);
}
impl PublishMetricsSink for NopSink {
    fn observe_version_attempts(&self, _network: &str, _attempts: usize) {}
    fn inc_simulation_skipped(&self, _network: &str) {}
}

pub trait ErrorMetricsSink: Send + Sync + std::fmt::Debug {
    /// Counts an error by its kind and stable code.
    fn inc_error(&self, kind: &'static str, code: &'static str);
}
impl ErrorMetricsSink for NopSink {
    fn inc_error(&self, _kind: &'static str, _code: &'static str) {}
}

/// Every domain sink, implemented once per backend.
pub trait MetricsSink: ProxyMetricsSink + PublishMetricsSink + ErrorMetricsSink {}

impl<T> MetricsSink for T where T: ProxyMetricsSink + PublishMetricsSink + ErrorMetricsSink {}

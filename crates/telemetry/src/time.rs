// Path: crates/telemetry/src/time.rs
use crate::sinks::ProxyMetricsSink;
use std::time::Instant;

/// Records the lifetime of a proxied request on drop.
pub struct RequestTimer<'a> {
    sink: &'a dyn ProxyMetricsSink,
    route: &'static str,
    start: Instant,
}

impl<'a> RequestTimer<'a> {
    pub fn new(sink: &'a dyn ProxyMetricsSink, route: &'static str) -> Self {
        Self {
            sink,
            route,
            start: Instant::now(),
        }
    }
}

impl Drop for RequestTimer<'_> {
    fn drop(&mut self) {
        self.sink
            .observe_request_duration(self.route, self.start.elapsed().as_secs_f64());
    }
}

// Path: crates/http-rpc-gateway/src/limiter.rs
use crate::AppError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use daokit_telemetry::proxy_metrics;
use daokit_types::config::RateLimitConfig;
use dashmap::DashMap;
use ipnetwork::IpNetwork;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    str::FromStr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

/// How often the bucket table is swept for idle clients.
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Per-client token buckets keyed by the resolved client address.
///
/// A bucket that has refilled to the full burst carries no state worth
/// keeping, so periodic sweeps drop it and the table only holds clients that
/// were active within roughly `burst / rps` seconds.
#[derive(Clone)]
pub(crate) struct IpLimiter {
    buckets: Arc<DashMap<IpAddr, Bucket>>,
    refill_per_sec: f64,
    capacity: f64,
    trusted_proxies: Arc<[IpNetwork]>,
    epoch: Instant,
    // Milliseconds after `epoch` at which the next sweep is due.
    next_sweep_ms: Arc<AtomicU64>,
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    updated: Instant,
}

impl Bucket {
    fn full(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            updated: now,
        }
    }

    /// Tokens available at `now`, without mutating the bucket.
    fn level_at(&self, now: Instant, refill_per_sec: f64, capacity: f64) -> f64 {
        let elapsed = now.saturating_duration_since(self.updated).as_secs_f64();
        (self.tokens + elapsed * refill_per_sec).min(capacity)
    }

    fn try_take(&mut self, now: Instant, refill_per_sec: f64, capacity: f64) -> bool {
        self.tokens = self.level_at(now, refill_per_sec, capacity);
        self.updated = now;
        if self.tokens < 1.0 {
            return false;
        }
        self.tokens -= 1.0;
        true
    }
}

impl IpLimiter {
    pub(crate) fn new(rps: u32, burst: u32, trusted_proxies: Vec<IpNetwork>) -> Self {
        if rps == 0 {
            tracing::warn!(target: "gateway", "rate limit rps is 0; exhausted clients never recover");
        }
        Self {
            buckets: Arc::new(DashMap::new()),
            refill_per_sec: f64::from(rps),
            capacity: f64::from(burst),
            trusted_proxies: trusted_proxies.into(),
            epoch: Instant::now(),
            next_sweep_ms: Arc::new(AtomicU64::new(millis(SWEEP_INTERVAL))),
        }
    }

    pub(crate) fn from_config(config: &RateLimitConfig) -> Self {
        let trusted = config
            .trusted_proxies
            .iter()
            .filter_map(|raw| match IpNetwork::from_str(raw) {
                Ok(net) => Some(net),
                Err(e) => {
                    tracing::warn!(target: "gateway", cidr = %raw, error = %e, "ignoring invalid trusted proxy CIDR");
                    None
                }
            })
            .collect();
        Self::new(config.rps, config.burst, trusted)
    }

    fn is_trusted(&self, ip: IpAddr) -> bool {
        self.trusted_proxies.iter().any(|net| net.contains(ip))
    }

    /// The address the request is charged to.
    ///
    /// `x-forwarded-for` is consulted only when the peer is a trusted proxy,
    /// and is read right to left: trusted hops are skipped and the first
    /// untrusted address wins. Entries a client prepends itself sit to the
    /// left of that address and are never reached. Requests without connection
    /// info count as loopback.
    fn client_ip(&self, peer: Option<IpAddr>, headers: &HeaderMap) -> IpAddr {
        let Some(peer) = peer else {
            return IpAddr::V4(Ipv4Addr::LOCALHOST);
        };
        if !self.is_trusted(peer) {
            return peer;
        }

        let mut resolved = peer;
        let hops = headers
            .get_all("x-forwarded-for")
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .collect::<Vec<_>>();
        for hop in hops.into_iter().rev() {
            let Ok(ip) = hop.trim().parse::<IpAddr>() else {
                break;
            };
            resolved = ip;
            if !self.is_trusted(ip) {
                break;
            }
        }
        resolved
    }

    fn request_ip<B>(&self, req: &axum::http::Request<B>) -> IpAddr {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());
        self.client_ip(peer, req.headers())
    }

    pub(crate) fn allow<B>(&self, req: &axum::http::Request<B>) -> bool {
        let ip = self.request_ip(req);
        self.allow_at(ip, Instant::now())
    }

    fn allow_at(&self, ip: IpAddr, now: Instant) -> bool {
        self.maybe_sweep(now);

        let (refill, capacity) = (self.refill_per_sec, self.capacity);
        self.buckets
            .entry(ip)
            .or_insert_with(|| Bucket::full(capacity, now))
            .try_take(now, refill, capacity)
    }

    /// Runs [`Self::prune_idle`] once per sweep interval. Only the caller
    /// that wins the compare-exchange sweeps.
    fn maybe_sweep(&self, now: Instant) {
        let now_ms = millis(now.saturating_duration_since(self.epoch));
        let due = self.next_sweep_ms.load(Ordering::Relaxed);
        if now_ms < due {
            return;
        }
        let next = now_ms.saturating_add(millis(SWEEP_INTERVAL));
        if self
            .next_sweep_ms
            .compare_exchange(due, next, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            self.prune_idle(now);
        }
    }

    /// Drops every bucket that has refilled to capacity by `now`.
    fn prune_idle(&self, now: Instant) -> usize {
        let (refill, capacity) = (self.refill_per_sec, self.capacity);
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| bucket.level_at(now, refill, capacity) < capacity);
        let pruned = before.saturating_sub(self.buckets.len());
        if pruned > 0 {
            tracing::debug!(target: "gateway", pruned, remaining = self.buckets.len(), "pruned idle rate-limit buckets");
        }
        pruned
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

pub(crate) async fn rate_limit_middleware(
    State(limiter): State<IpLimiter>,
    req: Request,
    next: Next,
) -> Response {
    if !limiter.allow(&req) {
        proxy_metrics().inc_rate_limited();
        return AppError::RateLimited.into_response();
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_from(peer: [u8; 4], xff: Option<&str>) -> axum::http::Request<Body> {
        let mut req = axum::http::Request::builder().uri("/api/rpc/1");
        if let Some(xff) = xff {
            req = req.header("x-forwarded-for", xff);
        }
        let mut req = req.body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 4000))));
        req
    }

    fn proxies(cidrs: &[&str]) -> Vec<IpNetwork> {
        cidrs.iter().map(|c| IpNetwork::from_str(c).unwrap()).collect()
    }

    #[test]
    fn burst_is_exhausted_then_rejected() {
        let limiter = IpLimiter::new(0, 2, Vec::new());
        let req = request_from([10, 0, 0, 1], None);
        assert!(limiter.allow(&req));
        assert!(limiter.allow(&req));
        assert!(!limiter.allow(&req));
    }

    #[test]
    fn tokens_refill_over_time() {
        let limiter = IpLimiter::new(2, 1, Vec::new());
        let ip = IpAddr::from([192, 0, 2, 10]);
        let start = Instant::now();
        assert!(limiter.allow_at(ip, start));
        assert!(!limiter.allow_at(ip, start + Duration::from_millis(100)));
        assert!(limiter.allow_at(ip, start + Duration::from_millis(600)));
    }

    #[test]
    fn forwarded_for_only_honoured_from_trusted_proxies() {
        let limiter = IpLimiter::new(0, 1, proxies(&["10.0.0.0/8"]));

        let via_proxy = request_from([10, 1, 2, 3], Some("203.0.113.7, 10.1.2.3"));
        assert_eq!(limiter.request_ip(&via_proxy), IpAddr::from([203, 0, 113, 7]));

        let direct = request_from([198, 51, 100, 9], Some("203.0.113.7"));
        assert_eq!(limiter.request_ip(&direct), IpAddr::from([198, 51, 100, 9]));
    }

    #[test]
    fn spoofed_leading_hops_are_ignored() {
        let limiter = IpLimiter::new(0, 1, proxies(&["10.0.0.0/8"]));
        let req = request_from([10, 0, 0, 5], Some("1.2.3.4, 198.51.100.20"));
        assert_eq!(limiter.request_ip(&req), IpAddr::from([198, 51, 100, 20]));

        let garbage = request_from([10, 0, 0, 5], Some("not-an-ip"));
        assert_eq!(limiter.request_ip(&garbage), IpAddr::from([10, 0, 0, 5]));
    }

    #[test]
    fn separate_clients_have_separate_buckets() {
        let limiter = IpLimiter::new(0, 1, Vec::new());
        assert!(limiter.allow(&request_from([192, 0, 2, 1], None)));
        assert!(limiter.allow(&request_from([192, 0, 2, 2], None)));
        assert!(!limiter.allow(&request_from([192, 0, 2, 1], None)));
    }

    #[test]
    fn idle_buckets_are_pruned_once_refilled() {
        let limiter = IpLimiter::new(10, 5, Vec::new());
        let start = Instant::now();
        let idle = IpAddr::from([203, 0, 113, 1]);
        let busy = IpAddr::from([203, 0, 113, 2]);

        assert!(limiter.allow_at(idle, start));
        for _ in 0..5 {
            limiter.allow_at(busy, start + Duration::from_millis(400));
        }
        assert_eq!(limiter.tracked_clients(), 2);

        // `idle` refilled after 100ms; `busy` is still draining at 450ms.
        let pruned = limiter.prune_idle(start + Duration::from_millis(450));
        assert_eq!(pruned, 1);
        assert_eq!(limiter.tracked_clients(), 1);
        assert!(!limiter.buckets.contains_key(&idle));
        assert!(limiter.buckets.contains_key(&busy));
    }

    #[test]
    fn sweep_runs_from_the_request_path() {
        let limiter = IpLimiter::new(100, 1, Vec::new());
        let start = Instant::now();
        for last in 1..=50u8 {
            assert!(limiter.allow_at(IpAddr::from([198, 18, 0, last]), start));
        }
        assert_eq!(limiter.tracked_clients(), 50);

        let later = start + SWEEP_INTERVAL + Duration::from_secs(1);
        assert!(limiter.allow_at(IpAddr::from([198, 18, 1, 1]), later));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn exhausted_bucket_is_kept_and_stays_limited() {
        let limiter = IpLimiter::new(0, 1, Vec::new());
        let ip = IpAddr::from([192, 0, 2, 77]);
        let start = Instant::now();
        assert!(limiter.allow_at(ip, start));
        assert_eq!(limiter.prune_idle(start + Duration::from_secs(3600)), 0);
        assert!(!limiter.allow_at(ip, start + Duration::from_secs(3600)));
    }
}

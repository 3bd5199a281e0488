// Path: crates/http-rpc-gateway/src/lib.rs
#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # daokit HTTP Gateway
//!
//! Server-side proxy routes for the browser client. Secrets (RPC provider keys,
//! backend API keys, the admin JWT) never leave this process:
//!
//! - `POST /api/rpc/:chain_id` forwards a JSON-RPC body to the chain's keyed
//!   provider endpoint, dropping every incoming header.
//! - `/api/backend/*path` and `/api/admin-backend/*path` forward any method to
//!   the configured backend with the API key injected.

mod backend;
mod limiter;
mod rpc;

pub use backend::{versioned_path, ApiVersion, BackendKind, BackendTarget};
pub use rpc::{ensure_provider_keys, RpcEndpoint, RpcProxy};

use anyhow::Result;
use axum::{
    body::Body,
    error_handling::HandleErrorLayer,
    extract::{MatchedPath, Request},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{any, post},
    Router,
};
use daokit_telemetry::{proxy_metrics, time::RequestTimer};
use daokit_types::config::{GatewayConfig, ProxySecrets};
use daokit_types::error::ConfigError;
use daokit_types::network::NetworkRegistry;
use limiter::{rate_limit_middleware, IpLimiter};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::watch;
use tower::{
    limit::ConcurrencyLimitLayer, load_shed::LoadShedLayer, timeout::TimeoutLayer, BoxError,
    ServiceBuilder,
};
use tower_http::{catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

// --- Error Handling ---

/// Error returned by the proxy handlers. The message is safe to show to the
/// browser; upstream detail is logged before the error is built.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotSupported(String),
    RateLimited,
    /// A route whose secrets are not configured on this deployment.
    Config(String),
    Upstream(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            AppError::BadRequest(s) => (StatusCode::BAD_REQUEST, s),
            AppError::NotSupported(s) => (StatusCode::NOT_IMPLEMENTED, s),
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "Too many requests".into()),
            AppError::Config(s) | AppError::Upstream(s) => (StatusCode::INTERNAL_SERVER_ERROR, s),
        };
        (status, Json(serde_json::json!({ "error": msg }))).into_response()
    }
}

async fn map_middleware_error(err: BoxError) -> impl IntoResponse {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(serde_json::json!({ "error": "Request timed out" })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "Gateway overloaded" })),
        )
    }
}

// --- State ---

/// Everything the handlers need, resolved once at start-up.
pub struct GatewayState {
    pub(crate) rpc: RpcProxy,
    pub(crate) backend: Option<BackendTarget>,
    pub(crate) admin_backend: Option<BackendTarget>,
    pub(crate) client: reqwest::Client,
    pub(crate) body_limit: usize,
}

impl GatewayState {
    /// Validates the secrets against the registry and builds the upstream
    /// HTTP client. Fails on missing RPC keys in production-like deployments
    /// and on malformed backend URLs or header values.
    pub fn new(
        networks: Arc<NetworkRegistry>,
        secrets: &ProxySecrets,
        config: &GatewayConfig,
    ) -> Result<Self, ConfigError> {
        let rpc = RpcProxy::new(networks, secrets, config.deploy_env)?;
        let backend = BackendTarget::backend(secrets)?;
        let admin_backend = BackendTarget::admin(secrets)?;
        if backend.is_none() {
            tracing::warn!(target: "gateway", "BACKEND_URL not set; /api/backend requests will fail");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ConfigError::Invalid {
                what: "upstream http client",
                reason: e.to_string(),
            })?;

        Ok(Self {
            rpc,
            backend,
            admin_backend,
            client,
            body_limit: config.body_limit_bytes,
        })
    }
}

// --- Metrics ---

fn route_label(path: Option<&MatchedPath>) -> &'static str {
    match path.map(MatchedPath::as_str) {
        Some(p) if p.starts_with("/api/rpc") => "rpc",
        Some(p) if p.starts_with("/api/admin-backend") => "admin-backend",
        Some(p) if p.starts_with("/api/backend") => "backend",
        _ => "unmatched",
    }
}

async fn track_metrics(req: Request, next: Next) -> Response {
    let route = route_label(req.extensions().get::<MatchedPath>());
    let sink = proxy_metrics();
    let _timer = RequestTimer::new(sink, route);
    let response = next.run(req).await;
    sink.inc_requests_total(route, response.status().as_u16());
    response
}

// --- Header plumbing shared by both proxies ---

const HOP_BY_HOP: [&str; 10] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-length",
    "host",
];

pub(crate) fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// Copies end-to-end headers from an upstream response.
pub(crate) fn copy_response_headers(src: &HeaderMap, dst: &mut HeaderMap) {
    for (name, value) in src {
        if !is_hop_by_hop(name.as_str()) {
            dst.append(name.clone(), value.clone());
        }
    }
}

pub(crate) fn is_no_content(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT | StatusCode::NOT_MODIFIED
    )
}

/// Relays an upstream response with its status and end-to-end headers.
pub(crate) fn passthrough(status: StatusCode, headers: &HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    copy_response_headers(headers, response.headers_mut());
    response
}

// --- Router ---

/// Builds the gateway router with the per-IP limiter and the standard layers.
pub fn router(state: Arc<GatewayState>, config: &GatewayConfig) -> Router {
    let limiter = IpLimiter::from_config(&config.rate_limit);

    Router::new()
        .route("/api/rpc/:chain_id", post(rpc::rpc_handler))
        .route("/api/backend/*path", any(backend::backend_handler))
        .route("/api/admin-backend/*path", any(backend::admin_backend_handler))
        .route_layer(middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn(track_metrics))
        .with_state(state)
        // `HandleErrorLayer` must wrap the fallible layers to make the service infallible.
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(map_middleware_error))
                .layer(LoadShedLayer::new())
                .layer(ConcurrencyLimitLayer::new(config.concurrency_limit))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.request_timeout_secs,
                ))),
        )
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
}

pub async fn run_server(
    config: &GatewayConfig,
    state: Arc<GatewayState>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    let app = router(state, config);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(target: "gateway", addr = %config.listen_addr, "HTTP gateway listening");

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_rx.changed().await.ok();
        tracing::info!(target: "gateway", "shutting down gracefully");
    });

    if let Err(e) = server.await {
        tracing::error!(target: "gateway", error = %e, "server error");
    }

    Ok(())
}

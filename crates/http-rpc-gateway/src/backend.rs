// Path: crates/http-rpc-gateway/src/backend.rs
//! Backend API forwarding with server-side credentials.

use crate::{is_hop_by_hop, is_no_content, passthrough, AppError, GatewayState};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        header::{ACCEPT_ENCODING, AUTHORIZATION, CONTENT_TYPE},
        HeaderMap, HeaderName, HeaderValue, Method,
    },
    response::Response,
};
use daokit_telemetry::proxy_metrics;
use daokit_types::config::{DeployEnv, ProxySecrets};
use daokit_types::error::ConfigError;
use std::fmt;
use std::sync::Arc;

const X_API_KEY: HeaderName = HeaderName::from_static("x-api-key");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Backend,
    AdminBackend,
}

impl BackendKind {
    /// Route prefix stripped before the path is appended to the base URL.
    pub fn prefix(&self) -> &'static str {
        match self {
            BackendKind::Backend => "/api/backend",
            BackendKind::AdminBackend => "/api/admin-backend",
        }
    }

    fn route(&self) -> &'static str {
        match self {
            BackendKind::Backend => "backend",
            BackendKind::AdminBackend => "admin-backend",
        }
    }
}

/// A configured backend: normalised base URL plus the headers injected into
/// every forwarded request.
#[derive(Clone)]
pub struct BackendTarget {
    kind: BackendKind,
    base_url: String,
    injected: HeaderMap,
}

impl fmt::Debug for BackendTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendTarget")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("injected", &self.injected.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl BackendTarget {
    /// `BACKEND_URL` with `X-API-Key: BACKEND_API_KEY`. `None` when the URL is unset.
    pub fn backend(secrets: &ProxySecrets) -> Result<Option<Self>, ConfigError> {
        let Some(raw) = secrets.backend_url.as_deref() else {
            return Ok(None);
        };
        Self::build(
            BackendKind::Backend,
            normalize_base_url("BACKEND_URL", raw)?,
            secrets.backend_api_key.as_deref(),
            None,
        )
        .map(Some)
    }

    /// `ADMIN_BACKEND_URL` and `ADMIN_BACKEND_API_KEY`, each falling back to
    /// its plain backend counterpart, plus `Authorization: Bearer` when
    /// `ADMIN_BACKEND_JWT` is set.
    pub fn admin(secrets: &ProxySecrets) -> Result<Option<Self>, ConfigError> {
        let (name, raw) = match (&secrets.admin_backend_url, &secrets.backend_url) {
            (Some(url), _) => ("ADMIN_BACKEND_URL", url.as_str()),
            (None, Some(url)) => ("BACKEND_URL", url.as_str()),
            (None, None) => return Ok(None),
        };
        let api_key = secrets
            .admin_backend_api_key
            .as_deref()
            .or(secrets.backend_api_key.as_deref());
        Self::build(
            BackendKind::AdminBackend,
            normalize_base_url(name, raw)?,
            api_key,
            secrets.admin_backend_jwt.as_deref(),
        )
        .map(Some)
    }

    fn build(
        kind: BackendKind,
        base_url: String,
        api_key: Option<&str>,
        jwt: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let mut injected = HeaderMap::new();
        if let Some(key) = api_key {
            injected.insert(X_API_KEY, secret_header("BACKEND_API_KEY", key)?);
        }
        if let Some(jwt) = jwt {
            injected.insert(
                AUTHORIZATION,
                secret_header("ADMIN_BACKEND_JWT", &format!("Bearer {jwt}"))?,
            );
        }
        Ok(Self {
            kind,
            base_url,
            injected,
        })
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upstream URL for an incoming request URI (path and query).
    pub fn upstream_url(&self, path_and_query: &str) -> String {
        let relative = path_and_query
            .strip_prefix(self.kind.prefix())
            .unwrap_or(path_and_query);
        format!("{}{}", self.base_url, relative)
    }
}

fn secret_header(name: &str, value: &str) -> Result<HeaderValue, ConfigError> {
    let mut value = HeaderValue::from_str(value).map_err(|_| ConfigError::Invalid {
        what: "backend secrets",
        reason: format!("{name} is not a valid header value"),
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Accepts `https://host/path`, or a bare `host[:port]/path` which is read as
/// `http://`. The result never ends with a slash.
pub fn normalize_base_url(name: &str, raw: &str) -> Result<String, ConfigError> {
    let raw = raw.trim();
    let invalid = || ConfigError::InvalidUrl {
        name: name.to_string(),
        value: raw.to_string(),
    };
    let parsed = if raw.contains("://") {
        reqwest::Url::parse(raw).map_err(|_| invalid())?
    } else {
        reqwest::Url::parse(&format!("http://{raw}")).map_err(|_| invalid())?
    };
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(invalid());
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// Incoming headers minus hop-by-hop ones and `Accept-Encoding`. Bodies are
/// relayed without decoding, so the upstream must answer uncompressed.
fn forwardable_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(incoming.len());
    for (name, value) in incoming {
        if is_hop_by_hop(name.as_str()) || name == ACCEPT_ENCODING {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

pub(crate) async fn backend_handler(
    State(state): State<Arc<GatewayState>>,
    req: Request,
) -> Result<Response, AppError> {
    forward(&state, state.backend.as_ref(), BackendKind::Backend, req).await
}

pub(crate) async fn admin_backend_handler(
    State(state): State<Arc<GatewayState>>,
    req: Request,
) -> Result<Response, AppError> {
    forward(
        &state,
        state.admin_backend.as_ref(),
        BackendKind::AdminBackend,
        req,
    )
    .await
}

async fn forward(
    state: &GatewayState,
    target: Option<&BackendTarget>,
    kind: BackendKind,
    req: Request,
) -> Result<Response, AppError> {
    let route = kind.route();
    let target = target.ok_or_else(|| {
        tracing::error!(target: "gateway", route, "backend proxy called without a configured URL");
        AppError::Config("Backend URL is not configured".into())
    })?;

    let (parts, body) = req.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = target.upstream_url(path_and_query);

    let mut headers = forwardable_headers(&parts.headers);
    for (name, value) in &target.injected {
        headers.insert(name.clone(), value.clone());
    }

    let mut upstream = state
        .client
        .request(parts.method.clone(), &url)
        .headers(headers);
    if parts.method == Method::POST {
        let bytes = axum::body::to_bytes(body, state.body_limit)
            .await
            .map_err(|_| AppError::BadRequest("Failed to read request body".into()))?;
        upstream = upstream.body(bytes);
    }

    let upstream = upstream.send().await.map_err(|e| {
        tracing::error!(
            target: "gateway",
            route,
            method = %parts.method,
            path = parts.uri.path(),
            error_type = "fetch_error",
            error = %e,
            "backend proxy request failed"
        );
        proxy_metrics().inc_upstream_failure(route, "connect");
        AppError::Upstream("Failed to connect to backend".into())
    })?;

    let status = upstream.status();
    let upstream_headers = upstream.headers().clone();
    if is_no_content(status) {
        return Ok(passthrough(status, &upstream_headers, Body::empty()));
    }

    let is_json = upstream_headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));

    let bytes = upstream.bytes().await.map_err(|e| {
        tracing::error!(
            target: "gateway",
            route,
            method = %parts.method,
            status = status.as_u16(),
            error_type = "body_read_error",
            error = %e,
            "failed to read backend response body"
        );
        proxy_metrics().inc_upstream_failure(route, "body");
        AppError::Upstream("Failed to read backend response".into())
    })?;

    let unparsable = || serde_json::from_slice::<serde_json::Value>(&bytes).is_err();
    if is_json && !bytes.is_empty() && unparsable() {
        tracing::warn!(
            target: "gateway",
            route,
            status = status.as_u16(),
            "backend declared JSON but sent an unparsable body; relaying as-is"
        );
    }
    if !status.is_success() {
        tracing::debug!(
            target: "gateway",
            route,
            status = status.as_u16(),
            path = parts.uri.path(),
            "backend returned an error status"
        );
    }

    Ok(passthrough(status, &upstream_headers, Body::from(bytes)))
}

// --- API versioning ---

/// Backend API generation. Production is pinned to v2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    #[default]
    V2,
    V3,
}

impl ApiVersion {
    /// `requested` only takes effect outside production, and only for `"v3"`.
    pub fn resolve(deploy_env: DeployEnv, requested: Option<&str>) -> Self {
        match (deploy_env, requested) {
            (DeployEnv::Production, _) => ApiVersion::V2,
            (_, Some("v3")) => ApiVersion::V3,
            _ => ApiVersion::V2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V2 => "v2",
            ApiVersion::V3 => "v3",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rewrites a leading `/v<N>/` segment to `version`, or prepends one.
pub fn versioned_path(path: &str, version: ApiVersion) -> String {
    match strip_version_segment(path) {
        Some(rest) => format!("/{version}{rest}"),
        None if path.starts_with('/') => format!("/{version}{path}"),
        None => format!("/{version}/{path}"),
    }
}

fn strip_version_segment(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("/v")?;
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = rest.get(digits..)?;
    rest.starts_with('/').then_some(rest)
}

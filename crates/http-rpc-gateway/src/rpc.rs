// Path: crates/http-rpc-gateway/src/rpc.rs
//! JSON-RPC forwarding to keyed provider endpoints.

use crate::{is_no_content, passthrough, AppError, GatewayState};
use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderValue},
    response::{IntoResponse, Json, Response},
};
use daokit_telemetry::proxy_metrics;
use daokit_types::config::{DeployEnv, ProxySecrets};
use daokit_types::error::ConfigError;
use daokit_types::network::{Network, NetworkRegistry, RpcProvider};
use std::collections::BTreeMap;
use std::sync::Arc;

const ROUTE: &str = "rpc";

/// Fails when a production-like deployment lacks a key for a provider that
/// some network routes through. Elsewhere, and under CI, the gap is logged and
/// those networks use their public RPC.
pub fn ensure_provider_keys(
    networks: &NetworkRegistry,
    secrets: &ProxySecrets,
    deploy_env: DeployEnv,
) -> Result<(), ConfigError> {
    let missing: Vec<RpcProvider> = networks
        .required_providers()
        .into_iter()
        .filter(|p| !secrets.rpc_keys.contains_key(p))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }

    let providers = missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let env_vars = missing
        .iter()
        .map(RpcProvider::env_var)
        .collect::<Vec<_>>()
        .join(", ");

    if deploy_env.is_production_like() && !secrets.is_ci {
        return Err(ConfigError::MissingRpcKeys {
            providers,
            env_vars,
        });
    }
    tracing::warn!(
        target: "gateway",
        %providers,
        %env_vars,
        "RPC provider keys missing; affected networks fall back to public RPC"
    );
    Ok(())
}

/// A resolved upstream. `url` may embed a provider key and must not be logged.
#[derive(Clone, PartialEq, Eq)]
pub struct RpcEndpoint {
    pub network: Network,
    pub url: String,
    pub keyed: bool,
}

impl std::fmt::Debug for RpcEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcEndpoint")
            .field("network", &self.network)
            .field("keyed", &self.keyed)
            .finish_non_exhaustive()
    }
}

/// Maps chain ids to upstream JSON-RPC endpoints.
pub struct RpcProxy {
    networks: Arc<NetworkRegistry>,
    keys: BTreeMap<RpcProvider, String>,
}

impl RpcProxy {
    pub fn new(
        networks: Arc<NetworkRegistry>,
        secrets: &ProxySecrets,
        deploy_env: DeployEnv,
    ) -> Result<Self, ConfigError> {
        ensure_provider_keys(&networks, secrets, deploy_env)?;
        Ok(Self {
            networks,
            keys: secrets.rpc_keys.clone(),
        })
    }

    /// `None` when no network in the registry uses `chain_id`.
    pub fn endpoint(&self, chain_id: u64) -> Option<RpcEndpoint> {
        let (network, def) = self.networks.by_chain_id(chain_id)?;
        let public = || RpcEndpoint {
            network,
            url: def.public_rpc_url().to_string(),
            keyed: false,
        };

        let Some(private) = &def.private_rpc else {
            return Some(public());
        };
        match self.keys.get(&private.provider) {
            Some(key) => Some(RpcEndpoint {
                network,
                url: format!("{}{}", private.url, key),
                keyed: true,
            }),
            None => {
                tracing::error!(
                    target: "gateway",
                    %network,
                    provider = %private.provider,
                    env_var = private.provider.env_var(),
                    "RPC key missing; using public RPC"
                );
                Some(public())
            }
        }
    }
}

/// `POST /api/rpc/:chain_id`. Only the body travels upstream, with a fixed
/// JSON content type; cookies and every other incoming header are dropped.
pub(crate) async fn rpc_handler(
    State(state): State<Arc<GatewayState>>,
    Path(chain_id): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    let unsupported = || AppError::NotSupported(format!("Chain {chain_id} is not supported"));
    let id: u64 = chain_id.parse().map_err(|_| unsupported())?;
    let endpoint = state.rpc.endpoint(id).ok_or_else(unsupported)?;

    let upstream = state
        .client
        .post(&endpoint.url)
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .body(body)
        .send()
        .await
        .map_err(|e| {
            tracing::error!(
                target: "gateway",
                chain_id = id,
                network = %endpoint.network,
                keyed = endpoint.keyed,
                method = "POST",
                error_type = "fetch_error",
                error = %e.without_url(),
                "RPC proxy request failed"
            );
            proxy_metrics().inc_upstream_failure(ROUTE, "connect");
            AppError::Upstream("Failed to connect to RPC endpoint".into())
        })?;

    let status = upstream.status();
    if !status.is_success() {
        tracing::error!(
            target: "gateway",
            chain_id = id,
            network = %endpoint.network,
            keyed = endpoint.keyed,
            method = "POST",
            status = status.as_u16(),
            error_type = "upstream_status",
            "RPC endpoint returned an error status"
        );
        proxy_metrics().inc_upstream_failure(ROUTE, "status");
        return Err(AppError::Upstream(format!(
            "RPC request failed with status {}",
            status.as_u16()
        )));
    }

    let headers = upstream.headers().clone();
    if is_no_content(status) {
        return Ok(passthrough(status, &headers, Body::empty()));
    }

    let bytes = upstream.bytes().await.map_err(|e| {
        tracing::error!(
            target: "gateway",
            chain_id = id,
            network = %endpoint.network,
            error_type = "body_read_error",
            error = %e.without_url(),
            "failed to read RPC response body"
        );
        proxy_metrics().inc_upstream_failure(ROUTE, "body");
        AppError::Upstream("Failed to connect to RPC endpoint".into())
    })?;
    if bytes.is_empty() {
        return Ok(passthrough(status, &headers, Body::empty()));
    }

    match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(value) => Ok((status, Json(value)).into_response()),
        Err(e) => {
            tracing::error!(
                target: "gateway",
                chain_id = id,
                network = %endpoint.network,
                status = status.as_u16(),
                error_type = "invalid_json",
                error = %e,
                "RPC endpoint returned invalid JSON"
            );
            proxy_metrics().inc_upstream_failure(ROUTE, "invalid_json");
            Err(AppError::Upstream(
                "Invalid JSON response from RPC endpoint".into(),
            ))
        }
    }
}

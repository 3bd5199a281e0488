// Path: crates/types/src/config/mod.rs

//! Shared configuration structures for the gateway and the CLI.
use crate::error::ConfigError;
use crate::network::RpcProvider;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Deployment environment. Production-like environments refuse to start with
/// missing secrets instead of degrading to public endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployEnv {
    #[default]
    Development,
    Staging,
    Production,
}

impl DeployEnv {
    pub fn is_production_like(&self) -> bool {
        matches!(self, DeployEnv::Staging | DeployEnv::Production)
    }
}

/// Per-IP token bucket for the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rps")]
    pub rps: u32,
    #[serde(default = "default_burst")]
    pub burst: u32,
    /// Peers inside these CIDRs may set `x-forwarded-for`.
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
}

fn default_rps() -> u32 {
    50
}
fn default_burst() -> u32 {
    200
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rps: default_rps(),
            burst: default_burst(),
            trusted_proxies: Vec::new(),
        }
    }
}

/// Configuration for the HTTP proxy gateway (`gateway.toml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    /// Where `/metrics` and `/healthz` are served. Disabled when absent.
    #[serde(default)]
    pub telemetry_addr: Option<SocketAddr>,
    #[serde(default)]
    pub deploy_env: DeployEnv,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency_limit: usize,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Replaces the built-in network registry.
    #[serde(default)]
    pub networks_file: Option<PathBuf>,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_body_limit() -> usize {
    1024 * 1024 // 1 MiB
}
fn default_concurrency() -> usize {
    256
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            telemetry_addr: None,
            deploy_env: DeployEnv::default(),
            request_timeout_secs: default_timeout_secs(),
            body_limit_bytes: default_body_limit(),
            concurrency_limit: default_concurrency(),
            rate_limit: RateLimitConfig::default(),
            networks_file: None,
        }
    }
}

impl GatewayConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse {
            what: "gateway config",
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                what: "gateway config",
                reason: "request_timeout_secs must be positive".into(),
            });
        }
        if self.concurrency_limit == 0 {
            return Err(ConfigError::Invalid {
                what: "gateway config",
                reason: "concurrency_limit must be positive".into(),
            });
        }
        if self.rate_limit.burst == 0 {
            return Err(ConfigError::Invalid {
                what: "gateway config",
                reason: "rate_limit.burst must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Server-side secrets, read from the environment only.
#[derive(Clone, Default)]
pub struct ProxySecrets {
    pub rpc_keys: BTreeMap<RpcProvider, String>,
    pub backend_url: Option<String>,
    pub backend_api_key: Option<String>,
    pub admin_backend_url: Option<String>,
    pub admin_backend_api_key: Option<String>,
    pub admin_backend_jwt: Option<String>,
    pub is_ci: bool,
}

impl std::fmt::Debug for ProxySecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxySecrets")
            .field("rpc_keys", &self.rpc_keys.keys().collect::<Vec<_>>())
            .field("backend_url", &self.backend_url)
            .field("backend_api_key", &self.backend_api_key.as_ref().map(|_| "***"))
            .field("admin_backend_url", &self.admin_backend_url)
            .field(
                "admin_backend_api_key",
                &self.admin_backend_api_key.as_ref().map(|_| "***"),
            )
            .field("admin_backend_jwt", &self.admin_backend_jwt.as_ref().map(|_| "***"))
            .field("is_ci", &self.is_ci)
            .finish()
    }
}

impl ProxySecrets {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the secrets from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let rpc_keys = RpcProvider::ALL
            .iter()
            .filter_map(|p| get(p.env_var()).map(|k| (*p, k)))
            .collect();
        Self {
            rpc_keys,
            backend_url: get("BACKEND_URL"),
            backend_api_key: get("BACKEND_API_KEY"),
            admin_backend_url: get("ADMIN_BACKEND_URL"),
            admin_backend_api_key: get("ADMIN_BACKEND_API_KEY"),
            admin_backend_jwt: get("ADMIN_BACKEND_JWT"),
            is_ci: get("CI").as_deref() == Some("true"),
        }
    }
}

// Path: crates/cli/src/commands/serve.rs

use crate::util::load_networks;
use anyhow::{Context, Result};
use clap::Parser;
use daokit_types::config::{GatewayConfig, ProxySecrets};
use http_rpc_gateway::GatewayState;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Gateway configuration (TOML). Defaults apply when omitted.
    #[clap(long, short)]
    pub config: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> Result<GatewayConfig> {
    let Some(path) = path else {
        return Ok(GatewayConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(GatewayConfig::from_toml_str(&raw)?)
}

pub async fn run(args: ServeArgs, networks_override: Option<&Path>) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let networks = load_networks(networks_override.or(config.networks_file.as_deref()))?;

    // Secrets come from the environment only.
    let secrets = ProxySecrets::from_env();
    let state = GatewayState::new(Arc::new(networks), &secrets, &config)
        .context("Gateway configuration rejected")?;
    tracing::info!(
        target: "cli",
        deploy_env = ?config.deploy_env,
        providers = ?secrets.rpc_keys.keys().collect::<Vec<_>>(),
        "gateway state ready"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    if let Some(addr) = config.telemetry_addr {
        daokit_telemetry::prometheus::install().context("Failed to register metrics")?;
        let mut rx = shutdown_rx.clone();
        tokio::spawn(daokit_telemetry::http::run_server(addr, async move {
            rx.changed().await.ok();
        }));
    }

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(target: "cli", error = %e, "failed to listen for ctrl-c");
        }
        let _ = shutdown_tx.send(true);
    });

    http_rpc_gateway::run_server(&config, Arc::new(state), shutdown_rx).await
}

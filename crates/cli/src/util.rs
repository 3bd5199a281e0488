// Path: crates/cli/src/util.rs

use alloy_primitives::B256;
use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use daokit_client::{ChainClient, JsonRpcClient};
use daokit_tx::TransactionReceipt;
use daokit_types::{Network, NetworkRegistry, PluginRegistry};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Registries for builder commands, loaded once per invocation.
pub struct Registries {
    pub networks: NetworkRegistry,
    pub plugins: PluginRegistry,
}

impl Registries {
    pub fn load(networks: Option<&Path>, plugins: Option<&Path>) -> Result<Self> {
        Ok(Self {
            networks: load_networks(networks)?,
            plugins: match plugins {
                Some(path) => PluginRegistry::from_file(path)?,
                None => PluginRegistry::builtin()?,
            },
        })
    }
}

pub fn load_networks(path: Option<&Path>) -> Result<NetworkRegistry> {
    let registry = match path {
        Some(path) => NetworkRegistry::from_file(path)?,
        None => NetworkRegistry::builtin()?,
    };
    if registry.deployed_networks().next().is_none() {
        tracing::warn!(
            target: "cli",
            "no network has protocol contract addresses; pass --networks with a registry that sets them"
        );
    }
    Ok(registry)
}

/// JSON-RPC client for `network`, preferring an explicit URL over the
/// network's first public endpoint.
pub fn rpc_client(
    networks: &NetworkRegistry,
    network: Network,
    rpc_url: Option<&str>,
) -> Result<JsonRpcClient> {
    let url = match rpc_url {
        Some(url) => url.to_string(),
        None => networks.get(network)?.public_rpc_url().to_string(),
    };
    Ok(JsonRpcClient::new(url)?)
}

/// Where a transaction receipt comes from.
#[derive(Args, Debug)]
pub struct ReceiptArgs {
    /// Receipt JSON from `eth_getTransactionReceipt`, bare or in its JSON-RPC
    /// envelope. `-` reads stdin.
    #[clap(long, conflicts_with = "tx_hash")]
    pub receipt: Option<PathBuf>,

    /// Fetch the receipt of this transaction instead.
    #[clap(long)]
    pub tx_hash: Option<B256>,

    /// RPC endpoint for `--tx-hash`. Defaults to the network's public RPC.
    #[clap(long, requires = "tx_hash")]
    pub rpc_url: Option<String>,
}

impl ReceiptArgs {
    /// Loads the receipt and rejects reverted transactions.
    pub async fn load(&self, networks: &NetworkRegistry, network: Network) -> Result<TransactionReceipt> {
        let receipt = match (&self.receipt, self.tx_hash) {
            (Some(path), _) => parse_receipt(&read_input(path)?)?,
            (None, Some(hash)) => {
                let client = rpc_client(networks, network, self.rpc_url.as_deref())?;
                client
                    .get_transaction_receipt(hash)
                    .await?
                    .ok_or_else(|| anyhow!("Transaction {hash} has no receipt yet"))?
            }
            (None, None) => bail!("Pass --receipt <file> or --tx-hash <hash>"),
        };
        if !receipt.succeeded() {
            bail!("Transaction reverted; its receipt carries no events");
        }
        Ok(receipt)
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read receipt from stdin")?;
        return Ok(raw);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub fn parse_receipt(raw: &str) -> Result<TransactionReceipt> {
    let value: serde_json::Value = serde_json::from_str(raw).context("Receipt is not valid JSON")?;
    let receipt = match value.get("result") {
        Some(inner) if value.get("jsonrpc").is_some() => inner.clone(),
        _ => value,
    };
    if receipt.is_null() {
        bail!("The JSON-RPC response holds no receipt (transaction pending or unknown)");
    }
    serde_json::from_value(receipt).context("Receipt JSON does not have the expected shape")
}

/// Pretty JSON on stdout. Logs stay on stderr.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECEIPT: &str = r#"{
        "transactionHash": "0x00000000000000000000000000000000000000000000000000000000000000aa",
        "status": "0x1",
        "blockNumber": "0x10",
        "logs": []
    }"#;

    #[test]
    fn parses_bare_receipt() {
        let receipt = parse_receipt(RECEIPT).unwrap();
        assert!(receipt.succeeded());
        assert!(receipt.logs.is_empty());
    }

    #[test]
    fn unwraps_json_rpc_envelope() {
        let envelope = format!(r#"{{"jsonrpc":"2.0","id":1,"result":{RECEIPT}}}"#);
        let receipt = parse_receipt(&envelope).unwrap();
        assert_eq!(receipt, parse_receipt(RECEIPT).unwrap());
    }

    #[test]
    fn null_result_is_an_error() {
        let err = parse_receipt(r#"{"jsonrpc":"2.0","id":1,"result":null}"#).unwrap_err();
        assert!(err.to_string().contains("no receipt"));
    }

    #[test]
    fn builtin_registries_load() {
        let registries = Registries::load(None, None).unwrap();
        assert!(registries.networks.get(Network::EthereumSepolia).is_ok());
    }
}

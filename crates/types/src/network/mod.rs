// Path: crates/types/src/network/mod.rs
//! Static per-network definitions: chain ids, RPC endpoints, protocol contract
//! addresses and the behavioural quirks some networks need.

use crate::error::ConfigError;
use crate::version::VersionTag;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The network registry shipped with the crate.
const BUILTIN_NETWORKS: &str = include_str!("../../networks.toml");

/// Identifier of a supported network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    ArbitrumMainnet,
    AvaxMainnet,
    BaseMainnet,
    ChilizMainnet,
    EthereumMainnet,
    EthereumSepolia,
    HarmonyMainnet,
    HarmonyTestnet,
    KatanaMainnet,
    OptimismMainnet,
    PeaqMainnet,
    PolygonMainnet,
    ZksyncMainnet,
    ZksyncSepolia,
}

impl Network {
    pub const ALL: [Network; 14] = [
        Network::ArbitrumMainnet,
        Network::AvaxMainnet,
        Network::BaseMainnet,
        Network::ChilizMainnet,
        Network::EthereumMainnet,
        Network::EthereumSepolia,
        Network::HarmonyMainnet,
        Network::HarmonyTestnet,
        Network::KatanaMainnet,
        Network::OptimismMainnet,
        Network::PeaqMainnet,
        Network::PolygonMainnet,
        Network::ZksyncMainnet,
        Network::ZksyncSepolia,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::ArbitrumMainnet => "arbitrum-mainnet",
            Network::AvaxMainnet => "avax-mainnet",
            Network::BaseMainnet => "base-mainnet",
            Network::ChilizMainnet => "chiliz-mainnet",
            Network::EthereumMainnet => "ethereum-mainnet",
            Network::EthereumSepolia => "ethereum-sepolia",
            Network::HarmonyMainnet => "harmony-mainnet",
            Network::HarmonyTestnet => "harmony-testnet",
            Network::KatanaMainnet => "katana-mainnet",
            Network::OptimismMainnet => "optimism-mainnet",
            Network::PeaqMainnet => "peaq-mainnet",
            Network::PolygonMainnet => "polygon-mainnet",
            Network::ZksyncMainnet => "zksync-mainnet",
            Network::ZksyncSepolia => "zksync-sepolia",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Network::ALL
            .iter()
            .copied()
            .find(|n| n.as_str() == s)
            .ok_or_else(|| format!("unknown network '{s}'"))
    }
}

/// Commercial RPC providers whose endpoints need a secret key appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcProvider {
    Alchemy,
    Ankr,
    Drpc,
    Peaq,
}

impl RpcProvider {
    pub const ALL: [RpcProvider; 4] = [
        RpcProvider::Alchemy,
        RpcProvider::Ankr,
        RpcProvider::Drpc,
        RpcProvider::Peaq,
    ];

    /// The environment variable holding this provider's key.
    pub fn env_var(&self) -> &'static str {
        match self {
            RpcProvider::Alchemy => "ALCHEMY_RPC_KEY",
            RpcProvider::Ankr => "ANKR_RPC_KEY",
            RpcProvider::Drpc => "DRPC_RPC_KEY",
            RpcProvider::Peaq => "PEAQ_RPC_KEY",
        }
    }
}

impl fmt::Display for RpcProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RpcProvider::Alchemy => "alchemy",
            RpcProvider::Ankr => "ankr",
            RpcProvider::Drpc => "drpc",
            RpcProvider::Peaq => "peaq",
        };
        f.write_str(s)
    }
}

/// A keyed RPC endpoint. The key is appended verbatim to `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateRpcConfig {
    pub provider: RpcProvider,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Protocol contracts deployed on a network. A zero address means "not deployed".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    #[serde(default)]
    pub dao_factory: Address,
    #[serde(default)]
    pub dao_registry: Address,
    #[serde(default)]
    pub plugin_setup_processor: Address,
    #[serde(default)]
    pub global_executor: Address,
}

/// Behavioural differences between networks, resolved once at load time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkQuirks {
    /// The configured executor lacks root rights, so privileged calls targeting
    /// the DAO or the setup processor must be re-issued through `DAO.execute`.
    #[serde(default)]
    pub requires_execute_wrapping: bool,
    /// Version tags tried before the plugin's nominal install version.
    #[serde(default)]
    pub preferred_versions: Vec<VersionTag>,
    /// When simulation keeps failing, publish without the plugin and, as a
    /// last resort, without simulating at all.
    #[serde(default)]
    pub simulation_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDefinition {
    pub name: String,
    pub chain_id: u64,
    pub rpc_urls: Vec<String>,
    #[serde(default)]
    pub private_rpc: Option<PrivateRpcConfig>,
    pub native_currency: NativeCurrency,
    pub addresses: ContractAddresses,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub testnet: bool,
    #[serde(default)]
    pub beta: bool,
    #[serde(default)]
    pub quirks: NetworkQuirks,
}

impl ContractAddresses {
    /// Whether the setup processor and the DAO factory are both configured.
    pub fn is_deployed(&self) -> bool {
        !self.plugin_setup_processor.is_zero() && !self.dao_factory.is_zero()
    }
}

impl NetworkDefinition {
    /// First public RPC URL. Validation guarantees there is one.
    pub fn public_rpc_url(&self) -> &str {
        self.rpc_urls.first().map(String::as_str).unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct RegistryDocument {
    networks: BTreeMap<Network, NetworkDefinition>,
}

/// Immutable set of network definitions, loaded once at start-up.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: BTreeMap<Network, NetworkDefinition>,
}

impl NetworkRegistry {
    /// Loads the registry embedded in the crate.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str(BUILTIN_NETWORKS)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let doc: RegistryDocument = toml::from_str(raw).map_err(|e| ConfigError::Parse {
            what: "network registry",
            reason: e.to_string(),
        })?;
        let registry = Self {
            networks: doc.networks,
        };
        registry.validate()?;
        Ok(registry)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeMap::new();
        for (network, def) in &self.networks {
            if def.rpc_urls.is_empty() {
                return Err(ConfigError::Invalid {
                    what: "network registry",
                    reason: format!("{network} has no public RPC URL"),
                });
            }
            if let Some(other) = seen.insert(def.chain_id, *network) {
                return Err(ConfigError::Invalid {
                    what: "network registry",
                    reason: format!(
                        "chain id {} is used by both {other} and {network}",
                        def.chain_id
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn get(&self, network: Network) -> Result<&NetworkDefinition, ConfigError> {
        self.networks
            .get(&network)
            .ok_or(ConfigError::UnknownNetwork(network))
    }

    pub fn by_chain_id(&self, chain_id: u64) -> Option<(Network, &NetworkDefinition)> {
        self.networks
            .iter()
            .find(|(_, def)| def.chain_id == chain_id)
            .map(|(network, def)| (*network, def))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Network, &NetworkDefinition)> {
        self.networks.iter().map(|(n, d)| (*n, d))
    }

    /// Networks whose protocol contracts are configured.
    pub fn deployed_networks(&self) -> impl Iterator<Item = Network> + '_ {
        self.iter()
            .filter(|(_, def)| def.addresses.is_deployed())
            .map(|(network, _)| network)
    }

    /// Providers that at least one network routes through.
    pub fn required_providers(&self) -> BTreeSet<RpcProvider> {
        self.networks
            .values()
            .filter_map(|def| def.private_rpc.as_ref().map(|cfg| cfg.provider))
            .collect()
    }
}

// Path: crates/types/src/plugin/mod.rs
//! Registry of installable governance plugins.

use crate::error::ConfigError;
use crate::network::Network;
use crate::version::VersionTag;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

const BUILTIN_PLUGINS: &str = include_str!("../../plugins.toml");

/// Closed set of plugin interface types known to daokit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PluginId {
    TokenVoting,
    Multisig,
    Admin,
    Spp,
    #[serde(rename = "gauge")]
    GaugeVoter,
    CapitalDistributor,
    LockToVote,
    HarmonyHipVoting,
    HarmonyDelegationVoting,
    #[serde(other)]
    Unknown,
}

impl PluginId {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginId::TokenVoting => "tokenVoting",
            PluginId::Multisig => "multisig",
            PluginId::Admin => "admin",
            PluginId::Spp => "spp",
            PluginId::GaugeVoter => "gauge",
            PluginId::CapitalDistributor => "capitalDistributor",
            PluginId::LockToVote => "lockToVote",
            PluginId::HarmonyHipVoting => "harmonyHipVoting",
            PluginId::HarmonyDelegationVoting => "harmonyDelegationVoting",
            PluginId::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PluginId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const KNOWN: [PluginId; 9] = [
            PluginId::TokenVoting,
            PluginId::Multisig,
            PluginId::Admin,
            PluginId::Spp,
            PluginId::GaugeVoter,
            PluginId::CapitalDistributor,
            PluginId::LockToVote,
            PluginId::HarmonyHipVoting,
            PluginId::HarmonyDelegationVoting,
        ];
        KNOWN
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown plugin '{s}'"))
    }
}

/// Translation keys shown in the create-DAO wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupMetadata {
    pub name_key: String,
    pub description_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub subdomain: String,
    pub name: String,
    pub install_version: VersionTag,
    #[serde(default)]
    pub repository_addresses: BTreeMap<Network, Address>,
    #[serde(default)]
    pub setup: Option<SetupMetadata>,
}

impl PluginInfo {
    /// The plugin repository on `network`, or `None` when absent or zero.
    pub fn repository(&self, network: Network) -> Option<Address> {
        self.repository_addresses
            .get(&network)
            .copied()
            .filter(|addr| !addr.is_zero())
    }
}

#[derive(Deserialize)]
struct RegistryDocument {
    plugins: BTreeMap<PluginId, PluginInfo>,
}

/// Immutable plugin table keyed by [`PluginId`].
#[derive(Debug, Clone)]
pub struct PluginRegistry {
    plugins: BTreeMap<PluginId, PluginInfo>,
}

impl PluginRegistry {
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str(BUILTIN_PLUGINS)
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
            what: "plugin registry",
            reason: e.to_string(),
        })?;
        if doc.plugins.contains_key(&PluginId::Unknown) {
            return Err(ConfigError::Invalid {
                what: "plugin registry",
                reason: "plugin ids must be known interface types".into(),
            });
        }
        Ok(Self {
            plugins: doc.plugins,
        })
    }

    pub fn get(&self, id: PluginId) -> Option<&PluginInfo> {
        self.plugins.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PluginId, &PluginInfo)> {
        self.plugins.iter().map(|(id, info)| (*id, info))
    }
}

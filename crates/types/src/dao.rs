// Path: crates/types/src/dao.rs
use crate::network::Network;
use crate::plugin::PluginId;
use crate::version::VersionTag;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// A deployed DAO on a specific network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoRef {
    pub address: Address,
    pub network: Network,
}

impl DaoRef {
    pub fn new(address: Address, network: Network) -> Self {
        Self { address, network }
    }
}

/// A plugin currently installed on a DAO, as reported by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaoPlugin {
    pub address: Address,
    pub interface_type: PluginId,
    pub release: Option<u8>,
    pub build: Option<u16>,
}

impl DaoPlugin {
    /// The installed version, if the indexer reported both halves.
    pub fn version_tag(&self) -> Option<VersionTag> {
        Some(VersionTag::new(self.release?, self.build?))
    }
}

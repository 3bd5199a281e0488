// Path: crates/tx/src/plugins/mod.rs
//! Per-plugin `prepareInstallation` payloads, selected by [`PluginId`].
//!
//! The table is closed: a plugin without an entry here cannot be installed
//! through daokit, and asking for one is a [`TransactionError::Unsupported`].

pub mod admin;
pub mod harmony;

use crate::plugin::PluginTransactionBuilder;
use alloy_primitives::{Address, Bytes};
use daokit_types::error::TransactionError;
use daokit_types::{PluginId, PluginInfo, PluginRegistry, VersionTag};

/// Inputs shared by every plugin's prepare-install builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareInstallRequest {
    pub dao: Address,
    /// Staged governance routes plugin actions through the global executor.
    pub advanced_governance: bool,
    /// Admin plugin only. Defaults to the DAO itself.
    pub admin: Option<Address>,
}

impl PrepareInstallRequest {
    pub fn new(dao: Address) -> Self {
        Self {
            dao,
            advanced_governance: false,
            admin: None,
        }
    }
}

/// Calldata for `PSP.prepareInstallation` of `id` into `request.dao`.
pub fn build_prepare_install_data(
    builder: &PluginTransactionBuilder<'_>,
    plugins: &PluginRegistry,
    id: PluginId,
    request: &PrepareInstallRequest,
) -> Result<Bytes, TransactionError> {
    let info = plugins
        .get(id)
        .ok_or_else(|| TransactionError::UnknownPlugin(id.to_string()))?;

    match id {
        PluginId::Admin => admin::build_prepare_install(builder, info, request),
        PluginId::HarmonyHipVoting | PluginId::HarmonyDelegationVoting => {
            harmony::build_prepare_install(builder, id, info, request)
        }
        other => Err(TransactionError::Unsupported(format!(
            "no install data builder for plugin {other}"
        ))),
    }
}

/// First network-preferred version, else the plugin's nominal install version.
pub fn install_version(builder: &PluginTransactionBuilder<'_>, info: &PluginInfo) -> VersionTag {
    builder
        .quirks()
        .preferred_versions
        .first()
        .copied()
        .unwrap_or(info.install_version)
}

fn repository(
    builder: &PluginTransactionBuilder<'_>,
    id: PluginId,
    info: &PluginInfo,
) -> Result<Address, TransactionError> {
    info.repository(builder.network())
        .ok_or_else(|| TransactionError::RepositoryNotConfigured {
            plugin: id.to_string(),
            network: builder.network(),
        })
}

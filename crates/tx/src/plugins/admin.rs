// Path: crates/tx/src/plugins/admin.rs
//! The admin plugin: a single address with full execute rights over the DAO.

use super::{install_version, repository, PrepareInstallRequest};
use crate::abi::TargetConfig;
use crate::plugin::{build_prepare_installation_data, PluginTargetConfig, PluginTransactionBuilder};
use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolValue;
use daokit_types::error::TransactionError;
use daokit_types::{PluginId, PluginInfo};

/// `AdminSetup` install payload: `(address admin, (address target, uint8 operation))`.
pub fn encode_install_data(admin: Address, target: PluginTargetConfig) -> Bytes {
    (admin, TargetConfig::from(target)).abi_encode_params().into()
}

pub fn build_prepare_install(
    builder: &PluginTransactionBuilder<'_>,
    info: &PluginInfo,
    request: &PrepareInstallRequest,
) -> Result<Bytes, TransactionError> {
    let repo = repository(builder, PluginId::Admin, info)?;
    let version = install_version(builder, info);
    let target = builder.plugin_target_config(request.dao, request.advanced_governance)?;
    let admin = request.admin.unwrap_or(request.dao);

    Ok(build_prepare_installation_data(
        repo,
        version,
        encode_install_data(admin, target),
        request.dao,
    ))
}

// Path: crates/tx/src/plugins/harmony.rs
//! Harmony HIP and delegation voting. The oracle is fixed per network, so the
//! install payload is empty.

use super::{repository, PrepareInstallRequest};
use crate::plugin::{build_prepare_installation_data, PluginTransactionBuilder};
use alloy_primitives::Bytes;
use daokit_types::error::TransactionError;
use daokit_types::{PluginId, PluginInfo};

pub fn build_prepare_install(
    builder: &PluginTransactionBuilder<'_>,
    id: PluginId,
    info: &PluginInfo,
    request: &PrepareInstallRequest,
) -> Result<Bytes, TransactionError> {
    let repo = repository(builder, id, info)?;
    Ok(build_prepare_installation_data(
        repo,
        info.install_version,
        Bytes::new(),
        request.dao,
    ))
}

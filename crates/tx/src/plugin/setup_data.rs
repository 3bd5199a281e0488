// Path: crates/tx/src/plugin/setup_data.rs
//! Setup data recovered from the setup processor's `*Prepared` events.
//!
//! A "prepare" transaction emits one event per plugin. The data is read back
//! from the mined receipt, handed to the matching "apply" builder and dropped.

use crate::abi::{IPluginSetupProcessor, MultiTargetPermission, PreparedSetupData};
use crate::receipt::TransactionReceipt;
use alloy_primitives::{Address, Bytes, B256};
use daokit_types::VersionTag;
use serde::{Deserialize, Serialize};

/// `PermissionLib.Operation`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionOperation {
    Grant = 0,
    Revoke = 1,
    GrantWithCondition = 2,
}

impl TryFrom<u8> for PermissionOperation {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Grant),
            1 => Ok(Self::Revoke),
            2 => Ok(Self::GrantWithCondition),
            other => Err(other),
        }
    }
}

/// A permission change the setup processor will apply on the plugin's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionChange {
    pub operation: PermissionOperation,
    #[serde(rename = "where")]
    pub where_: Address,
    pub who: Address,
    pub condition: Address,
    pub permission_id: B256,
}

impl TryFrom<MultiTargetPermission> for PermissionChange {
    type Error = u8;

    fn try_from(p: MultiTargetPermission) -> Result<Self, Self::Error> {
        Ok(Self {
            operation: PermissionOperation::try_from(p.operation)?,
            where_: p.where_,
            who: p.who,
            condition: p.condition,
            permission_id: p.permissionId,
        })
    }
}

impl From<&PermissionChange> for MultiTargetPermission {
    fn from(p: &PermissionChange) -> Self {
        Self {
            operation: p.operation as u8,
            where_: p.where_,
            who: p.who,
            condition: p.condition,
            permissionId: p.permission_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedSetup {
    pub helpers: Vec<Address>,
    pub permissions: Vec<PermissionChange>,
}

impl PreparedSetup {
    fn from_abi(data: PreparedSetupData) -> Result<Self, u8> {
        Ok(Self {
            helpers: data.helpers,
            permissions: convert_permissions(data.permissions)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationSetupData {
    pub plugin_address: Address,
    pub plugin_setup_repo: Address,
    pub version_tag: VersionTag,
    pub prepared_setup_data: PreparedSetup,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSetupData {
    pub plugin_setup_repo: Address,
    pub version_tag: VersionTag,
    pub prepared_setup_data: PreparedSetup,
    pub init_data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UninstallSetupData {
    pub plugin_address: Address,
    pub plugin_setup_repo: Address,
    pub version_tag: VersionTag,
    pub permissions: Vec<PermissionChange>,
}

fn convert_permissions(raw: Vec<MultiTargetPermission>) -> Result<Vec<PermissionChange>, u8> {
    raw.into_iter().map(PermissionChange::try_from).collect()
}

fn skip_bad_operation(event: &'static str, op: u8) {
    tracing::debug!(target: "tx", event, operation = op, "skipping event with unknown permission operation");
}

/// One entry per `InstallationPrepared` event, in log order. Empty when the
/// receipt has none; callers must check before building apply actions.
pub fn get_plugin_installation_setup_data(receipt: &TransactionReceipt) -> Vec<InstallationSetupData> {
    receipt
        .decode_events::<IPluginSetupProcessor::InstallationPrepared>()
        .into_iter()
        .filter_map(|(_, ev)| {
            let prepared = PreparedSetup::from_abi(ev.preparedSetupData)
                .map_err(|op| skip_bad_operation("InstallationPrepared", op))
                .ok()?;
            Some(InstallationSetupData {
                plugin_address: ev.plugin,
                plugin_setup_repo: ev.pluginSetupRepo,
                version_tag: ev.versionTag.into(),
                prepared_setup_data: prepared,
            })
        })
        .collect()
}

/// One entry per `UpdatePrepared` event, in log order.
pub fn get_plugin_update_setup_data(receipt: &TransactionReceipt) -> Vec<UpdateSetupData> {
    receipt
        .decode_events::<IPluginSetupProcessor::UpdatePrepared>()
        .into_iter()
        .filter_map(|(_, ev)| {
            let prepared = PreparedSetup::from_abi(ev.preparedSetupData)
                .map_err(|op| skip_bad_operation("UpdatePrepared", op))
                .ok()?;
            Some(UpdateSetupData {
                plugin_setup_repo: ev.pluginSetupRepo,
                version_tag: ev.versionTag.into(),
                prepared_setup_data: prepared,
                init_data: ev.initData,
            })
        })
        .collect()
}

/// One entry per `UninstallationPrepared` event, in log order.
pub fn get_plugin_uninstall_setup_data(receipt: &TransactionReceipt) -> Vec<UninstallSetupData> {
    receipt
        .decode_events::<IPluginSetupProcessor::UninstallationPrepared>()
        .into_iter()
        .filter_map(|(_, ev)| {
            let permissions = convert_permissions(ev.permissions)
                .map_err(|op| skip_bad_operation("UninstallationPrepared", op))
                .ok()?;
            Some(UninstallSetupData {
                plugin_address: ev.setupPayload.plugin,
                plugin_setup_repo: ev.pluginSetupRepo,
                version_tag: ev.versionTag.into(),
                permissions,
            })
        })
        .collect()
}

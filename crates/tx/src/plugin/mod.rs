// Path: crates/tx/src/plugin/mod.rs
//! Plugin installation, update and uninstallation through the generic plugin
//! setup processor (PSP).
//!
//! Every privileged apply call is bracketed by a temporary permission grant to
//! the PSP immediately before and the matching revoke immediately after, in
//! the same action list. The builders never reorder caller input.

mod setup_data;
mod wrap;

#[cfg(test)]
mod tests;

pub use setup_data::{
    get_plugin_installation_setup_data, get_plugin_uninstall_setup_data,
    get_plugin_update_setup_data, InstallationSetupData, PermissionChange, PermissionOperation,
    PreparedSetup, UninstallSetupData, UpdateSetupData,
};
pub use wrap::wrap_as_dao_execute;

use crate::abi::{
    self, ApplyInstallationParams, ApplyUninstallationParams, ApplyUpdateParams,
    IPluginSetupProcessor, MultiTargetPermission, PluginSetupRef, PrepareInstallationParams,
    PrepareUninstallationParams, PrepareUpdateParams, SetupPayload,
};
use crate::permission::{
    build_execute_condition_transactions, build_grant_revoke_permission_transactions, PermissionId,
    PermissionTuple,
};
use crate::request::TransactionRequest;
use alloy_primitives::{keccak256, Address, Bytes, B256};
use alloy_sol_types::{SolCall, SolValue};
use daokit_types::error::{ConfigError, TransactionError};
use daokit_types::network::NetworkQuirks;
use daokit_types::{
    DaoPlugin, Network, NetworkDefinition, NetworkRegistry, PluginRegistry, VersionTag,
};
use serde::Serialize;

/// How a plugin executes the actions it triggers (`IPlugin.Operation`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetOperation {
    Call = 0,
    DelegateCall = 1,
}

/// Contract that ultimately executes plugin-triggered actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PluginTargetConfig {
    pub target: Address,
    pub operation: TargetOperation,
}

impl From<PluginTargetConfig> for abi::TargetConfig {
    fn from(cfg: PluginTargetConfig) -> Self {
        Self {
            target: cfg.target,
            operation: cfg.operation as u8,
        }
    }
}

fn setup_ref(repository: Address, version_tag: VersionTag) -> PluginSetupRef {
    PluginSetupRef {
        versionTag: version_tag.into(),
        pluginSetupRepo: repository,
    }
}

fn to_abi_permissions(permissions: &[PermissionChange]) -> Vec<MultiTargetPermission> {
    permissions.iter().map(MultiTargetPermission::from).collect()
}

/// Commits to the helper set so `apply*` can verify it without re-sending it.
pub fn hash_helpers(helpers: &[Address]) -> B256 {
    keccak256((helpers.to_vec(),).abi_encode_params())
}

/// Calldata for `PSP.prepareInstallation`. The repository is not checked for
/// deployed code here.
pub fn build_prepare_installation_data(
    repository: Address,
    version_tag: VersionTag,
    data: Bytes,
    dao: Address,
) -> Bytes {
    IPluginSetupProcessor::prepareInstallationCall {
        dao,
        params: PrepareInstallationParams {
            pluginSetupRef: setup_ref(repository, version_tag),
            data,
        },
    }
    .abi_encode()
    .into()
}

/// Builds apply-* action lists for DAOs on one network.
#[derive(Debug, Clone, Copy)]
pub struct PluginTransactionBuilder<'a> {
    network: Network,
    definition: &'a NetworkDefinition,
}

impl<'a> PluginTransactionBuilder<'a> {
    pub fn new(network: Network, definition: &'a NetworkDefinition) -> Self {
        Self {
            network,
            definition,
        }
    }

    pub fn for_network(registry: &'a NetworkRegistry, network: Network) -> Result<Self, ConfigError> {
        Ok(Self::new(network, registry.get(network)?))
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn quirks(&self) -> &NetworkQuirks {
        &self.definition.quirks
    }

    fn setup_processor(&self) -> Result<Address, TransactionError> {
        let psp = self.definition.addresses.plugin_setup_processor;
        if psp.is_zero() {
            return Err(TransactionError::AddressNotConfigured {
                contract: "pluginSetupProcessor",
                network: self.network,
            });
        }
        Ok(psp)
    }

    fn wrap(&self, dao: Address, psp: Address, tx: TransactionRequest) -> TransactionRequest {
        wrap_as_dao_execute(&self.definition.quirks, dao, psp, tx)
    }

    fn grant_revoke(&self, where_: Address, dao: Address, psp: Address, what: PermissionId) -> [TransactionRequest; 2] {
        build_grant_revoke_permission_transactions(&PermissionTuple {
            where_,
            who: psp,
            what: what.id(),
            to: dao,
        })
        .map(|tx| self.wrap(dao, psp, tx))
    }

    /// Plain governance calls into the DAO; advanced (staged) governance
    /// delegate-calls into the network's shared global executor.
    pub fn plugin_target_config(
        &self,
        dao: Address,
        advanced_governance: bool,
    ) -> Result<PluginTargetConfig, TransactionError> {
        if !advanced_governance {
            return Ok(PluginTargetConfig {
                target: dao,
                operation: TargetOperation::Call,
            });
        }
        let executor = self.definition.addresses.global_executor;
        if executor.is_zero() {
            return Err(TransactionError::AddressNotConfigured {
                contract: "globalExecutor",
                network: self.network,
            });
        }
        Ok(PluginTargetConfig {
            target: executor,
            operation: TargetOperation::DelegateCall,
        })
    }

    /// Calldata for `PSP.prepareUninstallation` of an installed plugin.
    pub fn build_prepare_uninstallation_data(
        &self,
        plugins: &PluginRegistry,
        dao: Address,
        plugin: &DaoPlugin,
        helpers: Vec<Address>,
        data: Bytes,
    ) -> Result<Bytes, TransactionError> {
        let version_tag = plugin
            .version_tag()
            .ok_or(TransactionError::MissingVersion(plugin.address))?;
        let repository = self.repository_of(plugins, plugin)?;

        let call = IPluginSetupProcessor::prepareUninstallationCall {
            dao,
            params: PrepareUninstallationParams {
                pluginSetupRef: setup_ref(repository, version_tag),
                setupPayload: SetupPayload {
                    plugin: plugin.address,
                    currentHelpers: helpers,
                    data,
                },
            },
        };
        Ok(call.abi_encode().into())
    }

    /// Calldata for `PSP.prepareUpdate` from the installed version to `new_version`.
    pub fn build_prepare_update_data(
        &self,
        plugins: &PluginRegistry,
        dao: Address,
        plugin: &DaoPlugin,
        new_version: VersionTag,
        helpers: Vec<Address>,
        data: Bytes,
    ) -> Result<Bytes, TransactionError> {
        let current = plugin
            .version_tag()
            .ok_or(TransactionError::MissingVersion(plugin.address))?;
        let repository = self.repository_of(plugins, plugin)?;

        let call = IPluginSetupProcessor::prepareUpdateCall {
            dao,
            params: PrepareUpdateParams {
                currentVersionTag: current.into(),
                newPluginSetupRef: setup_ref(repository, new_version),
                setupPayload: SetupPayload {
                    plugin: plugin.address,
                    currentHelpers: helpers,
                    data,
                },
            },
        };
        Ok(call.abi_encode().into())
    }

    fn repository_of(&self, plugins: &PluginRegistry, plugin: &DaoPlugin) -> Result<Address, TransactionError> {
        let info = plugins
            .get(plugin.interface_type)
            .ok_or_else(|| TransactionError::UnknownPlugin(plugin.interface_type.to_string()))?;
        info.repository(self.network)
            .ok_or_else(|| TransactionError::RepositoryNotConfigured {
                plugin: plugin.interface_type.to_string(),
                network: self.network,
            })
    }

    /// `[grant ROOT → PSP, apply × n, extra actions…, revoke ROOT, (execute condition…)]`.
    ///
    /// With an execute condition the first setup entry's plugin (the SPP or the
    /// basic governance plugin) loses its unconditional `EXECUTE_PERMISSION` and
    /// gets it back gated by the condition.
    pub fn build_apply_plugins_installation_actions(
        &self,
        dao: Address,
        setup_data: &[InstallationSetupData],
        extra_actions: &[TransactionRequest],
        execute_condition: Option<Address>,
    ) -> Result<Vec<TransactionRequest>, TransactionError> {
        let psp = self.setup_processor()?;

        let condition_txs = match execute_condition {
            Some(condition) => {
                let first = setup_data
                    .first()
                    .ok_or(TransactionError::EmptySetupData("installation"))?;
                build_execute_condition_transactions(dao, first.plugin_address, condition).to_vec()
            }
            None => Vec::new(),
        };

        let [grant_root, revoke_root] = self.grant_revoke(dao, dao, psp, PermissionId::Root);

        let mut actions = Vec::with_capacity(setup_data.len() + extra_actions.len() + 4);
        actions.push(grant_root);
        actions.extend(
            setup_data
                .iter()
                .map(|data| self.wrap(dao, psp, apply_installation_action(psp, dao, data))),
        );
        actions.extend(extra_actions.iter().cloned().map(|tx| self.wrap(dao, psp, tx)));
        actions.push(revoke_root);
        actions.extend(condition_txs.into_iter().map(|tx| self.wrap(dao, psp, tx)));
        Ok(actions)
    }

    /// `[grant ROOT → PSP, applyUninstallation, revoke ROOT]`.
    pub fn build_apply_plugin_uninstallation_action(
        &self,
        dao: Address,
        setup_data: &UninstallSetupData,
    ) -> Result<Vec<TransactionRequest>, TransactionError> {
        let psp = self.setup_processor()?;
        let [grant_root, revoke_root] = self.grant_revoke(dao, dao, psp, PermissionId::Root);

        let call = IPluginSetupProcessor::applyUninstallationCall {
            dao,
            params: ApplyUninstallationParams {
                plugin: setup_data.plugin_address,
                pluginSetupRef: setup_ref(setup_data.plugin_setup_repo, setup_data.version_tag),
                permissions: to_abi_permissions(&setup_data.permissions),
            },
        };
        let uninstall = self.wrap(dao, psp, TransactionRequest::call(psp, call.abi_encode()));

        Ok(vec![grant_root, uninstall, revoke_root])
    }

    /// One `[grant UPGRADE_PLUGIN, applyUpdate, revoke UPGRADE_PLUGIN]` triple per
    /// plugin, in input order. When any update changes permissions the PSP also
    /// needs ROOT for the whole batch, so a root grant is prepended and the
    /// revoke appended.
    pub fn build_apply_plugins_update_actions(
        &self,
        dao: Address,
        plugins: &[Address],
        setup_data: &[UpdateSetupData],
    ) -> Result<Vec<TransactionRequest>, TransactionError> {
        if plugins.len() != setup_data.len() {
            return Err(TransactionError::LengthMismatch {
                plugins: plugins.len(),
                setup_data: setup_data.len(),
            });
        }
        let psp = self.setup_processor()?;

        let requires_root = setup_data
            .iter()
            .any(|data| !data.prepared_setup_data.permissions.is_empty());

        let mut actions = Vec::with_capacity(plugins.len() * 3 + 2);
        let root = requires_root.then(|| self.grant_revoke(dao, dao, psp, PermissionId::Root));
        if let Some([grant_root, _]) = &root {
            actions.push(grant_root.clone());
        }

        for (plugin, data) in plugins.iter().zip(setup_data) {
            let [grant_upgrade, revoke_upgrade] =
                self.grant_revoke(*plugin, dao, psp, PermissionId::UpgradePlugin);
            actions.push(grant_upgrade);
            actions.push(self.wrap(dao, psp, apply_update_action(psp, dao, *plugin, data)));
            actions.push(revoke_upgrade);
        }

        if let Some([_, revoke_root]) = root {
            actions.push(revoke_root);
        }
        Ok(actions)
    }
}

fn apply_installation_action(psp: Address, dao: Address, data: &InstallationSetupData) -> TransactionRequest {
    let prepared = &data.prepared_setup_data;
    let call = IPluginSetupProcessor::applyInstallationCall {
        dao,
        params: ApplyInstallationParams {
            pluginSetupRef: setup_ref(data.plugin_setup_repo, data.version_tag),
            plugin: data.plugin_address,
            permissions: to_abi_permissions(&prepared.permissions),
            helpersHash: hash_helpers(&prepared.helpers),
        },
    };
    TransactionRequest::call(psp, call.abi_encode())
}

fn apply_update_action(psp: Address, dao: Address, plugin: Address, data: &UpdateSetupData) -> TransactionRequest {
    let prepared = &data.prepared_setup_data;
    let call = IPluginSetupProcessor::applyUpdateCall {
        dao,
        params: ApplyUpdateParams {
            plugin,
            pluginSetupRef: setup_ref(data.plugin_setup_repo, data.version_tag),
            initData: data.init_data.clone(),
            permissions: to_abi_permissions(&prepared.permissions),
            helpersHash: hash_helpers(&prepared.helpers),
        },
    };
    TransactionRequest::call(psp, call.abi_encode())
}

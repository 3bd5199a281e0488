// Path: crates/publish/src/flow.rs
use crate::resolve::{resolve_version, version_candidates};
use alloy_primitives::Address;
use daokit_client::ChainClient;
use daokit_tx::abi::{DAOSettings, PluginSettings};
use daokit_tx::dao_factory::{
    build_admin_plugin_settings, build_create_dao_transaction, build_dao_settings,
};
use daokit_tx::TransactionRequest;
use daokit_telemetry::publish_metrics;
use daokit_types::error::{PublishError, TransactionError};
use daokit_types::network::NetworkDefinition;
use daokit_types::{Network, NetworkRegistry, PluginId, PluginRegistry, VersionTag};
use serde::Serialize;

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishDaoParams {
    pub network: Network,
    /// ENS subdomain, if any.
    pub subdomain: Option<String>,
    /// CID of the pinned DAO metadata document.
    pub metadata_cid: String,
    /// The connected wallet. Becomes the admin and is the simulation sender.
    pub creator: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SimulationStatus {
    /// The exact call returned below simulated successfully.
    Simulated,
    /// Simulation kept failing on a network that declares it unreliable. The
    /// transaction may revert on-chain.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaoCreationTransaction {
    pub request: TransactionRequest,
    pub simulation: SimulationStatus,
    /// `None` when the DAO is created without the admin plugin.
    pub admin_plugin_version: Option<VersionTag>,
}

/// Builds `createDao` transactions against a chain.
pub struct DaoPublisher<'a, C: ChainClient + ?Sized> {
    networks: &'a NetworkRegistry,
    plugins: &'a PluginRegistry,
    client: &'a C,
}

impl<'a, C: ChainClient + ?Sized> DaoPublisher<'a, C> {
    pub fn new(networks: &'a NetworkRegistry, plugins: &'a PluginRegistry, client: &'a C) -> Self {
        Self {
            networks,
            plugins,
            client,
        }
    }

    pub async fn build_transaction(
        &self,
        params: &PublishDaoParams,
    ) -> Result<DaoCreationTransaction, PublishError> {
        let network = params.network;
        let def = self
            .networks
            .get(network)
            .map_err(TransactionError::from)?;

        let factory = def.addresses.dao_factory;
        if factory.is_zero() {
            return Err(PublishError::FactoryNotConfigured(network));
        }

        let settings = build_dao_settings(params.subdomain.as_deref(), &params.metadata_cid);

        let admin = self
            .resolve_admin_plugin(def, factory, &settings, params)
            .await?;
        if let Some((plugin, version)) = admin {
            let plugins = [plugin];
            return Ok(DaoCreationTransaction {
                request: build_create_dao_transaction(factory, &settings, &plugins),
                simulation: SimulationStatus::Simulated,
                admin_plugin_version: Some(version),
            });
        }

        let request = build_create_dao_transaction(factory, &settings, &[]);
        let simulation = match self.client.simulate(params.creator, &request).await {
            Ok(_) => SimulationStatus::Simulated,
            Err(e) if def.quirks.simulation_fallback => {
                tracing::warn!(
                    target: "publish",
                    %network,
                    error = %e,
                    "createDao simulation failed; returning unsimulated transaction"
                );
                publish_metrics().inc_simulation_skipped(network.as_str());
                SimulationStatus::Skipped
            }
            Err(e) => return Err(PublishError::Simulation(e.to_string())),
        };

        Ok(DaoCreationTransaction {
            request,
            simulation,
            admin_plugin_version: None,
        })
    }

    /// Settings for the admin plugin at a version whose `createDao` simulation
    /// succeeds, or `None` when the DAO should be created without it.
    async fn resolve_admin_plugin(
        &self,
        def: &NetworkDefinition,
        factory: Address,
        settings: &DAOSettings,
        params: &PublishDaoParams,
    ) -> Result<Option<(PluginSettings, VersionTag)>, PublishError> {
        let network = params.network;
        let Some(info) = self.plugins.get(PluginId::Admin) else {
            return Ok(None);
        };
        let Some(repository) = info.repository(network) else {
            tracing::info!(
                target: "publish",
                %network,
                "admin plugin not published here; creating DAO without plugins"
            );
            return Ok(None);
        };

        if !self.client.has_code(repository).await? {
            let err = PublishError::RepositoryNotDeployed {
                repository,
                network,
            };
            tracing::warn!(target: "publish", %network, error = %err, "skipping admin plugin");
            return Ok(None);
        }

        let fallback = def.quirks.simulation_fallback;

        let candidates = version_candidates(&def.quirks.preferred_versions, info.install_version);
        let resolved = resolve_version(&candidates, |version| {
            let plugin = build_admin_plugin_settings(repository, params.creator, version);
            let request =
                build_create_dao_transaction(factory, settings, std::slice::from_ref(&plugin));
            async move {
                self.client
                    .simulate(params.creator, &request)
                    .await
                    .map(|_| plugin)
            }
        })
        .await;

        let attempts = match &resolved {
            Ok(r) => r.attempts,
            Err(_) => candidates.len(),
        };
        publish_metrics().observe_version_attempts(network.as_str(), attempts);

        match resolved {
            Ok(r) => Ok(Some((r.value, r.version))),
            Err(err) if fallback => {
                tracing::warn!(target: "publish", %network, error = %err, "admin plugin install skipped");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

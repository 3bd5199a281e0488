// Path: crates/cli/src/commands/publish.rs

use crate::util::{print_json, rpc_client, Registries};
use alloy_primitives::Address;
use anyhow::Result;
use clap::Parser;
use daokit_publish::{DaoPublisher, PublishDaoParams, SimulationStatus};
use daokit_telemetry::error_metrics;
use daokit_types::error::ErrorCode;
use daokit_types::Network;

#[derive(Parser, Debug)]
pub struct PublishDaoArgs {
    #[clap(long)]
    pub network: Network,

    /// The wallet that will sign. Becomes the DAO admin.
    #[clap(long)]
    pub creator: Address,

    /// CID of the pinned metadata document (`ipfs://`, `/ipfs/` and gateway forms accepted).
    #[clap(long)]
    pub metadata_cid: String,

    /// ENS subdomain to register.
    #[clap(long)]
    pub subdomain: Option<String>,

    /// RPC endpoint for code checks and simulation.
    #[clap(long)]
    pub rpc_url: Option<String>,
}

pub async fn run(args: PublishDaoArgs, registries: &Registries) -> Result<()> {
    let client = rpc_client(&registries.networks, args.network, args.rpc_url.as_deref())?;
    let publisher = DaoPublisher::new(&registries.networks, &registries.plugins, &client);

    let params = PublishDaoParams {
        network: args.network,
        subdomain: args.subdomain,
        metadata_cid: args.metadata_cid,
        creator: args.creator,
    };
    let tx = publisher.build_transaction(&params).await.map_err(|e| {
        error_metrics().inc_error("publish", e.code());
        e
    })?;

    if tx.simulation == SimulationStatus::Skipped {
        tracing::warn!(
            target: "cli",
            network = %params.network,
            "createDao could not be simulated; the transaction may revert"
        );
    }
    print_json(&tx)
}

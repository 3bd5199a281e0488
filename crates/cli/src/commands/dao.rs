// Path: crates/cli/src/commands/dao.rs

use crate::util::{print_json, ReceiptArgs, Registries};
use anyhow::{anyhow, Result};
use clap::Parser;
use daokit_tx::dao_factory::get_dao_address;
use daokit_types::Network;

#[derive(Parser, Debug)]
pub struct DaoAddressArgs {
    #[clap(long)]
    pub network: Network,

    #[clap(flatten)]
    pub receipt: ReceiptArgs,
}

pub async fn run(args: DaoAddressArgs, registries: &Registries) -> Result<()> {
    let receipt = args.receipt.load(&registries.networks, args.network).await?;
    let dao = get_dao_address(&receipt)
        .ok_or_else(|| anyhow!("Receipt has no DAORegistered event"))?;
    print_json(&serde_json::json!({ "dao": dao, "network": args.network }))
}

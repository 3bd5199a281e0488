// Path: crates/cli/src/commands/plugin.rs

use crate::util::{print_json, ReceiptArgs, Registries};
use alloy_primitives::Address;
use anyhow::Result;
use clap::Parser;
use daokit_tx::plugins::{build_prepare_install_data, PrepareInstallRequest};
use daokit_tx::{
    get_plugin_installation_setup_data, get_plugin_uninstall_setup_data,
    get_plugin_update_setup_data, PluginTransactionBuilder, TransactionRequest,
};
use daokit_types::error::TransactionError;
use daokit_types::{Network, PluginId};

#[derive(Parser, Debug)]
pub struct PrepareInstallArgs {
    #[clap(long)]
    pub network: Network,

    /// Plugin interface type, e.g. `admin` or `harmonyHipVoting`.
    #[clap(long)]
    pub plugin: PluginId,

    #[clap(long)]
    pub dao: Address,

    /// Admin plugin only. Defaults to the DAO itself.
    #[clap(long)]
    pub admin: Option<Address>,

    /// Route plugin actions through the global executor (staged governance).
    #[clap(long)]
    pub advanced_governance: bool,
}

#[derive(Parser, Debug)]
pub struct ApplyInstallArgs {
    #[clap(long)]
    pub network: Network,

    #[clap(long)]
    pub dao: Address,

    #[clap(flatten)]
    pub receipt: ReceiptArgs,

    /// Gate the first plugin's EXECUTE_PERMISSION behind this condition contract.
    #[clap(long)]
    pub execute_condition: Option<Address>,
}

#[derive(Parser, Debug)]
pub struct ApplyUpdateArgs {
    #[clap(long)]
    pub network: Network,

    #[clap(long)]
    pub dao: Address,

    /// Updated plugin addresses, in the order their updates were prepared.
    #[clap(long = "plugin", id = "plugin", required = true)]
    pub plugins: Vec<Address>,

    #[clap(flatten)]
    pub receipt: ReceiptArgs,
}

#[derive(Parser, Debug)]
pub struct ApplyUninstallArgs {
    #[clap(long)]
    pub network: Network,

    #[clap(long)]
    pub dao: Address,

    #[clap(flatten)]
    pub receipt: ReceiptArgs,
}

pub fn run_prepare_install(args: PrepareInstallArgs, registries: &Registries) -> Result<()> {
    let builder = PluginTransactionBuilder::for_network(&registries.networks, args.network)?;
    let request = PrepareInstallRequest {
        dao: args.dao,
        advanced_governance: args.advanced_governance,
        admin: args.admin,
    };
    let data = build_prepare_install_data(&builder, &registries.plugins, args.plugin, &request)?;

    let psp = registries
        .networks
        .get(args.network)?
        .addresses
        .plugin_setup_processor;
    if psp.is_zero() {
        return Err(TransactionError::AddressNotConfigured {
            contract: "pluginSetupProcessor",
            network: args.network,
        }
        .into());
    }
    print_json(&TransactionRequest::call(psp, data))
}

pub async fn run_apply_install(args: ApplyInstallArgs, registries: &Registries) -> Result<()> {
    let receipt = args.receipt.load(&registries.networks, args.network).await?;
    let setup_data = get_plugin_installation_setup_data(&receipt);
    if setup_data.is_empty() {
        return Err(TransactionError::EmptySetupData("installation").into());
    }

    let builder = PluginTransactionBuilder::for_network(&registries.networks, args.network)?;
    let actions = builder.build_apply_plugins_installation_actions(
        args.dao,
        &setup_data,
        &[],
        args.execute_condition,
    )?;
    tracing::info!(
        target: "cli",
        plugins = setup_data.len(),
        actions = actions.len(),
        "built installation actions"
    );
    print_json(&actions)
}

pub async fn run_apply_update(args: ApplyUpdateArgs, registries: &Registries) -> Result<()> {
    let receipt = args.receipt.load(&registries.networks, args.network).await?;
    let setup_data = get_plugin_update_setup_data(&receipt);
    if setup_data.is_empty() {
        return Err(TransactionError::EmptySetupData("update").into());
    }

    let builder = PluginTransactionBuilder::for_network(&registries.networks, args.network)?;
    let actions = builder.build_apply_plugins_update_actions(args.dao, &args.plugins, &setup_data)?;
    print_json(&actions)
}

pub async fn run_apply_uninstall(args: ApplyUninstallArgs, registries: &Registries) -> Result<()> {
    let receipt = args.receipt.load(&registries.networks, args.network).await?;
    let setup_data = get_plugin_uninstall_setup_data(&receipt)
        .into_iter()
        .next()
        .ok_or(TransactionError::EmptySetupData("uninstallation"))?;

    let builder = PluginTransactionBuilder::for_network(&registries.networks, args.network)?;
    let actions = builder.build_apply_plugin_uninstallation_action(args.dao, &setup_data)?;
    print_json(&actions)
}

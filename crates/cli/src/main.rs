// Path: crates/cli/src/main.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # daokit CLI
//!
//! Runs the proxy gateway and exposes the transaction builders offline: the
//! output of every builder command is JSON on stdout, ready for a wallet.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod util;

use commands::*;

#[derive(Parser, Debug)]
#[clap(
    name = "daokit",
    version,
    about = "DAO plugin transaction builders and the daokit proxy gateway."
)]
struct Cli {
    /// Replaces the built-in network registry (TOML).
    #[clap(long, global = true)]
    networks: Option<PathBuf>,

    /// Replaces the built-in plugin registry (TOML).
    #[clap(long, global = true)]
    plugins: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    // --- Gateway ---
    /// Serve the RPC and backend proxy routes.
    Serve(serve::ServeArgs),

    // --- DAO creation ---
    /// Build (and simulate) the DAOFactory.createDao transaction.
    PublishDao(publish::PublishDaoArgs),

    /// Recover the created DAO address from a createDao receipt.
    DaoAddress(dao::DaoAddressArgs),

    // --- Plugin setup ---
    /// Build the prepareInstallation call for a plugin.
    PrepareInstall(plugin::PrepareInstallArgs),

    /// Build the DAO actions applying prepared installations.
    ApplyInstall(plugin::ApplyInstallArgs),

    /// Build the DAO actions applying prepared updates.
    ApplyUpdate(plugin::ApplyUpdateArgs),

    /// Build the DAO actions applying a prepared uninstallation.
    ApplyUninstall(plugin::ApplyUninstallArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    daokit_telemetry::init::init_tracing()?;

    let registries = util::Registries::load(cli.networks.as_deref(), cli.plugins.as_deref())?;

    match cli.command {
        Commands::Serve(args) => serve::run(args, cli.networks.as_deref()).await,
        Commands::PublishDao(args) => publish::run(args, &registries).await,
        Commands::DaoAddress(args) => dao::run(args, &registries).await,
        Commands::PrepareInstall(args) => plugin::run_prepare_install(args, &registries),
        Commands::ApplyInstall(args) => plugin::run_apply_install(args, &registries).await,
        Commands::ApplyUpdate(args) => plugin::run_apply_update(args, &registries).await,
        Commands::ApplyUninstall(args) => plugin::run_apply_uninstall(args, &registries).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_apply_update_with_repeated_plugins() {
        let cli = Cli::try_parse_from([
            "daokit",
            "apply-update",
            "--network",
            "ethereum-sepolia",
            "--dao",
            "0x00000000000000000000000000000000000000d0",
            "--plugin",
            "0x0000000000000000000000000000000000000001",
            "--plugin",
            "0x0000000000000000000000000000000000000002",
            "--receipt",
            "receipt.json",
        ])
        .unwrap();
        match cli.command {
            Commands::ApplyUpdate(args) => assert_eq!(args.plugins.len(), 2),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn receipt_and_tx_hash_conflict() {
        let res = Cli::try_parse_from([
            "daokit",
            "dao-address",
            "--network",
            "ethereum-sepolia",
            "--receipt",
            "r.json",
            "--tx-hash",
            "0x0000000000000000000000000000000000000000000000000000000000000001",
        ]);
        assert!(res.is_err());
    }
}

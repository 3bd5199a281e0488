// Path: crates/tx/src/lib.rs
#![forbid(unsafe_code)]
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

//! # daokit Transactions
//!
//! Pure builders for the transactions a DAO needs to manage its plugins and
//! for the DAO-creation call itself. Nothing here performs I/O: inputs are
//! registry entries, addresses and receipts already fetched by the caller, and
//! the output is an ordered list of [`TransactionRequest`]s for the wallet.

/// Solidity bindings for the protocol contracts.
pub mod abi;
/// `createDao` encoding and DAO address recovery.
pub mod dao_factory;
/// IPFS metadata pointers.
pub mod metadata;
/// Grant/revoke permission pairs.
pub mod permission;
/// Prepare/apply builders for the plugin setup processor.
pub mod plugin;
/// Per-plugin install payloads.
pub mod plugins;
/// Transaction receipts and event decoding.
pub mod receipt;
pub mod request;

pub use permission::{build_grant_revoke_permission_transactions, PermissionId, PermissionTuple};
pub use plugin::{
    build_prepare_installation_data, get_plugin_installation_setup_data,
    get_plugin_uninstall_setup_data, get_plugin_update_setup_data, wrap_as_dao_execute,
    PluginTransactionBuilder,
};
pub use receipt::TransactionReceipt;
pub use request::TransactionRequest;

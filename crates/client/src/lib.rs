// Path: crates/client/src/lib.rs
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

//! # daokit Client
//!
//! The minimal chain surface the publish flow and the CLI need: deployed code
//! lookups, `eth_call` simulation and receipt retrieval. [`ChainClient`] is the
//! seam; [`JsonRpcClient`] talks to a node over HTTP.

mod json_rpc;

pub use json_rpc::JsonRpcClient;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use daokit_tx::{TransactionReceipt, TransactionRequest};
use daokit_types::error::ClientError;

/// Read-only access to a chain.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Runtime bytecode at `address`; empty when nothing is deployed.
    async fn get_code(&self, address: Address) -> Result<Bytes, ClientError>;

    /// Dry-runs `tx` as if sent by `from` against the latest block and returns
    /// the call's return data. Reverts surface as [`ClientError::Rpc`].
    async fn simulate(&self, from: Address, tx: &TransactionRequest) -> Result<Bytes, ClientError>;

    /// `None` while the transaction is pending or unknown.
    async fn get_transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, ClientError>;

    /// `true` if `address` holds contract code.
    async fn has_code(&self, address: Address) -> Result<bool, ClientError> {
        Ok(!self.get_code(address).await?.is_empty())
    }
}

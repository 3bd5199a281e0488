// Path: crates/tx/src/request.rs
use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// The unit of work handed to the wallet layer for signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    /// Gas limit override for chains where estimation is unreliable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
}

impl TransactionRequest {
    /// A zero-value call without a gas override.
    pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
            value: U256::ZERO,
            gas: None,
        }
    }

    /// The 4-byte function selector, if the calldata has one.
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.data.get(..4).and_then(|s| s.try_into().ok())
    }
}

// Path: crates/tx/src/receipt.rs
//! The subset of a JSON-RPC transaction receipt needed to recover setup data.

use alloy_primitives::{Address, Bytes, LogData, B256, U64};
use alloy_sol_types::SolEvent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

impl ReceiptLog {
    pub fn from_log_data(address: Address, log: LogData) -> Self {
        let (topics, data) = log.split();
        Self {
            address,
            topics,
            data,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub logs: Vec<ReceiptLog>,
}

impl TransactionReceipt {
    /// `true` unless the node reported a reverted transaction.
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |s| s == U64::from(1))
    }

    /// Decodes every log whose first topic is `E`'s signature hash. Logs that
    /// match the signature but fail to decode are skipped.
    pub fn decode_events<E: SolEvent>(&self) -> Vec<(Address, E)> {
        self.logs
            .iter()
            .filter(|log| log.topics.first() == Some(&E::SIGNATURE_HASH))
            .filter_map(|log| {
                let data = LogData::new_unchecked(log.topics.clone(), log.data.clone());
                match E::decode_log_data(&data, true) {
                    Ok(event) => Some((log.address, event)),
                    Err(e) => {
                        tracing::debug!(
                            target: "tx",
                            event = E::SIGNATURE,
                            emitter = %log.address,
                            error = %e,
                            "skipping undecodable log"
                        );
                        None
                    }
                }
            })
            .collect()
    }
}

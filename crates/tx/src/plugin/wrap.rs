// Path: crates/tx/src/plugin/wrap.rs
use crate::abi::{Action, IDAO};
use crate::request::TransactionRequest;
use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolCall;
use daokit_types::network::NetworkQuirks;

/// Re-issues `tx` through `DAO.execute` so that `msg.sender` is the DAO.
///
/// Only applies on networks with `requires_execute_wrapping`, and only to
/// calls that target the DAO itself or the setup processor. Everything else is
/// returned untouched.
pub fn wrap_as_dao_execute(
    quirks: &NetworkQuirks,
    dao: Address,
    setup_processor: Address,
    tx: TransactionRequest,
) -> TransactionRequest {
    if !quirks.requires_execute_wrapping {
        return tx;
    }
    if tx.to != dao && tx.to != setup_processor {
        return tx;
    }

    let execute = IDAO::executeCall {
        callId: B256::ZERO,
        actions: vec![Action {
            to: tx.to,
            value: tx.value,
            data: tx.data,
        }],
        allowFailureMap: U256::ZERO,
    };
    TransactionRequest::call(dao, execute.abi_encode())
}

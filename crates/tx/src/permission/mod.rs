// Path: crates/tx/src/permission/mod.rs
//! Grant/revoke transaction pairs against a DAO's permission manager.

use crate::abi::IDAO;
use crate::request::TransactionRequest;
use alloy_primitives::{keccak256, Address, B256};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};

/// Well-known permission identifiers, hashed from their names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionId {
    Root,
    UpgradePlugin,
    Execute,
}

impl PermissionId {
    pub fn name(&self) -> &'static str {
        match self {
            PermissionId::Root => "ROOT_PERMISSION",
            PermissionId::UpgradePlugin => "UPGRADE_PLUGIN_PERMISSION",
            PermissionId::Execute => "EXECUTE_PERMISSION",
        }
    }

    pub fn id(&self) -> B256 {
        keccak256(self.name())
    }
}

/// One edge of a DAO's permission graph.
///
/// `who` may call functions guarded by `what` on `where_`. `to` is the
/// permission manager that records the edge, i.e. the transaction target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionTuple {
    #[serde(rename = "where")]
    pub where_: Address,
    pub who: Address,
    pub what: B256,
    pub to: Address,
}

/// Returns `[grant, revoke]` for the tuple, in that order.
pub fn build_grant_revoke_permission_transactions(
    permission: &PermissionTuple,
) -> [TransactionRequest; 2] {
    let grant = IDAO::grantCall {
        _where: permission.where_,
        _who: permission.who,
        _permissionId: permission.what,
    };
    let revoke = IDAO::revokeCall {
        _where: permission.where_,
        _who: permission.who,
        _permissionId: permission.what,
    };
    [
        TransactionRequest::call(permission.to, grant.abi_encode()),
        TransactionRequest::call(permission.to, revoke.abi_encode()),
    ]
}

/// Replaces the plugin's unconditional `EXECUTE_PERMISSION` on the DAO with one
/// gated by `condition`: `[revoke, grantWithCondition]`.
pub fn build_execute_condition_transactions(
    dao: Address,
    plugin: Address,
    condition: Address,
) -> [TransactionRequest; 2] {
    let execute = PermissionId::Execute.id();
    let revoke = IDAO::revokeCall {
        _where: dao,
        _who: plugin,
        _permissionId: execute,
    };
    let grant = IDAO::grantWithConditionCall {
        _where: dao,
        _who: plugin,
        _permissionId: execute,
        _condition: condition,
    };
    [
        TransactionRequest::call(dao, revoke.abi_encode()),
        TransactionRequest::call(dao, grant.abi_encode()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;
    use proptest::prelude::*;

    fn arb_address() -> impl Strategy<Value = Address> {
        any::<[u8; 20]>().prop_map(Address::from)
    }

    fn arb_tuple() -> impl Strategy<Value = PermissionTuple> {
        (arb_address(), arb_address(), any::<[u8; 32]>(), arb_address()).prop_map(
            |(where_, who, what, to)| PermissionTuple {
                where_,
                who,
                what: B256::from(what),
                to,
            },
        )
    }

    proptest! {
        #[test]
        fn grant_then_revoke_with_identical_fields(p in arb_tuple()) {
            let [grant, revoke] = build_grant_revoke_permission_transactions(&p);

            prop_assert_eq!(grant.to, p.to);
            prop_assert_eq!(revoke.to, p.to);

            let g = IDAO::grantCall::abi_decode(&grant.data, true).unwrap();
            let r = IDAO::revokeCall::abi_decode(&revoke.data, true).unwrap();
            prop_assert_eq!((g._where, g._who, g._permissionId), (p.where_, p.who, p.what));
            prop_assert_eq!((r._where, r._who, r._permissionId), (p.where_, p.who, p.what));
        }
    }

    #[test]
    fn root_permission_id_matches_protocol_constant() {
        assert_eq!(
            PermissionId::Root.id(),
            b256!("815fe80e4b37c8582a3b773d1d7071f983eacfd56b5965db654f3087c25ada33")
        );
    }

    #[test]
    fn execute_condition_revokes_before_regranting() {
        let dao = Address::repeat_byte(0xda);
        let plugin = Address::repeat_byte(0x01);
        let condition = Address::repeat_byte(0xc0);

        let [revoke, grant] = build_execute_condition_transactions(dao, plugin, condition);
        assert_eq!(revoke.selector(), Some(IDAO::revokeCall::SELECTOR));
        assert_eq!(grant.selector(), Some(IDAO::grantWithConditionCall::SELECTOR));

        let g = IDAO::grantWithConditionCall::abi_decode(&grant.data, true).unwrap();
        assert_eq!(g._who, plugin);
        assert_eq!(g._condition, condition);
        assert_eq!(g._permissionId, PermissionId::Execute.id());
    }
}

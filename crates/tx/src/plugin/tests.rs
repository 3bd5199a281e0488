// Path: crates/tx/src/plugin/tests.rs
use super::*;
use crate::abi::{Action, PreparedSetupData, Tag, IDAO};
use crate::receipt::{ReceiptLog, TransactionReceipt};
use alloy_primitives::U256;
use alloy_sol_types::SolEvent;
use daokit_types::network::ContractAddresses;
use proptest::prelude::*;

const PSP: Address = Address::repeat_byte(0x50);
const DAO: Address = Address::repeat_byte(0xda);

fn definition(wrapping: bool) -> NetworkDefinition {
    let registry = NetworkRegistry::builtin().unwrap();
    let mut def = registry.get(Network::EthereumSepolia).unwrap().clone();
    def.addresses = ContractAddresses {
        plugin_setup_processor: PSP,
        global_executor: Address::repeat_byte(0xee),
        ..Default::default()
    };
    def.quirks.requires_execute_wrapping = wrapping;
    def
}

fn arb_address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from)
}

fn arb_permission() -> impl Strategy<Value = PermissionChange> {
    (arb_address(), arb_address(), any::<[u8; 32]>()).prop_map(|(where_, who, id)| PermissionChange {
        operation: PermissionOperation::Grant,
        where_,
        who,
        condition: Address::ZERO,
        permission_id: B256::from(id),
    })
}

fn arb_prepared(max_permissions: usize) -> impl Strategy<Value = PreparedSetup> {
    (
        prop::collection::vec(arb_address(), 0..3),
        prop::collection::vec(arb_permission(), 0..=max_permissions),
    )
        .prop_map(|(helpers, permissions)| PreparedSetup {
            helpers,
            permissions,
        })
}

fn arb_installation() -> impl Strategy<Value = InstallationSetupData> {
    (arb_address(), arb_address(), 1u8..4, 0u16..4, arb_prepared(2)).prop_map(
        |(plugin_address, plugin_setup_repo, release, build, prepared_setup_data)| {
            InstallationSetupData {
                plugin_address,
                plugin_setup_repo,
                version_tag: VersionTag::new(release, build),
                prepared_setup_data,
            }
        },
    )
}

fn arb_update(max_permissions: usize) -> impl Strategy<Value = UpdateSetupData> {
    (arb_address(), arb_prepared(max_permissions)).prop_map(|(plugin_setup_repo, prepared_setup_data)| {
        UpdateSetupData {
            plugin_setup_repo,
            version_tag: VersionTag::new(1, 2),
            prepared_setup_data,
            init_data: Bytes::from_static(&[0xab, 0xcd]),
        }
    })
}

fn decode_grant(tx: &TransactionRequest) -> IDAO::grantCall {
    IDAO::grantCall::abi_decode(&tx.data, true).unwrap()
}

fn decode_revoke(tx: &TransactionRequest) -> IDAO::revokeCall {
    IDAO::revokeCall::abi_decode(&tx.data, true).unwrap()
}

proptest! {
    #[test]
    fn installation_batch_is_bracketed_by_root(list in prop::collection::vec(arb_installation(), 0..5)) {
        let def = definition(false);
        let builder = PluginTransactionBuilder::new(Network::EthereumSepolia, &def);
        let actions = builder
            .build_apply_plugins_installation_actions(DAO, &list, &[], None)
            .unwrap();

        prop_assert_eq!(actions.len(), list.len() + 2);

        let grant = decode_grant(&actions[0]);
        prop_assert_eq!((grant._where, grant._who), (DAO, PSP));
        prop_assert_eq!(grant._permissionId, PermissionId::Root.id());

        for (action, data) in actions[1..=list.len()].iter().zip(&list) {
            prop_assert_eq!(action.to, PSP);
            let apply = IPluginSetupProcessor::applyInstallationCall::abi_decode(&action.data, true).unwrap();
            prop_assert_eq!(apply.dao, DAO);
            prop_assert_eq!(apply.params.plugin, data.plugin_address);
            prop_assert_eq!(apply.params.pluginSetupRef.pluginSetupRepo, data.plugin_setup_repo);
            prop_assert_eq!(apply.params.helpersHash, hash_helpers(&data.prepared_setup_data.helpers));
        }

        let revoke = decode_revoke(actions.last().unwrap());
        prop_assert_eq!(revoke._permissionId, PermissionId::Root.id());
    }

    #[test]
    fn update_without_permissions_is_three_per_plugin(list in prop::collection::vec(arb_update(0), 0..5)) {
        let def = definition(false);
        let builder = PluginTransactionBuilder::new(Network::EthereumSepolia, &def);
        let plugins: Vec<Address> = (0..list.len()).map(|i| Address::with_last_byte(i as u8 + 1)).collect();

        let actions = builder.build_apply_plugins_update_actions(DAO, &plugins, &list).unwrap();
        prop_assert_eq!(actions.len(), 3 * list.len());

        for (triple, plugin) in actions.chunks(3).zip(&plugins) {
            let grant = decode_grant(&triple[0]);
            prop_assert_eq!(grant._where, *plugin);
            prop_assert_eq!(grant._permissionId, PermissionId::UpgradePlugin.id());
            let apply = IPluginSetupProcessor::applyUpdateCall::abi_decode(&triple[1].data, true).unwrap();
            prop_assert_eq!(apply.params.plugin, *plugin);
            let revoke = decode_revoke(&triple[2]);
            prop_assert_eq!(revoke._where, *plugin);
        }
    }

    #[test]
    fn update_with_permissions_adds_root_around_batch(
        mut list in prop::collection::vec(arb_update(0), 0..4),
        extra in arb_permission(),
    ) {
        let mut with_permissions = list.first().cloned().unwrap_or_else(|| UpdateSetupData {
            plugin_setup_repo: Address::repeat_byte(0x77),
            version_tag: VersionTag::new(1, 2),
            prepared_setup_data: PreparedSetup::default(),
            init_data: Bytes::new(),
        });
        with_permissions.prepared_setup_data.permissions.push(extra);
        list.push(with_permissions);

        let def = definition(false);
        let builder = PluginTransactionBuilder::new(Network::EthereumSepolia, &def);
        let plugins: Vec<Address> = (0..list.len()).map(|i| Address::with_last_byte(i as u8 + 1)).collect();

        let actions = builder.build_apply_plugins_update_actions(DAO, &plugins, &list).unwrap();
        prop_assert_eq!(actions.len(), 3 * list.len() + 2);
        prop_assert_eq!(decode_grant(&actions[0])._permissionId, PermissionId::Root.id());
        prop_assert_eq!(decode_revoke(actions.last().unwrap())._permissionId, PermissionId::Root.id());
    }

    #[test]
    fn wrap_is_identity_on_foreign_targets(to in arb_address(), data in prop::collection::vec(any::<u8>(), 0..64)) {
        prop_assume!(to != DAO && to != PSP);
        let def = definition(true);
        let tx = TransactionRequest::call(to, data);
        prop_assert_eq!(wrap_as_dao_execute(&def.quirks, DAO, PSP, tx.clone()), tx);
    }
}

#[test]
fn installation_keeps_extras_before_revoke_and_condition_after() {
    let def = definition(false);
    let builder = PluginTransactionBuilder::new(Network::EthereumSepolia, &def);
    let plugin = Address::repeat_byte(0x01);
    let setup = InstallationSetupData {
        plugin_address: plugin,
        plugin_setup_repo: Address::repeat_byte(0x02),
        version_tag: VersionTag::new(1, 3),
        prepared_setup_data: PreparedSetup::default(),
    };
    let extra = TransactionRequest::call(Address::repeat_byte(0x99), vec![1, 2, 3]);
    let condition = Address::repeat_byte(0xc0);

    let actions = builder
        .build_apply_plugins_installation_actions(DAO, &[setup], &[extra.clone()], Some(condition))
        .unwrap();

    assert_eq!(actions.len(), 6);
    assert_eq!(actions[2], extra);
    assert_eq!(decode_revoke(&actions[3])._permissionId, PermissionId::Root.id());

    let revoke_execute = decode_revoke(&actions[4]);
    assert_eq!(revoke_execute._who, plugin);
    assert_eq!(revoke_execute._permissionId, PermissionId::Execute.id());
    let regrant = IDAO::grantWithConditionCall::abi_decode(&actions[5].data, true).unwrap();
    assert_eq!(regrant._condition, condition);
}

#[test]
fn execute_condition_without_setup_data_is_rejected() {
    let def = definition(false);
    let builder = PluginTransactionBuilder::new(Network::EthereumSepolia, &def);
    let err = builder
        .build_apply_plugins_installation_actions(DAO, &[], &[], Some(Address::repeat_byte(0xc0)))
        .unwrap_err();
    assert!(matches!(err, TransactionError::EmptySetupData(_)));
}

#[test]
fn unconfigured_setup_processor_fails_fast() {
    let mut def = definition(false);
    def.addresses.plugin_setup_processor = Address::ZERO;
    let builder = PluginTransactionBuilder::new(Network::EthereumSepolia, &def);
    let err = builder
        .build_apply_plugins_installation_actions(DAO, &[], &[], None)
        .unwrap_err();
    assert!(matches!(
        err,
        TransactionError::AddressNotConfigured { contract: "pluginSetupProcessor", .. }
    ));
}

#[test]
fn update_rejects_mismatched_lengths() {
    let def = definition(false);
    let builder = PluginTransactionBuilder::new(Network::EthereumSepolia, &def);
    let err = builder
        .build_apply_plugins_update_actions(DAO, &[Address::repeat_byte(1)], &[])
        .unwrap_err();
    assert!(matches!(err, TransactionError::LengthMismatch { plugins: 1, setup_data: 0 }));
}

#[test]
fn uninstallation_is_grant_apply_revoke() {
    let def = definition(false);
    let builder = PluginTransactionBuilder::new(Network::EthereumSepolia, &def);
    let setup = UninstallSetupData {
        plugin_address: Address::repeat_byte(0x01),
        plugin_setup_repo: Address::repeat_byte(0x02),
        version_tag: VersionTag::new(1, 1),
        permissions: vec![],
    };
    let actions = builder.build_apply_plugin_uninstallation_action(DAO, &setup).unwrap();
    assert_eq!(actions.len(), 3);
    assert_eq!(actions[0].selector(), Some(IDAO::grantCall::SELECTOR));
    assert_eq!(
        actions[1].selector(),
        Some(IPluginSetupProcessor::applyUninstallationCall::SELECTOR)
    );
    assert_eq!(actions[2].selector(), Some(IDAO::revokeCall::SELECTOR));
}

#[test]
fn wrapping_network_routes_privileged_calls_through_dao_execute() {
    let def = definition(true);
    let builder = PluginTransactionBuilder::new(Network::EthereumSepolia, &def);
    let setup = UninstallSetupData {
        plugin_address: Address::repeat_byte(0x01),
        plugin_setup_repo: Address::repeat_byte(0x02),
        version_tag: VersionTag::new(1, 1),
        permissions: vec![],
    };
    let actions = builder.build_apply_plugin_uninstallation_action(DAO, &setup).unwrap();

    for action in &actions {
        assert_eq!(action.to, DAO);
        assert_eq!(action.selector(), Some(IDAO::executeCall::SELECTOR));
    }

    let execute = IDAO::executeCall::abi_decode(&actions[1].data, true).unwrap();
    assert_eq!(execute.callId, B256::ZERO);
    assert_eq!(execute.allowFailureMap, U256::ZERO);
    let [Action { to, .. }] = execute.actions.as_slice() else {
        panic!("expected a single inner action");
    };
    assert_eq!(*to, PSP);
}

#[test]
fn prepared_installation_round_trips_through_receipt() {
    let repository = Address::repeat_byte(0x42);
    let tag = VersionTag::new(1, 2);
    let calldata = crate::build_prepare_installation_data(repository, tag, Bytes::from_static(b"init"), DAO);
    let prepared = IPluginSetupProcessor::prepareInstallationCall::abi_decode(&calldata, true).unwrap();

    let event = IPluginSetupProcessor::InstallationPrepared {
        sender: Address::repeat_byte(0x5e),
        dao: prepared.dao,
        preparedSetupId: B256::repeat_byte(0x11),
        pluginSetupRepo: prepared.params.pluginSetupRef.pluginSetupRepo,
        versionTag: prepared.params.pluginSetupRef.versionTag,
        data: prepared.params.data,
        plugin: Address::repeat_byte(0x01),
        preparedSetupData: PreparedSetupData {
            helpers: vec![Address::repeat_byte(0x0f)],
            permissions: vec![],
        },
    };
    let receipt = TransactionReceipt {
        logs: vec![
            ReceiptLog {
                address: PSP,
                topics: vec![B256::repeat_byte(0xff)],
                data: Bytes::new(),
            },
            ReceiptLog::from_log_data(PSP, event.encode_log_data()),
        ],
        ..Default::default()
    };

    let recovered = get_plugin_installation_setup_data(&receipt);
    assert_eq!(recovered.len(), 1);
    assert_eq!(recovered[0].plugin_setup_repo, repository);
    assert_eq!(recovered[0].version_tag, tag);
    assert_eq!(recovered[0].prepared_setup_data.helpers, vec![Address::repeat_byte(0x0f)]);
}

#[test]
fn receipt_without_prepared_events_yields_nothing() {
    assert!(get_plugin_installation_setup_data(&TransactionReceipt::default()).is_empty());
    assert!(get_plugin_update_setup_data(&TransactionReceipt::default()).is_empty());
    assert!(get_plugin_uninstall_setup_data(&TransactionReceipt::default()).is_empty());
}

#[test]
fn uninstall_event_with_unknown_operation_is_skipped() {
    let event = IPluginSetupProcessor::UninstallationPrepared {
        sender: Address::ZERO,
        dao: DAO,
        preparedSetupId: B256::ZERO,
        pluginSetupRepo: Address::repeat_byte(0x02),
        versionTag: Tag { release: 1, build: 1 },
        setupPayload: crate::abi::SetupPayload {
            plugin: Address::repeat_byte(0x01),
            currentHelpers: vec![],
            data: Bytes::new(),
        },
        permissions: vec![MultiTargetPermission {
            operation: 7,
            where_: DAO,
            who: PSP,
            condition: Address::ZERO,
            permissionId: B256::ZERO,
        }],
    };
    let receipt = TransactionReceipt {
        logs: vec![ReceiptLog::from_log_data(PSP, event.encode_log_data())],
        ..Default::default()
    };
    assert!(get_plugin_uninstall_setup_data(&receipt).is_empty());
}

#[test]
fn advanced_governance_delegates_to_global_executor() {
    let def = definition(false);
    let builder = PluginTransactionBuilder::new(Network::EthereumSepolia, &def);

    let plain = builder.plugin_target_config(DAO, false).unwrap();
    assert_eq!(plain.target, DAO);
    assert_eq!(plain.operation, TargetOperation::Call);

    let advanced = builder.plugin_target_config(DAO, true).unwrap();
    assert_eq!(advanced.target, Address::repeat_byte(0xee));
    assert_eq!(advanced.operation, TargetOperation::DelegateCall);
}

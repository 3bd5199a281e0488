// Path: crates/tx/src/dao_factory.rs
//! `DAOFactory.createDao` encoding and DAO address recovery.

use crate::abi::{DAOSettings, IDAOFactory, IDAORegistry, PluginSettings, PluginSetupRef};
use crate::metadata::metadata_pointer;
use crate::plugin::{PluginTargetConfig, TargetOperation};
use crate::plugins::admin;
use crate::receipt::TransactionReceipt;
use crate::request::TransactionRequest;
use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use daokit_types::VersionTag;

/// Settings for a new DAO: no trusted forwarder and an empty DAO URI.
pub fn build_dao_settings(subdomain: Option<&str>, metadata_cid: &str) -> DAOSettings {
    DAOSettings {
        trustedForwarder: Address::ZERO,
        daoURI: String::new(),
        subdomain: subdomain.unwrap_or_default().to_string(),
        metadata: metadata_pointer(metadata_cid),
    }
}

/// The admin plugin installed at creation time.
///
/// The DAO does not exist yet, so the target config cannot point at it; a zero
/// target with `Call` makes the setup contract fall back to the new DAO.
pub fn build_admin_plugin_settings(
    repository: Address,
    admin: Address,
    version_tag: VersionTag,
) -> PluginSettings {
    let target = PluginTargetConfig {
        target: Address::ZERO,
        operation: TargetOperation::Call,
    };
    PluginSettings {
        pluginSetupRef: PluginSetupRef {
            versionTag: version_tag.into(),
            pluginSetupRepo: repository,
        },
        data: admin::encode_install_data(admin, target),
    }
}

pub fn encode_create_dao(settings: &DAOSettings, plugins: &[PluginSettings]) -> Bytes {
    IDAOFactory::createDaoCall {
        daoSettings: settings.clone(),
        pluginSettings: plugins.to_vec(),
    }
    .abi_encode()
    .into()
}

pub fn build_create_dao_transaction(
    factory: Address,
    settings: &DAOSettings,
    plugins: &[PluginSettings],
) -> TransactionRequest {
    TransactionRequest::call(factory, encode_create_dao(settings, plugins))
}

/// The DAO announced by the first `DAORegistered` event in the receipt.
pub fn get_dao_address(receipt: &TransactionReceipt) -> Option<Address> {
    receipt
        .decode_events::<IDAORegistry::DAORegistered>()
        .into_iter()
        .next()
        .map(|(_, event)| event.dao)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::TargetConfig;
    use crate::receipt::ReceiptLog;
    use alloy_sol_types::{SolEvent, SolValue};

    #[test]
    fn create_dao_encodes_settings_and_admin_plugin() {
        let settings = build_dao_settings(Some("my-dao"), "ipfs://QmMeta");
        let admin = Address::repeat_byte(0x0a);
        let plugin = build_admin_plugin_settings(Address::repeat_byte(0xad), admin, VersionTag::new(1, 1));
        let factory = Address::repeat_byte(0xfa);

        let tx = build_create_dao_transaction(factory, &settings, &[plugin]);
        assert_eq!(tx.to, factory);

        let call = IDAOFactory::createDaoCall::abi_decode(&tx.data, true).unwrap();
        assert_eq!(call.daoSettings.subdomain, "my-dao");
        assert_eq!(call.daoSettings.daoURI, "");
        assert_eq!(call.daoSettings.trustedForwarder, Address::ZERO);
        assert_eq!(call.daoSettings.metadata.as_ref(), b"ipfs://QmMeta");

        let [settings] = call.pluginSettings.as_slice() else {
            panic!("expected one plugin");
        };
        assert_eq!(VersionTag::from(settings.pluginSetupRef.versionTag.clone()), VersionTag::new(1, 1));
        let (decoded_admin, target) =
            <(Address, TargetConfig)>::abi_decode_params(&settings.data, true).unwrap();
        assert_eq!(decoded_admin, admin);
        assert_eq!(target.target, Address::ZERO);
    }

    #[test]
    fn dao_address_comes_from_registry_event() {
        let dao = Address::repeat_byte(0xda);
        let event = IDAORegistry::DAORegistered {
            dao,
            creator: Address::repeat_byte(0xc1),
            subdomain: "my-dao".into(),
        };
        let receipt = TransactionReceipt {
            logs: vec![ReceiptLog::from_log_data(Address::repeat_byte(0x1e), event.encode_log_data())],
            ..Default::default()
        };
        assert_eq!(get_dao_address(&receipt), Some(dao));
        assert_eq!(get_dao_address(&TransactionReceipt::default()), None);
    }
}

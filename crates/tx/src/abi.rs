// Path: crates/tx/src/abi.rs
//! Solidity bindings for the protocol contracts daokit talks to.
//!
//! Only the entry points and events used by the builders are declared. Struct
//! layouts mirror the on-chain definitions; contract-typed parameters
//! (`PluginRepo`, `IPermissionCondition`, `PermissionLib.Operation`) are
//! flattened to `address` / `uint8`, which is how they are ABI-encoded.

use alloy_sol_types::sol;

sol! {
    #![sol(all_derives)]

    /// `PluginRepo.Tag`
    struct Tag {
        uint8 release;
        uint16 build;
    }

    struct PluginSetupRef {
        Tag versionTag;
        address pluginSetupRepo;
    }

    /// `PermissionLib.MultiTargetPermission`. `where` is a Rust keyword.
    struct MultiTargetPermission {
        uint8 operation;
        address where_;
        address who;
        address condition;
        bytes32 permissionId;
    }

    struct PreparedSetupData {
        address[] helpers;
        MultiTargetPermission[] permissions;
    }

    struct SetupPayload {
        address plugin;
        address[] currentHelpers;
        bytes data;
    }

    struct PrepareInstallationParams {
        PluginSetupRef pluginSetupRef;
        bytes data;
    }

    struct ApplyInstallationParams {
        PluginSetupRef pluginSetupRef;
        address plugin;
        MultiTargetPermission[] permissions;
        bytes32 helpersHash;
    }

    struct PrepareUpdateParams {
        Tag currentVersionTag;
        PluginSetupRef newPluginSetupRef;
        SetupPayload setupPayload;
    }

    struct ApplyUpdateParams {
        address plugin;
        PluginSetupRef pluginSetupRef;
        bytes initData;
        MultiTargetPermission[] permissions;
        bytes32 helpersHash;
    }

    struct PrepareUninstallationParams {
        PluginSetupRef pluginSetupRef;
        SetupPayload setupPayload;
    }

    struct ApplyUninstallationParams {
        address plugin;
        PluginSetupRef pluginSetupRef;
        MultiTargetPermission[] permissions;
    }

    interface IPluginSetupProcessor {
        event InstallationPrepared(
            address indexed sender,
            address indexed dao,
            bytes32 preparedSetupId,
            address indexed pluginSetupRepo,
            Tag versionTag,
            bytes data,
            address plugin,
            PreparedSetupData preparedSetupData
        );

        event UpdatePrepared(
            address indexed sender,
            address indexed dao,
            bytes32 preparedSetupId,
            address indexed pluginSetupRepo,
            Tag versionTag,
            SetupPayload setupPayload,
            PreparedSetupData preparedSetupData,
            bytes initData
        );

        event UninstallationPrepared(
            address indexed sender,
            address indexed dao,
            bytes32 preparedSetupId,
            address indexed pluginSetupRepo,
            Tag versionTag,
            SetupPayload setupPayload,
            MultiTargetPermission[] permissions
        );

        function prepareInstallation(address dao, PrepareInstallationParams calldata params)
            external
            returns (address plugin, PreparedSetupData memory preparedSetupData);

        function applyInstallation(address dao, ApplyInstallationParams calldata params) external;

        function prepareUpdate(address dao, PrepareUpdateParams calldata params)
            external
            returns (bytes memory initData, PreparedSetupData memory preparedSetupData);

        function applyUpdate(address dao, ApplyUpdateParams calldata params) external;

        function prepareUninstallation(address dao, PrepareUninstallationParams calldata params)
            external
            returns (MultiTargetPermission[] memory permissions);

        function applyUninstallation(address dao, ApplyUninstallationParams calldata params) external;
    }

    /// `IDAO.Action`
    struct Action {
        address to;
        uint256 value;
        bytes data;
    }

    /// The DAO's executor and permission-manager entry points.
    interface IDAO {
        function execute(bytes32 callId, Action[] calldata actions, uint256 allowFailureMap)
            external
            returns (bytes[] memory execResults, uint256 failureMap);

        function grant(address _where, address _who, bytes32 _permissionId) external;

        function revoke(address _where, address _who, bytes32 _permissionId) external;

        function grantWithCondition(
            address _where,
            address _who,
            bytes32 _permissionId,
            address _condition
        ) external;
    }

    struct DAOSettings {
        address trustedForwarder;
        string daoURI;
        string subdomain;
        bytes metadata;
    }

    struct PluginSettings {
        PluginSetupRef pluginSetupRef;
        bytes data;
    }

    interface IDAOFactory {
        function createDao(DAOSettings calldata daoSettings, PluginSettings[] calldata pluginSettings)
            external
            returns (address createdDao);
    }

    interface IDAORegistry {
        event DAORegistered(address indexed dao, address indexed creator, string subdomain);
    }

    /// `IPlugin.TargetConfig`
    struct TargetConfig {
        address target;
        uint8 operation;
    }
}

impl From<daokit_types::VersionTag> for Tag {
    fn from(tag: daokit_types::VersionTag) -> Self {
        Self {
            release: tag.release,
            build: tag.build,
        }
    }
}

impl From<Tag> for daokit_types::VersionTag {
    fn from(tag: Tag) -> Self {
        Self::new(tag.release, tag.build)
    }
}

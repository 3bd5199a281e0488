// Path: crates/types/src/error/mod.rs
//! Core error types for daokit.

use crate::network::Network;
use crate::version::VersionTag;
use alloy_primitives::Address;
use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required setting or secret was not provided.
    #[error("{name} is not configured: {hint}")]
    Missing {
        /// Name of the missing setting (usually an environment variable).
        name: String,
        /// What the operator should do about it.
        hint: String,
    },
    /// A URL could not be parsed, even after prefixing a scheme.
    #[error("{name} is invalid: \"{value}\". Use a full URL including the protocol, e.g. https://api.example.org")]
    InvalidUrl {
        /// Name of the setting holding the URL.
        name: String,
        /// The rejected value.
        value: String,
    },
    /// One or more RPC provider keys are missing in a production-like environment.
    #[error("Missing RPC keys for providers: {providers}. Required env vars: {env_vars}")]
    MissingRpcKeys {
        /// Comma separated provider names.
        providers: String,
        /// Comma separated environment variable names.
        env_vars: String,
    },
    /// A registry document failed to parse.
    #[error("Failed to parse {what}: {reason}")]
    Parse {
        /// Which document was being parsed.
        what: &'static str,
        /// Parser error message.
        reason: String,
    },
    /// A registry document parsed but violates an invariant.
    #[error("Invalid {what}: {reason}")]
    Invalid {
        /// Which document was being validated.
        what: &'static str,
        /// The violated invariant.
        reason: String,
    },
    /// A network key is absent from the loaded registry.
    #[error("Network {0} is not present in the network registry")]
    UnknownNetwork(Network),
    /// Reading a configuration file failed.
    #[error("Failed to read {path}: {reason}")]
    Io {
        /// Path of the file.
        path: String,
        /// I/O error message.
        reason: String,
    },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::Missing { .. } => "CONFIG_MISSING",
            Self::InvalidUrl { .. } => "CONFIG_INVALID_URL",
            Self::MissingRpcKeys { .. } => "CONFIG_MISSING_RPC_KEYS",
            Self::Parse { .. } => "CONFIG_PARSE_FAILED",
            Self::Invalid { .. } => "CONFIG_INVALID",
            Self::UnknownNetwork(_) => "CONFIG_UNKNOWN_NETWORK",
            Self::Io { .. } => "CONFIG_IO",
        }
    }
}

/// Errors raised while building transactions or decoding receipts.
#[derive(Error, Debug)]
pub enum TransactionError {
    /// The network has no definition in the registry.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The plugin id is not registered.
    #[error("Plugin {0} is not registered")]
    UnknownPlugin(String),
    /// The plugin has no repository address on the given network.
    #[error("Plugin {plugin} has no repository configured on {network}")]
    RepositoryNotConfigured {
        /// Plugin id.
        plugin: String,
        /// Network key.
        network: Network,
    },
    /// A required contract address is zero on the given network.
    #[error("{contract} address not configured for network {network}")]
    AddressNotConfigured {
        /// Contract name (e.g. `daoFactory`).
        contract: &'static str,
        /// Network key.
        network: Network,
    },
    /// An operation that needs at least one setup-data entry received none.
    #[error("No {0} setup data found")]
    EmptySetupData(&'static str),
    /// Plugin list and setup-data list lengths differ in a batched update.
    #[error("Update batch has {plugins} plugins but {setup_data} setup data entries")]
    LengthMismatch {
        /// Number of plugins.
        plugins: usize,
        /// Number of setup-data entries.
        setup_data: usize,
    },
    /// The plugin has no prepare-install data builder.
    #[error("Plugin {0} does not support prepare-installation from daokit")]
    Unsupported(String),
    /// An installed plugin reported an unknown version.
    #[error("Plugin {0} has no installed version tag")]
    MissingVersion(Address),
    /// ABI decoding failed.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ErrorCode for TransactionError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.code(),
            Self::UnknownPlugin(_) => "TX_UNKNOWN_PLUGIN",
            Self::RepositoryNotConfigured { .. } => "TX_REPOSITORY_NOT_CONFIGURED",
            Self::AddressNotConfigured { .. } => "TX_ADDRESS_NOT_CONFIGURED",
            Self::EmptySetupData(_) => "TX_EMPTY_SETUP_DATA",
            Self::LengthMismatch { .. } => "TX_LENGTH_MISMATCH",
            Self::Unsupported(_) => "TX_UNSUPPORTED_PLUGIN",
            Self::MissingVersion(_) => "TX_MISSING_VERSION",
            Self::Decode(_) => "TX_DECODE_FAILED",
        }
    }
}

/// Errors raised by the chain client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never reached the node.
    #[error("Transport error: {0}")]
    Transport(String),
    /// The node answered with a non-success HTTP status.
    #[error("HTTP {status} from RPC endpoint: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },
    /// The node answered with a JSON-RPC error object (reverts land here).
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message, including the revert reason when present.
        message: String,
    },
    /// The response could not be interpreted.
    #[error("Malformed RPC response: {0}")]
    Malformed(String),
}

impl ErrorCode for ClientError {
    fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "CLIENT_TRANSPORT",
            Self::Status { .. } => "CLIENT_HTTP_STATUS",
            Self::Rpc { .. } => "CLIENT_RPC_ERROR",
            Self::Malformed(_) => "CLIENT_MALFORMED_RESPONSE",
        }
    }
}

/// Errors raised by the DAO publish flow.
#[derive(Error, Debug)]
pub enum PublishError {
    /// The DAO factory is not configured on the target network.
    #[error("DAOFactory address not configured for network {0}. Set addresses.dao_factory in the network registry.")]
    FactoryNotConfigured(Network),
    /// The plugin repository has no deployed code.
    #[error("Plugin repository {repository} has no code on {network}. Deploy it through the PluginRepoFactory and update the registry.")]
    RepositoryNotDeployed {
        /// Repository address.
        repository: Address,
        /// Network key.
        network: Network,
    },
    /// Every version-tag candidate failed simulation.
    #[error("Could not prepare the DAO creation transaction. Tried versions: {}. Errors: {}", join_tags(.candidates), .errors.join(" | "))]
    VersionResolution {
        /// Candidates in the order they were tried.
        candidates: Vec<VersionTag>,
        /// One message per failed attempt, same order.
        errors: Vec<String>,
    },
    /// The final createDao simulation reverted.
    #[error("DAO creation simulation failed: {0}")]
    Simulation(String),
    /// The candidate list was empty.
    #[error("No version candidates to try")]
    NoCandidates,
    /// Building calldata failed.
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    /// A chain lookup failed.
    #[error(transparent)]
    Client(#[from] ClientError),
}

fn join_tags(tags: &[VersionTag]) -> String {
    tags.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ErrorCode for PublishError {
    fn code(&self) -> &'static str {
        match self {
            Self::FactoryNotConfigured(_) => "PUBLISH_FACTORY_NOT_CONFIGURED",
            Self::RepositoryNotDeployed { .. } => "PUBLISH_REPOSITORY_NOT_DEPLOYED",
            Self::VersionResolution { .. } => "PUBLISH_VERSION_RESOLUTION_FAILED",
            Self::Simulation(_) => "PUBLISH_SIMULATION_FAILED",
            Self::NoCandidates => "PUBLISH_NO_CANDIDATES",
            Self::Transaction(e) => e.code(),
            Self::Client(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_resolution_lists_every_attempt() {
        let err = PublishError::VersionResolution {
            candidates: vec![
                VersionTag::new(1, 3),
                VersionTag::new(1, 2),
                VersionTag::new(1, 1),
            ],
            errors: vec!["revert a".into(), "revert b".into(), "revert c".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("1.3, 1.2, 1.1"));
        assert!(msg.contains("revert a | revert b | revert c"));
        assert_eq!(err.code(), "PUBLISH_VERSION_RESOLUTION_FAILED");
    }

    #[test]
    fn wrapped_errors_keep_inner_code() {
        let err = PublishError::from(TransactionError::EmptySetupData("installation"));
        assert_eq!(err.code(), "TX_EMPTY_SETUP_DATA");
    }
}

// Path: crates/types/src/lib.rs
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

//! # daokit Types
//!
//! The foundational crate of the workspace: network and plugin registries,
//! version tags, configuration structs and the error taxonomy. Every other
//! crate depends on it, and it depends on nothing in the workspace.
//!
//! Registries are immutable once loaded. Callers load them at start-up and
//! share them by reference (or `Arc`) with the components that need them.

/// Configuration for the gateway binary and server-side secrets.
pub mod config;
/// References to deployed DAOs and their installed plugins.
pub mod dao;
/// Error enums and the `ErrorCode` trait.
pub mod error;
/// Per-network definitions and quirks.
pub mod network;
/// Plugin identifiers and the plugin registry.
pub mod plugin;
/// Plugin setup version tags.
pub mod version;

pub use dao::{DaoPlugin, DaoRef};
pub use network::{Network, NetworkDefinition, NetworkRegistry};
pub use plugin::{PluginId, PluginInfo, PluginRegistry};
pub use version::VersionTag;

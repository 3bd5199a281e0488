// Path: crates/publish/src/lib.rs
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

//! # daokit Publish
//!
//! Builds the `DAOFactory.createDao` transaction for a new DAO. The only
//! component that composes chain calls: it checks deployed code, finds a
//! plugin version the repository actually serves by trial simulation, and
//! encodes the call only after a simulation succeeded (or, on networks that
//! declare `simulation_fallback`, after deciding to skip it).

mod flow;
mod resolve;

pub use flow::{DaoCreationTransaction, DaoPublisher, PublishDaoParams, SimulationStatus};
pub use resolve::{resolve_version, version_candidates, Resolved};

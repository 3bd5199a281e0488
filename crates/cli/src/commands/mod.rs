// Path: crates/cli/src/commands/mod.rs

pub mod dao;
pub mod plugin;
pub mod publish;
pub mod serve;

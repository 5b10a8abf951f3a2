//! CLI tool for inspecting the grid's consistent hashing.
//!
//! Provides commands for:
//! - Resolving the owner of a key
//! - Measuring how keys spread over nodes
//! - Checking that all ring variants agree
//! - Simulating a routed delivery between in-process nodes

pub mod commands;
pub mod config;

pub use commands::{Command, CommandResult};
pub use config::CliConfig;

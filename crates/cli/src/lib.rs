//! CLI tool for inspecting consistent hash rings.
//!
//! Builds a ring from command-line flags or a JSON cluster file and
//! provides commands for:
//! - Inspecting ring structure and ownership
//! - Locating keys (primary and replicas)
//! - Planning handoff and simulating node removal
//! - Resolving member addresses

pub mod commands;
pub mod config;
pub mod logging;

pub use commands::{Command, CommandResult};
pub use config::{CliConfig, ClusterFile, OutputFormat};

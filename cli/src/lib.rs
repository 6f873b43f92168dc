//! Command-line front end for the registry engine.
//!
//! Builds a registry from a TOML configuration, replays newline-delimited
//! JSON operation logs against it, and produces signed onboarding bundles
//! off-line.

pub mod config;
pub mod error;
pub mod ops;
pub mod replay;

pub use config::{Allocation, CliConfig};
pub use error::CliError;
pub use ops::{LogEntry, OpOutput, Operation, Rejection};
pub use replay::{replay, write_summary, OutputFormat};

//! Command line front end for the bounded-load proxy.
//!
//! Provides commands for:
//! - Running the proxy and its control endpoint
//! - Running an example backend host that registers itself with a proxy

pub mod commands;
pub mod config;
pub mod telemetry;

pub use commands::Command;
pub use config::{CliConfig, FileConfig};

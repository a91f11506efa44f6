//! sv-cli library
//!
//! Exports the argument parser, the HTTP client and local instance setup
//! for the `svctl` binary and for tests.

pub mod cli;
pub(crate) mod client;
pub mod commands;
pub mod init;

#[cfg(test)]
mod tests;

pub use cli::Cli;
pub use client::{CliClientResult, Client, ClientError, resolve_path};
pub use commands::Commands;
pub use init::init_instance;

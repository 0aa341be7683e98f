//! CLI module
//!
//! Command-line interface for running the converter.
//!
//! # Commands
//!
//! - `run` - Run one conversion pass
//! - `list` - Print the source keys
//! - `validate` - Check the configuration
//! - `serve` - Start HTTP server mode

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands};
pub use runner::Runner;
pub use server::{router, serve, ServerConfig};

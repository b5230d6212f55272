//! CLI module for pageforge
//!
//! Provides command-line interface for:
//! - init: Create the data directory
//! - serve: Boot the engine and serve HTTP
//! - pages: One-shot dump of the page registry

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{boot, init, pages, run, run_command, serve, Config, StorageKind};
pub use errors::{CliError, CliErrorCode, CliResult};

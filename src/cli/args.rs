//! CLI argument definitions using clap
//!
//! Commands:
//! - pageforge init --config <path>
//! - pageforge serve --config <path> [--port <port>]
//! - pageforge pages --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pageforge - runtime-declared pages with a generic CRUD API
#[derive(Parser, Debug)]
#[command(name = "pageforge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a new data directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./pageforge.json")]
        config: PathBuf,
    },

    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./pageforge.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the page registry as JSON and exit
    Pages {
        /// Path to configuration file
        #[arg(long, default_value = "./pageforge.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_with_port_override() {
        let cli = Cli::try_parse_from(["pageforge", "serve", "--port", "8080"]).unwrap();
        match cli.command {
            Command::Serve { config, port } => {
                assert_eq!(config, PathBuf::from("./pageforge.json"));
                assert_eq!(port, Some(8080));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_pages_with_config() {
        let cli = Cli::try_parse_from(["pageforge", "pages", "--config", "/etc/pf.json"]).unwrap();
        assert!(matches!(cli.command, Command::Pages { .. }));
    }
}

//! Catador CLI: drive the content-server automation flows from a terminal.
//!
//! ## Usage
//!
//! ```bash
//! catador check                          # validate config and fixtures
//! catador keys list                      # signing keys in the organization
//! catador provider add --name acme      # browser-backed provider flow
//! catador deploy --plan plans/virt.yaml  # walk the wizard and wait
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

mod error;
mod output;
mod runner;

pub use error::{CliError, CliResult};
pub use runner::run_command;

/// Command-line interface
#[derive(Debug, Parser)]
#[command(name = "catador", version, about = "Automation flows for the content-server management application")]
pub struct Cli {
    /// Suite configuration file
    #[arg(short, long, global = true, default_value = "catador.yaml")]
    pub config: PathBuf,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate the suite configuration and report fixture availability
    Check,
    /// Signing-key management through the admin tool
    Keys {
        /// Action to perform
        #[command(subcommand)]
        action: KeysAction,
    },
    /// Custom-provider flows in the web UI
    Provider {
        /// Action to perform
        #[command(subcommand)]
        action: ProviderAction,
    },
    /// Walk the deployment wizard and wait for completion
    Deploy(DeployArgs),
}

/// Signing-key actions
#[derive(Debug, Subcommand)]
pub enum KeysAction {
    /// List signing keys in the organization
    List,
    /// Search for one key by field and value
    Exists {
        /// Field to search on (e.g. name)
        field: String,
        /// Value to match
        value: String,
    },
    /// Create a key from a key file
    Create {
        /// Key name
        name: String,
        /// Path to the key file
        key_file: PathBuf,
    },
    /// Delete a key by name
    Delete {
        /// Key name
        name: String,
    },
}

/// Provider actions
#[derive(Debug, Subcommand)]
pub enum ProviderAction {
    /// Create a custom provider and verify it lists
    Add {
        /// Provider name
        #[arg(long)]
        name: String,
    },
    /// Delete a custom provider and verify it is gone
    Remove {
        /// Provider name
        #[arg(long)]
        name: String,
    },
}

/// Arguments for `catador deploy`
#[derive(Debug, Args)]
pub struct DeployArgs {
    /// Deployment plan file
    #[arg(long)]
    pub plan: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_exists() {
        let cli = Cli::try_parse_from(["catador", "keys", "exists", "name", "acme"]).unwrap();
        match cli.command {
            Commands::Keys {
                action: KeysAction::Exists { field, value },
            } => {
                assert_eq!(field, "name");
                assert_eq!(value, "acme");
            }
            other => panic!("parsed {other:?}"),
        }
    }

    #[test]
    fn parses_deploy_with_global_config() {
        let cli = Cli::try_parse_from([
            "catador",
            "deploy",
            "--plan",
            "plans/virt.yaml",
            "--config",
            "other.yaml",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("other.yaml"));
        match cli.command {
            Commands::Deploy(args) => assert_eq!(args.plan, PathBuf::from("plans/virt.yaml")),
            other => panic!("parsed {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_subcommands() {
        assert!(Cli::try_parse_from(["catador", "frobnicate"]).is_err());
    }
}

//! Core CLI definitions

use arkscan::{ItemScope, Platform};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use super::parse::{parse_item_scope, parse_known_platform, parse_server};

#[derive(Parser)]
#[command(name = "arkscan")]
#[command(about = "ARK cluster, profile and tribe viewer", long_about = None)]
pub struct Cli {
    /// Config file (defaults to <config dir>/arkscan/config.toml)
    #[arg(long, global = true, env = "ARKSCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for listing commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configure cluster and server directories
    #[command(visible_alias = "c")]
    Configure {
        /// Set the cluster upload directory
        #[arg(long)]
        cluster_dir: Option<PathBuf>,

        /// Add or replace a server save directory (NAME=PATH)
        #[arg(long, value_parser = parse_server)]
        server: Vec<(String, PathBuf)>,

        /// Remove a configured server
        #[arg(long)]
        remove_server: Vec<String>,

        /// Pin a client id to a platform (CLIENT_ID=PLATFORM)
        #[arg(long, value_parser = parse_known_platform)]
        known: Vec<(String, Platform)>,

        /// Item attribution: buffer (every character gets every item) or character
        #[arg(long, value_parser = parse_item_scope)]
        item_scope: Option<ItemScope>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },

    /// Scan the cluster directory for uploaded characters
    #[command(visible_alias = "cl")]
    Cluster {
        /// Cluster directory (uses configured default if not provided)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Parse a single cluster upload file
    #[command(visible_alias = "u")]
    Upload {
        /// Path to the upload file
        input: PathBuf,

        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List configured servers and whether their save directories exist
    Servers {
        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List player profiles on a server
    #[command(visible_alias = "p")]
    Players {
        /// Configured server name
        server: String,

        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one player's profile
    Profile {
        /// Configured server name
        server: String,

        /// Client id (the .arkprofile file stem)
        client_id: String,

        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Parse a single .arktribe file
    Tribe {
        /// Path to the tribe file
        input: PathBuf,

        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List every tribe found across configured servers
    Tribes {
        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

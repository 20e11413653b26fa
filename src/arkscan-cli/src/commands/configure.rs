//! Configuration command handlers
//!
//! Handles the `configure` subcommand for cluster and server directories.

use crate::config::Config;
use anyhow::{Context, Result};
use arkscan::{ItemScope, Platform};
use std::path::{Path, PathBuf};

/// Requested edits from the command line
#[derive(Debug, Default)]
pub struct Changes {
    pub cluster_dir: Option<PathBuf>,
    pub servers: Vec<(String, PathBuf)>,
    pub remove_servers: Vec<String>,
    pub known: Vec<(String, Platform)>,
    pub item_scope: Option<ItemScope>,
}

impl Changes {
    fn is_empty(&self) -> bool {
        self.cluster_dir.is_none()
            && self.servers.is_empty()
            && self.remove_servers.is_empty()
            && self.known.is_empty()
            && self.item_scope.is_none()
    }

    /// Apply to `config`, returning a line per change
    fn apply(self, config: &mut Config) -> Vec<String> {
        let mut log = Vec::new();

        if let Some(dir) = self.cluster_dir {
            log.push(format!("Cluster directory: {}", dir.display()));
            config.cluster_dir = Some(dir);
        }

        for name in self.remove_servers {
            match config.servers.remove(&name) {
                Some(_) => log.push(format!("Removed server: {}", name)),
                None => log.push(format!("No such server: {}", name)),
            }
        }

        for (name, path) in self.servers {
            log.push(format!("Server {}: {}", name, path.display()));
            config.servers.insert(name, path);
        }

        for (client_id, platform) in self.known {
            log.push(format!("Known platform {}: {}", client_id, platform));
            config.known_platforms.insert(client_id, platform);
        }

        if let Some(scope) = self.item_scope {
            log.push(format!("Item scope: {:?}", scope));
            config.item_scope = scope;
        }

        log
    }
}

/// Handle the configure command
pub fn handle(config_path: &Path, changes: Changes, show: bool) -> Result<()> {
    let mut config = Config::load_from(config_path)?;

    if show {
        return show_config(&config, config_path);
    }

    if changes.is_empty() {
        show_usage();
        return Ok(());
    }

    for line in changes.apply(&mut config) {
        println!("{}", line);
    }
    config.save_to(config_path)?;
    println!("Config saved to: {}", config_path.display());

    Ok(())
}

fn show_config(config: &Config, config_path: &Path) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    if contents.trim().is_empty() {
        println!("No configuration set");
    } else {
        println!("{}", contents.trim_end());
    }
    println!();
    println!("Config file: {}", config_path.display());
    Ok(())
}

fn show_usage() {
    println!("Usage: arkscan configure --cluster-dir DIR");
    println!("   or: arkscan configure --server NAME=PATH [--server NAME=PATH ...]");
    println!("   or: arkscan configure --known CLIENT_ID=PLATFORM");
    println!("   or: arkscan configure --show");
}

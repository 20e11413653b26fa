mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::*;

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "arkscan=warn",
        1 => "arkscan=info",
        _ => "arkscan=debug",
    };

    // stdout carries command output, logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };

    match cli.command {
        Commands::Configure {
            cluster_dir,
            server,
            remove_server,
            known,
            item_scope,
            show,
        } => {
            let changes = commands::configure::Changes {
                cluster_dir,
                servers: server,
                remove_servers: remove_server,
                known,
                item_scope,
            };
            commands::configure::handle(&config_path, changes, show)?;
        }

        Commands::Cluster { dir, format } => {
            let config = Config::load_from(&config_path)?;
            commands::cluster::scan(&config, dir, format)?;
        }

        Commands::Upload { input, format } => {
            let config = Config::load_from(&config_path)?;
            commands::cluster::upload(&config, &input, format)?;
        }

        Commands::Servers { format } => {
            let config = Config::load_from(&config_path)?;
            commands::server::list(&config, format)?;
        }

        Commands::Players { server, format } => {
            let config = Config::load_from(&config_path)?;
            commands::server::players(&config, &server, format)?;
        }

        Commands::Profile {
            server,
            client_id,
            format,
        } => {
            let config = Config::load_from(&config_path)?;
            commands::server::profile(&config, &server, &client_id, format)?;
        }

        Commands::Tribe { input, format } => {
            commands::tribe::show(&input, format)?;
        }

        Commands::Tribes { format } => {
            let config = Config::load_from(&config_path)?;
            commands::tribe::list(&config, format)?;
        }
    }

    Ok(())
}

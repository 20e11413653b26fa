//! Server, player list and profile command handlers

use crate::cli::OutputFormat;
use crate::config::Config;
use anyhow::{bail, Result};
use arkscan::{ProfileRecord, ServerPlayers, ServerStatus};
use std::fmt::Write as _;

use super::output::{format_size, format_time, or_na, print_json};

/// List configured servers with their directory status
pub fn list(config: &Config, format: OutputFormat) -> Result<()> {
    let status = config.servers.status();

    match format {
        OutputFormat::Json => print_json(&status),
        OutputFormat::Text => {
            print!("{}", render_servers(&status));
            Ok(())
        }
    }
}

/// List every player profile on one server
pub fn players(config: &Config, server: &str, format: OutputFormat) -> Result<()> {
    let dir = config.servers.get(server)?;
    let players = config.profile_extractor().list_players(server, dir)?;

    match format {
        OutputFormat::Json => print_json(&players),
        OutputFormat::Text => {
            print!("{}", render_players(&players));
            Ok(())
        }
    }
}

/// Show a single player profile
pub fn profile(config: &Config, server: &str, client_id: &str, format: OutputFormat) -> Result<()> {
    let dir = config.servers.get(server)?;
    let cache = config.tribe_cache();
    let record = config
        .profile_extractor()
        .extract_file(server, dir, client_id, Some(&cache));

    if let Some(error) = &record.error {
        if format == OutputFormat::Text {
            bail!("{}", error);
        }
    }

    match format {
        OutputFormat::Json => print_json(&record),
        OutputFormat::Text => {
            print!("{}", render_profile(&record));
            Ok(())
        }
    }
}

fn render_servers(status: &[ServerStatus]) -> String {
    let mut out = String::new();
    if status.is_empty() {
        let _ = writeln!(out, "No servers configured");
        let _ = writeln!(out, "Add one with: arkscan configure --server NAME=PATH");
        return out;
    }

    let width = status.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for server in status {
        let state = if server.online { "ok" } else { "missing" };
        let _ = writeln!(
            out,
            "{:width$}  {:7}  {}",
            server.name,
            state,
            server.path.display(),
            width = width
        );
    }
    out
}

fn render_players(players: &ServerPlayers) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Server: {} ({})", players.server, players.path.display());
    let _ = writeln!(out, "Players: {}", players.total_players);
    let _ = writeln!(out);

    for player in &players.players {
        let _ = writeln!(
            out,
            "{:<24} {:<14} {:<20} {:>10}  {}",
            player.player_name,
            player.platform.as_str(),
            player.client_id,
            format_size(player.file_size),
            format_time(player.last_seen.as_ref())
        );
    }
    out
}

fn render_profile(record: &ProfileRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Server:    {}", record.server);
    let _ = writeln!(out, "Client ID: {}", record.client_id);
    let _ = writeln!(out, "Player:    {}", or_na(record.player_name.as_deref()));
    let _ = writeln!(out, "Character: {}", or_na(record.character_name.as_deref()));
    let _ = writeln!(out, "Level:     {}", or_na(record.level));
    let _ = writeln!(out, "Platform:  {}", record.platform);

    if let Some(id) = record.tribe_id {
        let _ = writeln!(
            out,
            "Tribe:     {} ({})",
            or_na(record.tribe_name.as_deref()),
            id
        );
    }

    let _ = writeln!(out, "Size:      {}", format_size(record.file_size));
    let _ = writeln!(out, "Last seen: {}", format_time(record.last_seen.as_ref()));

    if !record.stats.is_empty() {
        let _ = writeln!(out, "Stat points:");
        for (slot, points) in &record.stats {
            let _ = writeln!(out, "  {:<14} {} pts", slot.name(), points);
        }
    }
    out
}

//! Cluster upload command handlers

use crate::cli::OutputFormat;
use crate::config::Config;
use anyhow::{bail, Result};
use arkscan::{CharacterRecord, ClusterScan, ClusterUpload};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use super::output::{format_size, format_time, or_na, print_json};

/// Scan the cluster directory and print every upload
pub fn scan(config: &Config, dir: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let dir = config.cluster_dir(dir)?;
    let cache = config.tribe_cache();
    let scan = config.cluster_extractor().scan_dir(&dir, Some(&cache))?;

    match format {
        OutputFormat::Json => print_json(&scan),
        OutputFormat::Text => {
            print!("{}", render_scan(&scan));
            Ok(())
        }
    }
}

/// Parse and print a single upload file
pub fn upload(config: &Config, input: &Path, format: OutputFormat) -> Result<()> {
    if !input.is_file() {
        bail!("Upload file not found: {}", input.display());
    }

    let cache = config.tribe_cache();
    let upload = config.cluster_extractor().extract_file(input, Some(&cache));

    match format {
        OutputFormat::Json => print_json(&upload),
        OutputFormat::Text => {
            print!("{}", render_upload(&upload));
            Ok(())
        }
    }
}

fn render_scan(scan: &ClusterScan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Cluster: {}", scan.folder.display());
    let _ = writeln!(out, "Scanned: {}", scan.scan_time.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(
        out,
        "Uploads: {}  Characters: {}",
        scan.files.len(),
        scan.total_characters
    );

    if scan.files.is_empty() {
        let _ = writeln!(out, "\nNo uploads found");
    }

    for upload in &scan.files {
        out.push('\n');
        out.push_str(&render_upload(upload));
    }
    out
}

fn render_upload(upload: &ClusterUpload) -> String {
    let mut out = String::new();
    let who = upload
        .player_username
        .as_deref()
        .unwrap_or(upload.client_id.as_str());
    let _ = writeln!(out, "== {} [{}] ==", who, upload.platform);
    let _ = writeln!(out, "  File:     {}", upload.filename);
    let _ = writeln!(out, "  Size:     {}", format_size(upload.file_size));
    let _ = writeln!(out, "  Uploaded: {}", format_time(upload.upload_time.as_ref()));

    if let Some(tribe) = &upload.tribe_name {
        let _ = writeln!(out, "  Tribe:    {} ({})", tribe, or_na(upload.tribe_id));
    }

    if let Some(error) = &upload.error {
        let _ = writeln!(out, "  Error:    {}", error);
        return out;
    }

    if upload.characters.is_empty() {
        let _ = writeln!(out, "  No characters");
    }
    for character in &upload.characters {
        render_character(&mut out, character);
    }
    out
}

fn render_character(out: &mut String, character: &CharacterRecord) {
    let _ = writeln!(out, "  - {} (Lvl {})", character.name, character.level);
    let _ = writeln!(
        out,
        "      Health {}  Stamina {}  Weight {}",
        or_na(character.health.as_ref()),
        or_na(character.stamina.as_ref()),
        or_na(character.weight.as_ref())
    );
    let _ = writeln!(
        out,
        "      Melee {}  Speed {}  Fortitude {}",
        or_na(character.melee.as_ref()),
        or_na(character.speed.as_ref()),
        or_na(character.fortitude.as_ref())
    );
    let _ = writeln!(
        out,
        "      Map {}  Server {}",
        or_na(character.map.as_deref()),
        or_na(character.server.as_deref())
    );
    if !character.items.is_empty() {
        let _ = writeln!(out, "      Items: {}", character.items.join(", "));
    }
}

//! Tribe command handlers

use crate::cli::OutputFormat;
use crate::config::Config;
use anyhow::Result;
use arkscan::{read_tribe_file, TribeFields, TribeMap, TribeRecord};
use std::fmt::Write as _;
use std::path::Path;

use super::output::{or_na, print_json};

/// Parse and print one `.arktribe` file
pub fn show(input: &Path, format: OutputFormat) -> Result<()> {
    let fields = read_tribe_file(input)?;

    match format {
        OutputFormat::Json => print_json(&fields),
        OutputFormat::Text => {
            print!("{}", render_fields(&fields));
            Ok(())
        }
    }
}

/// List every tribe found across the configured servers
pub fn list(config: &Config, format: OutputFormat) -> Result<()> {
    let cache = config.tribe_cache();
    let tribes = sorted(&cache.get_or_rebuild());

    match format {
        OutputFormat::Json => print_json(&tribes),
        OutputFormat::Text => {
            print!("{}", render_list(&tribes));
            Ok(())
        }
    }
}

/// Records ordered by name, then id
fn sorted(map: &TribeMap) -> Vec<TribeRecord> {
    let mut tribes: Vec<TribeRecord> = map
        .iter()
        .map(|(id, name)| TribeRecord {
            tribe_id: *id,
            tribe_name: name.clone(),
        })
        .collect();
    tribes.sort_by(|a, b| {
        a.tribe_name
            .to_lowercase()
            .cmp(&b.tribe_name.to_lowercase())
            .then(a.tribe_id.cmp(&b.tribe_id))
    });
    tribes
}

fn render_fields(fields: &TribeFields) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Tribe ID:   {}", or_na(fields.tribe_id));
    let _ = writeln!(out, "Tribe name: {}", or_na(fields.tribe_name.as_deref()));
    out
}

fn render_list(tribes: &[TribeRecord]) -> String {
    let mut out = String::new();
    if tribes.is_empty() {
        let _ = writeln!(out, "No tribes found");
        return out;
    }
    for tribe in tribes {
        let _ = writeln!(out, "{:>12}  {}", tribe.tribe_id, tribe.tribe_name);
    }
    let _ = writeln!(out, "\n{} tribes", tribes.len());
    out
}

//! Shared output helpers

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;

/// Pretty JSON to stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// `1.5 MB` above a mebibyte, `12.0 KB` below
pub fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let bytes = bytes as f64;
    if bytes > KIB * KIB {
        format!("{:.1} MB", bytes / KIB / KIB)
    } else {
        format!("{:.1} KB", bytes / KIB)
    }
}

pub fn format_time(time: Option<&DateTime<Local>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Display an optional value, `N/A` when absent
pub fn or_na<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

//! Value parsers for CLI arguments

use arkscan::{ItemScope, Platform};
use std::path::PathBuf;

fn split_pair(s: &str) -> Result<(&str, &str), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return Err(format!("expected KEY=VALUE, got '{}'", s));
    }
    Ok((key, value))
}

/// `NAME=PATH`
pub fn parse_server(s: &str) -> Result<(String, PathBuf), String> {
    let (name, path) = split_pair(s)?;
    Ok((name.to_string(), PathBuf::from(path)))
}

/// `CLIENT_ID=PLATFORM`
pub fn parse_known_platform(s: &str) -> Result<(String, Platform), String> {
    let (client_id, platform) = split_pair(s)?;
    let platform = platform.parse::<Platform>().map_err(|e| e.to_string())?;
    Ok((client_id.to_string(), platform))
}

pub fn parse_item_scope(s: &str) -> Result<ItemScope, String> {
    match s.to_ascii_lowercase().as_str() {
        "buffer" | "file" => Ok(ItemScope::Buffer),
        "character" | "char" => Ok(ItemScope::Character),
        _ => Err(format!("expected 'buffer' or 'character', got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server() {
        let (name, path) = parse_server("TheIsland=C:/ASA Servers/TheIsland_WP").unwrap();
        assert_eq!(name, "TheIsland");
        assert_eq!(path, PathBuf::from("C:/ASA Servers/TheIsland_WP"));
        assert!(parse_server("TheIsland").is_err());
        assert!(parse_server("=path").is_err());
    }

    #[test]
    fn test_parse_known_platform() {
        let (id, platform) = parse_known_platform("0002e300=PC (Steam)").unwrap();
        assert_eq!(id, "0002e300");
        assert_eq!(platform, Platform::PcSteam);
        assert!(parse_known_platform("0002e300=Dreamcast").is_err());
    }

    #[test]
    fn test_parse_item_scope() {
        assert_eq!(parse_item_scope("Character").unwrap(), ItemScope::Character);
        assert_eq!(parse_item_scope("buffer").unwrap(), ItemScope::Buffer);
        assert!(parse_item_scope("nearest").is_err());
    }
}

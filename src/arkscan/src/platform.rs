//! Platform classification
//!
//! Cluster uploads are written by the client and occasionally carry explicit
//! platform strings; failing that, the cross-play bridge markers give away a
//! console client. Server-side profiles never carry bridge markers (the
//! server sees every client through the same bridge), so they fall back to
//! Steam IDs, an allow-list, and the player's display name.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use serde::{Deserialize, Serialize};

use crate::scanner::contains;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "PS5")]
    Ps5,
    /// Weak signal from the display name only.
    #[serde(rename = "PS5 (likely)")]
    Ps5Likely,
    #[serde(rename = "Xbox")]
    Xbox,
    #[serde(rename = "PC (Epic)")]
    PcEpic,
    #[serde(rename = "PC (Steam)")]
    PcSteam,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::Ps5,
        Platform::Ps5Likely,
        Platform::Xbox,
        Platform::PcEpic,
        Platform::PcSteam,
        Platform::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ps5 => "PS5",
            Platform::Ps5Likely => "PS5 (likely)",
            Platform::Xbox => "Xbox",
            Platform::PcEpic => "PC (Epic)",
            Platform::PcSteam => "PC (Steam)",
            Platform::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPlatformName(pub String);

impl fmt::Display for UnknownPlatformName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown platform '{}' (expected one of: PS5, Xbox, PC (Epic), PC (Steam), Unknown)",
            self.0
        )
    }
}

impl std::error::Error for UnknownPlatformName {}

impl FromStr for Platform {
    type Err = UnknownPlatformName;

    /// Accepts display strings plus a few short forms (`ps5`, `steam`, `epic`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(p) = Platform::ALL.iter().find(|p| p.as_str().eq_ignore_ascii_case(s)) {
            return Ok(*p);
        }
        match s.to_ascii_lowercase().as_str() {
            "ps5" | "psn" | "playstation" => Ok(Platform::Ps5),
            "xbox" | "xbl" => Ok(Platform::Xbox),
            "epic" | "pc-epic" => Ok(Platform::PcEpic),
            "steam" | "pc" | "pc-steam" => Ok(Platform::PcSteam),
            _ => Err(UnknownPlatformName(s.to_string())),
        }
    }
}

/// Client id to platform, for players whose profiles carry no usable signal.
pub type KnownPlatforms = HashMap<String, Platform>;

/// Classify a client-written cluster upload.
pub fn detect_upload(data: &[u8]) -> Platform {
    if contains(data, b"PSN") || contains(data, b"PlayStation") || contains(data, b"PS5") {
        return Platform::Ps5;
    }
    if contains(data, b"Xbox") || contains(data, b"XBL") || contains(data, b"XboxLive") {
        return Platform::Xbox;
    }
    if contains(data, b"EpicGames") || contains(data, b"Epic Games") {
        return Platform::PcEpic;
    }

    // Console clients reach the server through the cross-play bridge. Once
    // explicit markers are gone PS5 and Xbox look identical; PS5 is assumed.
    if has_bridge_markers(data) {
        return Platform::Ps5;
    }

    if contains(data, b"SteamUserItemID") || contains(data, b"BlueprintGeneratedClass") {
        return Platform::PcSteam;
    }

    Platform::Unknown
}

fn has_bridge_markers(data: &[u8]) -> bool {
    contains(data, b"RedpointEOS") && contains(data, b"UniqueNetIdRepl")
}

static STEAM64: Lazy<Regex> = Lazy::new(|| Regex::new(r"7656[0-9]{13}").unwrap());

/// Classify a server-side player profile.
pub fn detect_profile(
    client_id: &str,
    data: &[u8],
    player_name: Option<&str>,
    known: &KnownPlatforms,
) -> Platform {
    if contains(data, b"PSN") || contains(data, b"PlayStation") {
        return Platform::Ps5;
    }
    if contains(data, b"Xbox") || contains(data, b"XBL") {
        return Platform::Xbox;
    }

    if STEAM64.is_match(data) {
        return Platform::PcSteam;
    }

    if let Some(platform) = known.get(client_id) {
        return *platform;
    }

    player_name
        .map(platform_from_name)
        .unwrap_or(Platform::Unknown)
}

/// Lexical hints in a display name. Lowest confidence of all signals.
pub fn platform_from_name(name: &str) -> Platform {
    let lower = name.to_lowercase();
    let has_any = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if has_any(&["_ps", "ps5", "psn", "_playstation"]) {
        return Platform::Ps5;
    }
    if has_any(&["_xbox", "xbx", "_xb"]) {
        return Platform::Xbox;
    }
    if has_any(&["_pc", "_steam", "pc_", "steam_"]) {
        return Platform::PcSteam;
    }

    // PSN names often end in a run of digits; so do plenty of PC names.
    let trailing_digits = name.bytes().rev().take_while(u8::is_ascii_digit).count();
    if trailing_digits >= 3 {
        return Platform::Ps5Likely;
    }

    Platform::Unknown
}

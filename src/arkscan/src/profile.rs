//! Player profiles (`.arkprofile`)
//!
//! Profiles are written by the server, one per player per map. They carry
//! the player's account name, the character name, the extra character level
//! and the level-up points spent per stat.
//!
//! # Stat point layout
//!
//! Each `CharacterStatusComponent_NumberOfLevelUpPointsApplied` entry is a
//! `ByteProperty`. After the type terminator:
//!
//! ```text
//! +0  u32  padding
//! +4  u32  size (always 1)
//! +8  u8   discriminator
//!   0: +9 value, slot 0 (health) implied
//!   1: +9 slot index, +10..+13 padding, +13 value
//! ```
//!
//! The discriminator meaning comes from a handful of sample files. Anything
//! else is logged and skipped rather than guessed at.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::TribeLookup;
use crate::error::{Error, Result};
use crate::files::{
    file_name, file_size, list_files, modified, read_prefix, DEFAULT_MAX_FILE_BYTES,
};
use crate::platform::{detect_profile, KnownPlatforms, Platform};
use crate::scanner::PropertyTag;
use crate::tribe::{extract_tribe_id, MAX_NAME_LEN, STR_LEN_OFFSET};

pub const EXTENSION: &str = "arkprofile";

/// Bytes read per profile when only listing players.
pub const SUMMARY_READ_LIMIT: u64 = 50_000;

const PLAYER_NAME: PropertyTag = PropertyTag::new("PlayerName", "Str");
const CHARACTER_NAME: PropertyTag = PropertyTag::new("PlayerCharacterName", "Str");
const EXTRA_LEVEL: PropertyTag =
    PropertyTag::new("CharacterStatusComponent_ExtraCharacterLevel", "UInt16").with_filler(10);
const STAT_POINTS: PropertyTag =
    PropertyTag::new("CharacterStatusComponent_NumberOfLevelUpPointsApplied", "Byte")
        .with_filler(37);

const LEVEL_OFFSET: usize = 9;
const STAT_FLAG_OFFSET: usize = 8;
const STAT_DIRECT_VALUE: usize = 9;
const STAT_INDEX_OFFSET: usize = 9;
const STAT_INDEXED_VALUE: usize = 13;

/// The twelve character stats, in save-file slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatSlot {
    Health,
    Stamina,
    Torpidity,
    Oxygen,
    Food,
    Water,
    Temperature,
    Weight,
    Melee,
    Speed,
    Fortitude,
    Crafting,
}

impl StatSlot {
    pub const ALL: [StatSlot; 12] = [
        StatSlot::Health,
        StatSlot::Stamina,
        StatSlot::Torpidity,
        StatSlot::Oxygen,
        StatSlot::Food,
        StatSlot::Water,
        StatSlot::Temperature,
        StatSlot::Weight,
        StatSlot::Melee,
        StatSlot::Speed,
        StatSlot::Fortitude,
        StatSlot::Crafting,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            StatSlot::Health => "health",
            StatSlot::Stamina => "stamina",
            StatSlot::Torpidity => "torpidity",
            StatSlot::Oxygen => "oxygen",
            StatSlot::Food => "food",
            StatSlot::Water => "water",
            StatSlot::Temperature => "temperature",
            StatSlot::Weight => "weight",
            StatSlot::Melee => "melee",
            StatSlot::Speed => "speed",
            StatSlot::Fortitude => "fortitude",
            StatSlot::Crafting => "crafting",
        }
    }
}

impl fmt::Display for StatSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type StatPoints = BTreeMap<StatSlot, u8>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileRecord {
    pub server: String,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    pub stats: StatPoints,
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tribe_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tribe_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Local>>,
    pub file_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProfileRecord {
    fn empty(server: &str, client_id: &str) -> Self {
        Self {
            server: server.to_string(),
            client_id: client_id.to_string(),
            player_name: None,
            character_name: None,
            level: None,
            stats: StatPoints::new(),
            platform: Platform::Unknown,
            tribe_id: None,
            tribe_name: None,
            last_seen: None,
            file_size: 0,
            error: None,
        }
    }

    /// Stand-in for a profile that could not be read.
    pub fn failed(server: &str, client_id: &str, error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::empty(server, client_id)
        }
    }
}

/// One row of a server's player list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub client_id: String,
    pub player_name: String,
    pub platform: Platform,
    pub file_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Local>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerPlayers {
    pub server: String,
    pub path: PathBuf,
    pub players: Vec<PlayerSummary>,
    pub total_players: usize,
}

pub fn extract_player_name(data: &[u8]) -> Option<String> {
    PLAYER_NAME.find_map(data, |m| m.string_at(data, STR_LEN_OFFSET, MAX_NAME_LEN))
}

pub fn extract_character_name(data: &[u8]) -> Option<String> {
    CHARACTER_NAME.find_map(data, |m| m.string_at(data, STR_LEN_OFFSET, MAX_NAME_LEN))
}

pub fn extract_level(data: &[u8]) -> Option<u8> {
    EXTRA_LEVEL.find_map(data, |m| m.u8_at(data, LEVEL_OFFSET))
}

/// Level-up points per stat. Later entries for the same slot win.
pub fn extract_stat_points(data: &[u8]) -> StatPoints {
    let mut stats = StatPoints::new();

    for m in STAT_POINTS.find_iter(data) {
        let Some(flag) = m.u8_at(data, STAT_FLAG_OFFSET) else {
            continue;
        };

        let entry = match flag {
            0 => m.u8_at(data, STAT_DIRECT_VALUE).map(|value| (0, value)),
            1 => m
                .u8_at(data, STAT_INDEX_OFFSET)
                .zip(m.u8_at(data, STAT_INDEXED_VALUE)),
            other => {
                warn!(
                    offset = m.offset,
                    flag = other,
                    "Unexpected stat point layout, skipping entry"
                );
                continue;
            }
        };

        let Some((index, value)) = entry else {
            continue;
        };
        match StatSlot::from_index(index) {
            Some(slot) => {
                stats.insert(slot, value);
            }
            None => debug!(offset = m.offset, index, "Stat slot out of range"),
        }
    }

    stats
}

#[derive(Debug, Clone)]
pub struct ProfileExtractor {
    pub known: KnownPlatforms,
    pub max_file_bytes: u64,
}

impl Default for ProfileExtractor {
    fn default() -> Self {
        Self::new(KnownPlatforms::new())
    }
}

impl ProfileExtractor {
    pub fn new(known: KnownPlatforms) -> Self {
        Self {
            known,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }

    pub fn with_max_file_bytes(mut self, limit: u64) -> Self {
        self.max_file_bytes = limit;
        self
    }

    /// Everything a profile buffer yields. `file_size` and `last_seen` are
    /// left for the caller.
    pub fn extract_bytes(
        &self,
        server: &str,
        client_id: &str,
        data: &[u8],
        tribes: Option<&dyn TribeLookup>,
    ) -> ProfileRecord {
        let mut record = ProfileRecord::empty(server, client_id);
        record.player_name = extract_player_name(data);
        record.character_name = extract_character_name(data);
        record.level = extract_level(data);
        record.stats = extract_stat_points(data);
        record.platform = detect_profile(
            client_id,
            data,
            record.player_name.as_deref(),
            &self.known,
        );
        record.tribe_id = extract_tribe_id(data).filter(|id| *id != 0);
        record.tribe_name = record
            .tribe_id
            .zip(tribes)
            .and_then(|(id, tribes)| tribes.tribe_name(id));
        record.file_size = data.len() as u64;
        record
    }

    /// Read `<dir>/<client_id>.arkprofile`. Never fails; problems are
    /// reported in the record's `error`.
    pub fn extract_file(
        &self,
        server: &str,
        dir: &Path,
        client_id: &str,
        tribes: Option<&dyn TribeLookup>,
    ) -> ProfileRecord {
        let path = profile_path(dir, client_id);
        if !path.is_file() {
            return ProfileRecord::failed(server, client_id, Error::NotFound(path));
        }

        let data = match read_prefix(&path, self.max_file_bytes) {
            Ok(data) => data,
            Err(e) => {
                warn!("{}", e);
                return ProfileRecord::failed(server, client_id, e);
            }
        };

        let mut record = self.extract_bytes(server, client_id, &data, tribes);
        record.last_seen = modified(&path);
        if let Some(size) = file_size(&path) {
            record.file_size = size;
        }
        record
    }

    /// Every player profile on one server, newest first.
    pub fn list_players(&self, server: &str, dir: &Path) -> Result<ServerPlayers> {
        let mut players: Vec<PlayerSummary> = list_files(dir, Some(EXTENSION))?
            .iter()
            .filter_map(|path| self.summarize(path))
            .collect();

        players.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));

        Ok(ServerPlayers {
            server: server.to_string(),
            path: dir.to_path_buf(),
            total_players: players.len(),
            players,
        })
    }

    fn summarize(&self, path: &Path) -> Option<PlayerSummary> {
        let name = file_name(path);
        let client_id = name
            .strip_suffix(&format!(".{}", EXTENSION))
            .unwrap_or(&name)
            .to_string();

        let data = match read_prefix(path, SUMMARY_READ_LIMIT) {
            Ok(data) => data,
            Err(e) => {
                warn!("Skipping profile: {}", e);
                return None;
            }
        };

        let player_name = extract_player_name(&data);
        let platform = detect_profile(&client_id, &data, player_name.as_deref(), &self.known);

        Some(PlayerSummary {
            client_id,
            player_name: player_name.unwrap_or_else(|| "Unknown".to_string()),
            platform,
            file_size: file_size(path).unwrap_or(data.len() as u64),
            last_seen: modified(path),
        })
    }
}

/// `<dir>/<client_id>.arkprofile`.
pub fn profile_path(dir: &Path, client_id: &str) -> PathBuf {
    dir.join(format!("{}.{}", client_id, EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TribeMap;
    use crate::scanner::fixtures::{int_payload, noise, str_payload, tag};

    fn direct_stat(value: u8) -> Vec<u8> {
        let mut payload = vec![0u8; 8];
        payload.extend_from_slice(&[0, value, 0, 0, 0, 0]);
        tag(
            "CharacterStatusComponent_NumberOfLevelUpPointsApplied",
            &[0; 4],
            "Byte",
            &payload,
        )
    }

    fn indexed_stat(index: u8, value: u8) -> Vec<u8> {
        let mut payload = vec![0u8; 8];
        payload.extend_from_slice(&[1, index, 0, 0, 0, value]);
        tag(
            "CharacterStatusComponent_NumberOfLevelUpPointsApplied",
            &[0; 4],
            "Byte",
            &payload,
        )
    }

    fn level(value: u8) -> Vec<u8> {
        let mut payload = vec![0u8; 9];
        payload.extend_from_slice(&[value, 0]);
        tag(
            "CharacterStatusComponent_ExtraCharacterLevel",
            &[0; 8],
            "UInt16",
            &payload,
        )
    }

    fn profile() -> Vec<u8> {
        let mut data = noise(32, 1);
        data.extend(tag("PlayerName", &[0; 4], "Str", &str_payload("Survivor529")));
        data.extend(tag(
            "PlayerCharacterName",
            &[0; 4],
            "Str",
            &str_payload("Helena"),
        ));
        data.extend(level(87));
        data.extend(direct_stat(30));
        data.extend(indexed_stat(1, 12));
        data.extend(indexed_stat(7, 25));
        data.extend(indexed_stat(8, 40));
        data.extend(tag("TribeID", &[0; 4], "Int", &int_payload(424242)));
        data.extend(noise(32, 2));
        data
    }

    #[test]
    fn test_extract_bytes() {
        let mut tribes = TribeMap::new();
        tribes.insert(424242, "Island Nomads".to_string());

        let record = ProfileExtractor::default().extract_bytes(
            "TheIsland",
            "0002e3000f8443b6",
            &profile(),
            Some(&tribes),
        );

        assert_eq!(record.player_name.as_deref(), Some("Survivor529"));
        assert_eq!(record.character_name.as_deref(), Some("Helena"));
        assert_eq!(record.level, Some(87));
        assert_eq!(record.stats.get(&StatSlot::Health), Some(&30));
        assert_eq!(record.stats.get(&StatSlot::Stamina), Some(&12));
        assert_eq!(record.stats.get(&StatSlot::Weight), Some(&25));
        assert_eq!(record.stats.get(&StatSlot::Melee), Some(&40));
        assert_eq!(record.stats.len(), 4);
        assert_eq!(record.platform, Platform::Ps5Likely);
        assert_eq!(record.tribe_id, Some(424242));
        assert_eq!(record.tribe_name.as_deref(), Some("Island Nomads"));
        assert_eq!(record.error, None);
    }

    #[test]
    fn test_player_name_not_confused_with_character_name() {
        let data = tag(
            "PlayerCharacterName",
            &[0; 4],
            "Str",
            &str_payload("Helena"),
        );
        assert_eq!(extract_player_name(&data), None);
        assert_eq!(extract_character_name(&data).as_deref(), Some("Helena"));
    }

    #[test]
    fn test_unexpected_stat_flag_is_skipped() {
        let mut payload = vec![0u8; 8];
        payload.extend_from_slice(&[2, 3, 0, 0, 0, 9]);
        let mut data = tag(
            "CharacterStatusComponent_NumberOfLevelUpPointsApplied",
            &[0; 4],
            "Byte",
            &payload,
        );
        data.extend(indexed_stat(12, 5));
        data.extend(indexed_stat(11, 5));

        let stats = extract_stat_points(&data);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats.get(&StatSlot::Crafting), Some(&5));
    }

    #[test]
    fn test_truncated_stat_entry_is_skipped() {
        let mut data = indexed_stat(3, 5);
        data.truncate(data.len() - 1);
        assert!(extract_stat_points(&data).is_empty());
    }

    #[test]
    fn test_stat_slot_serializes_lowercase() {
        let mut stats = StatPoints::new();
        stats.insert(StatSlot::Fortitude, 3);
        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(json, r#"{"fortitude":3}"#);
    }

    #[test]
    fn test_extract_file_and_missing_profile() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(profile_path(temp_dir.path(), "abc"), profile()).unwrap();

        let extractor = ProfileExtractor::default();
        let record = extractor.extract_file("TheIsland", temp_dir.path(), "abc", None);
        assert_eq!(record.character_name.as_deref(), Some("Helena"));
        assert_eq!(record.tribe_name, None);
        assert!(record.last_seen.is_some());
        assert_eq!(record.file_size, profile().len() as u64);

        let missing = extractor.extract_file("TheIsland", temp_dir.path(), "nobody", None);
        assert_eq!(missing.platform, Platform::Unknown);
        assert!(missing.error.unwrap().contains("nobody.arkprofile"));
    }

    #[test]
    fn test_file_size_is_size_on_disk() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(profile_path(temp_dir.path(), "abc"), profile()).unwrap();

        let record = ProfileExtractor::default()
            .with_max_file_bytes(16)
            .extract_file("TheIsland", temp_dir.path(), "abc", None);
        assert!(record.error.is_none());
        assert_eq!(record.file_size, profile().len() as u64);
    }

    #[test]
    fn test_list_players() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(profile_path(temp_dir.path(), "abc"), profile()).unwrap();
        std::fs::write(profile_path(temp_dir.path(), "def"), noise(64, 9)).unwrap();
        std::fs::write(temp_dir.path().join("1.arktribe"), b"x").unwrap();

        let mut known = KnownPlatforms::new();
        known.insert("def".to_string(), Platform::Xbox);
        let listing = ProfileExtractor::new(known)
            .list_players("TheIsland", temp_dir.path())
            .unwrap();

        assert_eq!(listing.total_players, 2);
        let abc = listing.players.iter().find(|p| p.client_id == "abc").unwrap();
        assert_eq!(abc.player_name, "Survivor529");
        assert_eq!(abc.platform, Platform::Ps5Likely);
        let def = listing.players.iter().find(|p| p.client_id == "def").unwrap();
        assert_eq!(def.player_name, "Unknown");
        assert_eq!(def.platform, Platform::Xbox);
    }

    #[test]
    fn test_list_players_missing_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = ProfileExtractor::default().list_players("Gone", &temp_dir.path().join("x"));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}

//! Character records from cluster uploads
//!
//! Every uploaded character leaves a display string `<Name> - Lvl <N>` in the
//! buffer. Those strings anchor the per-character search: stats are read from
//! the block that follows the anchor, cut off at the next character's anchor,
//! and map/server names are resolved through [`AnchorWindow`].

use std::fmt;

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::items::{extract_items, extract_items_in};
use crate::scanner::lossy;
use crate::window::{group1, AnchorWindow};

/// Stats are expected within this many bytes after the anchor.
pub const DEFAULT_STATS_SPAN: usize = 20_000;

/// Accepted display-name length, after trimming.
pub const NAME_LEN: std::ops::RangeInclusive<usize> = 2..=50;

static ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)([A-Za-z0-9_\- ]{1,64}) - Lvl ([0-9]+)").unwrap());

static HEALTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)Health: ([0-9.]{1,32}) / ([0-9.]{1,32})").unwrap());
static STAMINA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)Stamina: ([0-9.]{1,32}) / ([0-9.]{1,32})").unwrap());
static WEIGHT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)Weight: ([0-9.]{1,32}) / ([0-9.]{1,32})").unwrap());
static MELEE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)Melee Damage: ([0-9.]{1,32})").unwrap());
static SPEED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)Movement Speed: ([0-9.]{1,32})").unwrap());
static FORTITUDE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)Fortitude: ([0-9.]{1,32})").unwrap());

static MAP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s-u)UploadingServerMapName\x00.{0,200}?StrProperty\x00.{0,200}?([A-Za-z0-9_\-]{1,128})\x00",
    )
    .unwrap()
});
static SERVER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s-u)UploadingServerName\x00.{0,200}?StrProperty\x00.{0,200}?([A-Za-z0-9_\-]{1,128})\x00",
    )
    .unwrap()
});

/// A `current/max` pair such as health.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Meter {
    pub current: f64,
    pub maximum: f64,
}

impl fmt::Display for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}/{:.0}", self.current, self.maximum)
    }
}

/// A plain value, shown rounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading(pub f64);

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}", self.0)
    }
}

/// A percentage stat such as melee damage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Percent(pub f64);

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}%", self.0)
    }
}

macro_rules! serialize_as_display {
    ($($ty:ty),*) => {$(
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }
    )*};
}

serialize_as_display!(Meter, Reading, Percent);

/// How inventory is attributed to the characters of one upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemScope {
    /// Every character gets every item in the buffer.
    #[default]
    Buffer,
    /// Each character gets the items between its anchor and the next one.
    Character,
}

/// `<Name> - Lvl <N>` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub name: String,
    pub level: u32,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterRecord {
    pub name: String,
    pub level: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<Meter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stamina: Option<Meter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<Reading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub melee: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fortitude: Option<Reading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    pub items: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tribe_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tribe_name: Option<String>,
}

impl CharacterRecord {
    fn new(anchor: &Anchor) -> Self {
        Self {
            name: anchor.name.clone(),
            level: anchor.level,
            health: None,
            stamina: None,
            weight: None,
            melee: None,
            speed: None,
            fortitude: None,
            map: None,
            server: None,
            items: Vec::new(),
            tribe_id: None,
            tribe_name: None,
        }
    }
}

/// Every character anchor in `data`, in buffer order.
pub fn find_anchors(data: &[u8]) -> Vec<Anchor> {
    ANCHOR
        .captures_iter(data)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = lossy(caps.get(1)?.as_bytes()).trim().to_string();
            if !NAME_LEN.contains(&name.len()) {
                debug!(offset = whole.start(), len = name.len(), "Anchor name out of range");
                return None;
            }
            let level = std::str::from_utf8(caps.get(2)?.as_bytes())
                .ok()?
                .parse()
                .ok()?;
            Some(Anchor {
                name,
                level,
                offset: whole.start(),
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct CharacterExtractor {
    pub window: AnchorWindow,
    pub stats_span: usize,
    pub item_scope: ItemScope,
}

impl Default for CharacterExtractor {
    fn default() -> Self {
        Self {
            window: AnchorWindow::default(),
            stats_span: DEFAULT_STATS_SPAN,
            item_scope: ItemScope::default(),
        }
    }
}

impl CharacterExtractor {
    pub fn with_item_scope(mut self, scope: ItemScope) -> Self {
        self.item_scope = scope;
        self
    }

    /// One record per anchor. Single pass, never fails; damaged input only
    /// leaves fields unset.
    pub fn extract(&self, data: &[u8]) -> Vec<CharacterRecord> {
        let anchors = find_anchors(data);

        let shared_items = match self.item_scope {
            ItemScope::Buffer if !anchors.is_empty() => extract_items(data),
            _ => Vec::new(),
        };

        anchors
            .iter()
            .enumerate()
            .map(|(i, anchor)| {
                let next = anchors.get(i + 1).map_or(data.len(), |a| a.offset);
                let mut record = self.extract_one(data, anchor, next);

                record.items = match self.item_scope {
                    ItemScope::Buffer => shared_items.clone(),
                    ItemScope::Character => {
                        let start = if i == 0 { 0 } else { anchor.offset };
                        extract_items_in(data, start..next)
                    }
                };
                record
            })
            .collect()
    }

    fn extract_one(&self, data: &[u8], anchor: &Anchor, next: usize) -> CharacterRecord {
        let end = data
            .len()
            .min(anchor.offset.saturating_add(self.stats_span))
            .min(next);
        let region = data.get(anchor.offset..end).unwrap_or_default();

        let mut record = CharacterRecord::new(anchor);
        record.health = meter(&HEALTH, region);
        record.stamina = meter(&STAMINA, region);
        record.weight = meter(&WEIGHT, region).map(|m| Reading(m.current));
        record.melee = number(&MELEE, region).map(Percent);
        record.speed = number(&SPEED, region).map(Percent);
        record.fortitude = number(&FORTITUDE, region).map(Reading);

        record.map = self
            .resolve(&MAP, data, region, anchor, next)
            .map(|raw| strip_map_suffix(&lossy(raw)).to_string());
        record.server = self
            .resolve(&SERVER, data, region, anchor, next)
            .map(lossy);

        debug!(
            name = %record.name,
            level = record.level,
            offset = anchor.offset,
            map = ?record.map,
            server = ?record.server,
            "Extracted character"
        );
        record
    }

    /// Local stats block first, then the three-tier window search.
    fn resolve<'h>(
        &self,
        pattern: &Regex,
        data: &'h [u8],
        region: &'h [u8],
        anchor: &Anchor,
        next: usize,
    ) -> Option<&'h [u8]> {
        if let Some(raw) = group1(pattern, region) {
            return Some(raw);
        }
        let resolved = self.window.nearest_match(pattern, data, anchor.offset, next)?;
        debug!(name = %anchor.name, tier = ?resolved.tier, "Resolved outside stats block");
        Some(resolved.value)
    }
}

fn parse_f64(raw: &[u8]) -> Option<f64> {
    std::str::from_utf8(raw).ok()?.parse().ok()
}

fn meter(pattern: &Regex, region: &[u8]) -> Option<Meter> {
    let caps = pattern.captures(region)?;
    Some(Meter {
        current: parse_f64(caps.get(1)?.as_bytes())?,
        maximum: parse_f64(caps.get(2)?.as_bytes())?,
    })
}

fn number(pattern: &Regex, region: &[u8]) -> Option<f64> {
    parse_f64(group1(pattern, region)?)
}

/// Drop world-partition suffixes: `TheIsland_WP` -> `TheIsland`.
pub fn strip_map_suffix(map: &str) -> &str {
    let map = map.strip_suffix("_WP").unwrap_or(map);
    map.strip_suffix("_P").unwrap_or(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(data: &mut [u8], at: usize, text: &[u8]) {
        data[at..at + text.len()].copy_from_slice(text);
    }

    fn str_field(name: &str, value: &str) -> Vec<u8> {
        let mut out = format!("{}\x00\x00\x00\x00\x00StrProperty\x00", name).into_bytes();
        out.extend_from_slice(&[0u8; 9]);
        out.extend_from_slice(&(value.len() as u32 + 1).to_le_bytes());
        out.extend_from_slice(value.as_bytes());
        out.push(0);
        out
    }

    /// Alice at 100 and Bob at 3000, each followed by their own health.
    fn two_characters() -> Vec<u8> {
        let mut data = vec![0u8; 6000];
        put(&mut data, 100, b"Alice - Lvl 10\x00");
        put(&mut data, 200, b"Health: 100.0 / 100.0\x00");
        put(&mut data, 3000, b"Bob - Lvl 20\x00");
        put(&mut data, 3100, b"Health: 100.0 / 100.0\x00");
        data
    }

    #[test]
    fn test_two_characters_end_to_end() {
        let records = CharacterExtractor::default().extract(&two_characters());
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].name, "Alice");
        assert_eq!(records[0].level, 10);
        assert_eq!(records[0].health.unwrap().to_string(), "100/100");
        assert_eq!(records[1].name, "Bob");
        assert_eq!(records[1].level, 20);
        assert_eq!(records[1].health.unwrap().to_string(), "100/100");
    }

    #[test]
    fn test_stats_clamped_by_next_anchor() {
        // Only Bob has stats; Alice's naive 20000-byte span covers them.
        let mut data = vec![0u8; 6000];
        put(&mut data, 100, b"Alice - Lvl 10\x00");
        put(&mut data, 3000, b"Bob - Lvl 20\x00");
        put(&mut data, 3100, b"Health: 250.0 / 300.0\x00Melee Damage: 140.4\x00");

        let records = CharacterExtractor::default().extract(&data);
        assert_eq!(records[0].health, None);
        assert_eq!(records[0].melee, None);
        assert_eq!(records[1].health.unwrap().to_string(), "250/300");
        assert_eq!(records[1].melee.unwrap().to_string(), "140%");
    }

    #[test]
    fn test_all_stats() {
        let mut data = vec![0u8; 1000];
        put(&mut data, 0, b"Rex Rider - Lvl 105\x00");
        put(
            &mut data,
            50,
            b"Health: 1200.4 / 1500.0\x00Stamina: 80.0 / 420.0\x00Weight: 310.2 / 600.0\x00\
              Melee Damage: 255.0\x00Movement Speed: 130.0\x00Fortitude: 25.0\x00",
        );

        let record = &CharacterExtractor::default().extract(&data)[0];
        assert_eq!(record.name, "Rex Rider");
        assert_eq!(record.level, 105);
        assert_eq!(record.health.unwrap().to_string(), "1200/1500");
        assert_eq!(record.stamina.unwrap().to_string(), "80/420");
        assert_eq!(record.weight.unwrap().to_string(), "310");
        assert_eq!(record.melee.unwrap().to_string(), "255%");
        assert_eq!(record.speed.unwrap().to_string(), "130%");
        assert_eq!(record.fortitude.unwrap().to_string(), "25");
    }

    #[test]
    fn test_malformed_stat_is_omitted() {
        let mut data = vec![0u8; 200];
        put(&mut data, 0, b"Dodo - Lvl 1\x00Health: 1.2.3 / 9\x00Fortitude: .\x00");

        let record = &CharacterExtractor::default().extract(&data)[0];
        assert_eq!(record.health, None);
        assert_eq!(record.fortitude, None);
    }

    #[test]
    fn test_anchor_name_length_bounds() {
        let mut data = vec![0u8; 400];
        put(&mut data, 0, b"A - Lvl 5\x00");
        let long = format!("{} - Lvl 5\x00", "N".repeat(51));
        put(&mut data, 20, long.as_bytes());
        put(&mut data, 200, b"Ok - Lvl 7\x00");

        let anchors = find_anchors(&data);
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].name, "Ok");
        assert_eq!(anchors[0].level, 7);
    }

    #[test]
    fn test_level_overflow_is_skipped() {
        let data = b"\x00Huge - Lvl 99999999999\x00";
        assert!(find_anchors(data).is_empty());
    }

    #[test]
    fn test_level_is_not_truncated() {
        assert!(find_anchors(b"\x00Huge - Lvl 12345678901\x00").is_empty());

        let anchors = find_anchors(b"\x00Max - Lvl 4294967295\x00");
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].level, u32::MAX);
    }

    #[test]
    fn test_map_and_server_per_character() {
        let mut data = b"\x00Alice - Lvl 10\x00".to_vec();
        data.extend(str_field("UploadingServerMapName", "TheIsland_WP"));
        data.extend(str_field("UploadingServerName", "Island-PvE"));
        data.extend_from_slice(b"\x00Bob - Lvl 20\x00");
        data.extend(str_field("UploadingServerMapName", "Ragnarok_P"));
        data.extend(str_field("UploadingServerName", "Rag-PvE"));

        let records = CharacterExtractor::default().extract(&data);
        assert_eq!(records[0].map.as_deref(), Some("TheIsland"));
        assert_eq!(records[0].server.as_deref(), Some("Island-PvE"));
        assert_eq!(records[1].map.as_deref(), Some("Ragnarok"));
        assert_eq!(records[1].server.as_deref(), Some("Rag-PvE"));
    }

    #[test]
    fn test_map_falls_back_to_preceding_field() {
        let mut data = str_field("UploadingServerMapName", "ScorchedEarth_WP");
        data.extend_from_slice(b"\x00Alice - Lvl 10\x00");
        data.extend(vec![0u8; 100]);

        let record = &CharacterExtractor::default().extract(&data)[0];
        assert_eq!(record.map.as_deref(), Some("ScorchedEarth"));
        assert_eq!(record.server, None);
    }

    #[test]
    fn test_items_shared_across_buffer() {
        let mut data = two_characters();
        data.extend_from_slice(b"BlueprintGeneratedClass /Game/Items/PrimalItemResource_Wood.PrimalItemResource_Wood_C\x00");

        let records = CharacterExtractor::default().extract(&data);
        assert_eq!(records[0].items, vec!["Wood"]);
        assert_eq!(records[1].items, vec!["Wood"]);
    }

    #[test]
    fn test_items_scoped_per_character() {
        let mut data = two_characters();
        put(
            &mut data,
            500,
            b"BlueprintGeneratedClass /Game/Items/PrimalItemResource_Stone.PrimalItemResource_Stone_C\x00",
        );
        data.extend_from_slice(b"BlueprintGeneratedClass /Game/Items/PrimalItemResource_Wood.PrimalItemResource_Wood_C\x00");

        let records = CharacterExtractor::default()
            .with_item_scope(ItemScope::Character)
            .extract(&data);
        assert_eq!(records[0].items, vec!["Stone"]);
        assert_eq!(records[1].items, vec!["Wood"]);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let mut data = two_characters();
        data.extend(str_field("UploadingServerName", "Island-PvE"));
        let extractor = CharacterExtractor::default();
        assert_eq!(extractor.extract(&data), extractor.extract(&data));
    }

    #[test]
    fn test_strip_map_suffix() {
        assert_eq!(strip_map_suffix("TheIsland_WP"), "TheIsland");
        assert_eq!(strip_map_suffix("Aberration_P"), "Aberration");
        assert_eq!(strip_map_suffix("The_Pit"), "The_Pit");
    }

    #[test]
    fn test_empty_buffer() {
        assert!(CharacterExtractor::default().extract(&[]).is_empty());
    }
}

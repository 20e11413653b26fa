//! Item names from blueprint class references
//!
//! Inventory entries reference their item class as
//! `BlueprintGeneratedClass /Game/<dirs>/<Asset>.<Class>_C`. The asset name
//! is turned into something a player would recognise.

use std::collections::HashSet;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use regex::Regex as TextRegex;

use crate::scanner::lossy;

static BLUEPRINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?-u)BlueprintGeneratedClass /Game/(?:[A-Za-z0-9_\-]{1,128}/){0,24}([A-Za-z0-9_\-]{1,128})\.([A-Za-z0-9_]{1,128})_C",
    )
    .unwrap()
});

static PRIMAL_ITEM: Lazy<TextRegex> =
    Lazy::new(|| TextRegex::new(r"PrimalItem[A-Za-z_]*_([A-Za-z0-9_]+)$").unwrap());

static CAMEL: Lazy<TextRegex> = Lazy::new(|| TextRegex::new(r"([a-z])([A-Z])").unwrap());

/// Names that are never real inventory.
const DENYLIST: &[&str] = &["Starting Note", "None"];

/// Item names in first-seen order, exact duplicates removed.
pub fn extract_items(data: &[u8]) -> Vec<String> {
    extract_items_in(data, 0..data.len())
}

/// Like [`extract_items`], restricted to blueprint references that start
/// inside `range`.
pub fn extract_items_in(data: &[u8], range: Range<usize>) -> Vec<String> {
    let end = range.end.min(data.len());
    let start = range.start.min(end);

    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for caps in BLUEPRINT.captures_iter(&data[start..end]) {
        let Some(asset) = caps.get(1) else { continue };
        let name = display_name(&lossy(asset.as_bytes()));

        if name.is_empty() || name.contains("Buff") || DENYLIST.contains(&name.as_str()) {
            continue;
        }
        if seen.insert(name.clone()) {
            items.push(name);
        }
    }

    items
}

/// Human-readable name for a blueprint asset.
///
/// `PrimalItemArmor_ClothShirt` becomes `Cloth Shirt`; anything else is
/// split on case changes and underscores as-is.
pub fn display_name(asset: &str) -> String {
    let base = PRIMAL_ITEM
        .captures(asset)
        .and_then(|c| c.get(1))
        .map_or(asset, |m| m.as_str());
    let base = base.strip_suffix("_C").unwrap_or(base);

    CAMEL
        .replace_all(base, "$1 $2")
        .replace('_', " ")
        .trim()
        .to_string()
}

//! Tribe files (`.arktribe`)
//!
//! Only the header of a tribe file matters here; the tail is mostly the
//! tribe log, so reads are capped at [`TRIBE_READ_LIMIT`].

use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::files::read_prefix;
use crate::scanner::PropertyTag;

/// Bytes read from the start of a tribe file.
pub const TRIBE_READ_LIMIT: u64 = 50_000;

/// Tribe and player names must have a length prefix below this.
pub const MAX_NAME_LEN: u32 = 200;

pub const EXTENSION: &str = "arktribe";

const TRIBE_ID: PropertyTag = PropertyTag::new("TribeID", "Int");
const TRIBE_NAME: PropertyTag = PropertyTag::new("TribeName", "Str");

/// Offset of the `u32` value past `IntProperty\0`.
const INT_VALUE_OFFSET: usize = 8;

/// Offset of the string length past `StrProperty\0`.
pub(crate) const STR_LEN_OFFSET: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TribeRecord {
    pub tribe_id: u32,
    pub tribe_name: String,
}

/// Whatever a tribe buffer yielded; either half may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TribeFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tribe_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tribe_name: Option<String>,
}

impl TribeFields {
    /// Both halves present and usable for linkage.
    pub fn into_record(self) -> Option<TribeRecord> {
        match (self.tribe_id, self.tribe_name) {
            (Some(tribe_id), Some(tribe_name)) if tribe_id != 0 && !tribe_name.is_empty() => {
                Some(TribeRecord {
                    tribe_id,
                    tribe_name,
                })
            }
            _ => None,
        }
    }
}

/// First decodable `TribeID` in any buffer (tribe, profile, or upload).
pub fn extract_tribe_id(data: &[u8]) -> Option<u32> {
    TRIBE_ID.find_map(data, |m| m.u32_le_at(data, INT_VALUE_OFFSET))
}

/// First acceptable `TribeName` in a buffer.
pub fn extract_tribe_name(data: &[u8]) -> Option<String> {
    TRIBE_NAME.find_map(data, |m| m.string_at(data, STR_LEN_OFFSET, MAX_NAME_LEN))
}

pub fn parse_tribe(data: &[u8]) -> TribeFields {
    TribeFields {
        tribe_id: extract_tribe_id(data),
        tribe_name: extract_tribe_name(data),
    }
}

/// Read the prefix of a tribe file and parse it.
pub fn read_tribe_file(path: &Path) -> Result<TribeFields> {
    let data = read_prefix(path, TRIBE_READ_LIMIT)?;
    Ok(parse_tribe(&data))
}

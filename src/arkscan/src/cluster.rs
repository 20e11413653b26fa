//! Cluster uploads
//!
//! When a player transfers off a server the client writes a blob into the
//! cluster directory. The file name is the transfer's client id; the content
//! holds the characters, their inventory, and where they came from.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::TribeLookup;
use crate::character::{CharacterExtractor, CharacterRecord};
use crate::error::Result;
use crate::files::{
    file_name, file_size, list_files, modified, read_prefix, DEFAULT_MAX_FILE_BYTES,
};
use crate::platform::{detect_upload, Platform};
use crate::scanner::lossy;
use crate::tribe::extract_tribe_id;

/// Files smaller than this are placeholders, not uploads.
pub const MIN_UPLOAD_SIZE: u64 = 1000;

/// Extensions in the cluster directory that are never uploads.
const SKIPPED_EXTENSIONS: &[&str] = &["ark", "tmp"];

const USERNAME_KEYS: &[&str] = &["PlayerName", "PlayerCharacterName", "PlayerNamePrivate"];

static USERNAME: Lazy<Vec<Regex>> = Lazy::new(|| {
    USERNAME_KEYS
        .iter()
        .map(|key| {
            Regex::new(&format!(
                r"(?s-u){}\x00.{{0,80}}?StrProperty\x00.{{0,80}}?([A-Za-z0-9_]{{3,24}})\x00",
                regex::escape(key)
            ))
            .unwrap()
        })
        .collect()
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterUpload {
    pub filename: String,
    pub client_id: String,
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tribe_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tribe_name: Option<String>,
    pub characters: Vec<CharacterRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_time: Option<DateTime<Local>>,
    pub file_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClusterUpload {
    /// Stand-in for an upload that could not be read, so it still shows up.
    pub fn failed(filename: &str, error: impl ToString) -> Self {
        Self {
            filename: filename.to_string(),
            client_id: filename.to_string(),
            platform: Platform::Unknown,
            player_username: None,
            tribe_id: None,
            tribe_name: None,
            characters: Vec::new(),
            upload_time: None,
            file_size: 0,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterScan {
    pub folder: PathBuf,
    pub scan_time: DateTime<Local>,
    pub files: Vec<ClusterUpload>,
    pub total_characters: usize,
}

/// Account name near one of the player-name properties.
pub fn extract_player_username(data: &[u8]) -> Option<String> {
    USERNAME.iter().find_map(|pattern| {
        pattern.captures_iter(data).find_map(|caps| {
            let name = lossy(caps.get(1)?.as_bytes());
            // "<Name> - Lvl N" is the character's display string
            if name.contains("Lvl") || name.len() >= 24 {
                return None;
            }
            Some(name)
        })
    })
}

#[derive(Debug, Clone)]
pub struct ClusterExtractor {
    pub characters: CharacterExtractor,
    pub max_file_bytes: u64,
}

impl Default for ClusterExtractor {
    fn default() -> Self {
        Self {
            characters: CharacterExtractor::default(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl ClusterExtractor {
    pub fn new(characters: CharacterExtractor) -> Self {
        Self {
            characters,
            ..Self::default()
        }
    }

    pub fn with_max_file_bytes(mut self, limit: u64) -> Self {
        self.max_file_bytes = limit;
        self
    }

    /// Everything an upload buffer yields. `upload_time` is left for the
    /// caller.
    pub fn extract_bytes(
        &self,
        filename: &str,
        data: &[u8],
        tribes: Option<&dyn TribeLookup>,
    ) -> ClusterUpload {
        let tribe_id = extract_tribe_id(data).filter(|id| *id != 0);
        let tribe_name = tribe_id
            .zip(tribes)
            .and_then(|(id, tribes)| tribes.tribe_name(id));

        let mut characters = self.characters.extract(data);
        for character in &mut characters {
            character.tribe_id = tribe_id;
            character.tribe_name = tribe_name.clone();
        }

        ClusterUpload {
            filename: filename.to_string(),
            client_id: filename.to_string(),
            platform: detect_upload(data),
            player_username: extract_player_username(data),
            tribe_id,
            tribe_name,
            characters,
            upload_time: None,
            file_size: data.len() as u64,
            error: None,
        }
    }

    /// Read and extract one upload. Never fails; a read error becomes a
    /// [`ClusterUpload::failed`] record.
    pub fn extract_file(&self, path: &Path, tribes: Option<&dyn TribeLookup>) -> ClusterUpload {
        let filename = file_name(path);
        match read_prefix(path, self.max_file_bytes) {
            Ok(data) => {
                let mut upload = self.extract_bytes(&filename, &data, tribes);
                upload.upload_time = modified(path);
                if let Some(size) = file_size(path) {
                    upload.file_size = size;
                }
                debug!(
                    file = %filename,
                    characters = upload.characters.len(),
                    platform = %upload.platform,
                    "Parsed cluster upload"
                );
                upload
            }
            Err(e) => {
                warn!("{}", e);
                ClusterUpload::failed(&filename, e)
            }
        }
    }

    /// Every upload in `dir` that produced characters or an error.
    pub fn scan_dir(&self, dir: &Path, tribes: Option<&dyn TribeLookup>) -> Result<ClusterScan> {
        let files: Vec<ClusterUpload> = list_files(dir, None)?
            .iter()
            .filter(|path| is_candidate(path))
            .map(|path| self.extract_file(path, tribes))
            .filter(keep)
            .collect();

        Ok(ClusterScan {
            folder: dir.to_path_buf(),
            scan_time: Local::now(),
            total_characters: files.iter().map(|f| f.characters.len()).sum(),
            files,
        })
    }
}

/// Uploads worth listing: ones with characters, and failed reads so the file
/// still shows up.
fn keep(upload: &ClusterUpload) -> bool {
    !upload.characters.is_empty() || upload.error.is_some()
}

fn is_candidate(path: &Path) -> bool {
    let skipped = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SKIPPED_EXTENSIONS.iter().any(|s| e.eq_ignore_ascii_case(s)));
    if skipped {
        return false;
    }
    path.metadata()
        .map(|m| m.len() >= MIN_UPLOAD_SIZE)
        .unwrap_or(false)
}

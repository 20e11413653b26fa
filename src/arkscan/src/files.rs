//! File system helpers shared by the extractors

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Default per-file read budget for uploads and profiles.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 64 * 1024 * 1024;

/// Read at most `limit` bytes from the start of `path`.
///
/// The game server may be writing the file while we read it; whatever is on
/// disk at that moment is returned.
pub fn read_prefix(path: &Path, limit: u64) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut data = Vec::new();
    file.take(limit)
        .read_to_end(&mut data)
        .map_err(|e| Error::io(path, e))?;
    Ok(data)
}

/// Modification time as local time, if the platform reports one.
pub fn modified(path: &Path) -> Option<DateTime<Local>> {
    let mtime = path.metadata().ok()?.modified().ok()?;
    Some(DateTime::<Local>::from(mtime))
}

/// Size on disk, regardless of how much of the file was read.
pub fn file_size(path: &Path) -> Option<u64> {
    path.metadata().ok().map(|m| m.len())
}

/// Last path component as a string, or the whole path if it has none.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Regular files directly inside `dir`, sorted by name.
///
/// `ext` filters on extension (without the dot) when given.
pub fn list_files(dir: &Path, ext: Option<&str>) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::NotFound(dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| match ext {
            Some(ext) => p
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(ext)),
            None => true,
        })
        .collect();

    files.sort();
    Ok(files)
}

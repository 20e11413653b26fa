//! Named server save directories

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Server name to its `SavedArks/<Map>` directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerDirs(BTreeMap<String, PathBuf>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerStatus {
    pub name: String,
    pub path: PathBuf,
    /// The save directory exists.
    pub online: bool,
}

impl ServerDirs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.0.insert(name.into(), path.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<PathBuf> {
        self.0.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Save directory for `name`.
    pub fn get(&self, name: &str) -> Result<&Path> {
        self.0
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| Error::UnknownServer(name.to_string()))
    }

    /// Every directory, for tribe cache rebuilds.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.0.values().cloned().collect()
    }

    pub fn status(&self) -> Vec<ServerStatus> {
        self.0
            .iter()
            .map(|(name, path)| ServerStatus {
                name: name.clone(),
                path: path.clone(),
                online: path.is_dir(),
            })
            .collect()
    }
}

impl FromIterator<(String, PathBuf)> for ServerDirs {
    fn from_iter<I: IntoIterator<Item = (String, PathBuf)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

//! Configuration management for the arkscan CLI

use anyhow::{Context, Result};
use arkscan::{
    CharacterExtractor, ClusterExtractor, ItemScope, KnownPlatforms, Platform, ProfileExtractor,
    ServerDirs, TribeCache,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory the cluster uploads land in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_dir: Option<PathBuf>,

    /// How inventory is attributed to characters of one upload
    pub item_scope: ItemScope,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tribe_cache_ttl_secs: Option<u64>,

    /// Per-file read budget in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_file_bytes: Option<u64>,

    /// Server name to save directory
    pub servers: ServerDirs,

    /// Client id to platform, for profiles that carry no platform signal
    pub known_platforms: BTreeMap<String, Platform>,
}

impl Config {
    /// Get the path to the default config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("arkscan");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from `path`, or defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        Ok(())
    }

    /// Cluster directory, preferring an explicit override
    pub fn cluster_dir(&self, override_dir: Option<PathBuf>) -> Result<PathBuf> {
        override_dir
            .or_else(|| self.cluster_dir.clone())
            .context("No cluster directory configured (use --dir or `arkscan configure --cluster-dir`)")
    }

    pub fn known_platforms(&self) -> KnownPlatforms {
        self.known_platforms
            .iter()
            .map(|(id, platform)| (id.clone(), *platform))
            .collect()
    }

    pub fn cluster_extractor(&self) -> ClusterExtractor {
        let characters = CharacterExtractor::default().with_item_scope(self.item_scope);
        let extractor = ClusterExtractor::new(characters);
        match self.max_file_bytes {
            Some(limit) => extractor.with_max_file_bytes(limit),
            None => extractor,
        }
    }

    pub fn profile_extractor(&self) -> ProfileExtractor {
        let extractor = ProfileExtractor::new(self.known_platforms());
        match self.max_file_bytes {
            Some(limit) => extractor.with_max_file_bytes(limit),
            None => extractor,
        }
    }

    /// Tribe cache over every configured server directory
    pub fn tribe_cache(&self) -> TribeCache {
        let cache = TribeCache::new(self.servers.paths());
        match self.tribe_cache_ttl_secs {
            Some(secs) => cache.with_ttl(Duration::from_secs(secs)),
            None => cache,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config {
            cluster_dir: Some(PathBuf::from("/srv/ark/cluster")),
            item_scope: ItemScope::Character,
            tribe_cache_ttl_secs: Some(60),
            ..Config::default()
        };
        config.servers.insert("TheIsland", "/srv/ark/TheIsland_WP");
        config
            .known_platforms
            .insert("0002fda69f5e47d8".to_string(), Platform::PcSteam);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_parse_hand_written() {
        let config: Config = toml::from_str(
            r#"
            cluster_dir = "C:/ASA Servers/clusters/main"
            item_scope = "buffer"

            [servers]
            TheIsland = "C:/ASA Servers/TheIsland/ShooterGame/Saved/SavedArks/TheIsland_WP"

            [known_platforms]
            "0002e3000f8443b6" = "PS5"
            "#,
        )
        .unwrap();

        assert_eq!(config.servers.len(), 1);
        assert_eq!(
            config.known_platforms().get("0002e3000f8443b6"),
            Some(&Platform::Ps5)
        );
        assert_eq!(config.max_file_bytes, None);
    }

    #[test]
    fn test_cluster_dir_override() {
        let config = Config {
            cluster_dir: Some(PathBuf::from("/configured")),
            ..Config::default()
        };
        assert_eq!(
            config.cluster_dir(Some(PathBuf::from("/flag"))).unwrap(),
            PathBuf::from("/flag")
        );
        assert_eq!(config.cluster_dir(None).unwrap(), PathBuf::from("/configured"));
        assert!(Config::default().cluster_dir(None).is_err());
    }
}

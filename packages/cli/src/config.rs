use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use waypoint_places::{StaticGeocoder, DEFAULT_PALETTE_SIZE, DEFAULT_TTL};

pub const DEFAULT_CONFIG_NAME: &str = "waypoint.config.json";

/// Waypoint configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Number of distinct place colors
    #[serde(default = "default_palette_size")]
    pub palette_size: u8,

    /// Lifetime of a geocode cache entry
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Fragment size used when streaming a file
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// JSON map of place name to `[lat, lng]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gazetteer: Option<String>,

    /// Prefix for block ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_seed: Option<String>,
}

fn default_palette_size() -> u8 {
    DEFAULT_PALETTE_SIZE
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_TTL.as_secs()
}

fn default_chunk_size() -> usize {
    16
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Invalid {}", config_path.display()))?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Load the gazetteer, or an empty one when none is configured
    pub fn load_gazetteer(&self, cwd: &str) -> anyhow::Result<StaticGeocoder> {
        let Some(path) = &self.gazetteer else {
            return Ok(StaticGeocoder::new());
        };
        let path = PathBuf::from(cwd).join(path);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Cannot read gazetteer {}", path.display()))?;
        Ok(StaticGeocoder::from_json(&content)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            palette_size: default_palette_size(),
            cache_ttl_secs: default_cache_ttl_secs(),
            chunk_size: default_chunk_size(),
            gazetteer: None,
            id_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "paletteSize": 6,
            "cacheTtlSecs": 60,
            "chunkSize": 4,
            "gazetteer": "places.json",
            "idSeed": "trip-"
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.palette_size, 6);
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.chunk_size, 4);
        assert_eq!(config.gazetteer, Some("places.json".to_string()));
        assert_eq!(config.id_seed, Some("trip-".to_string()));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.palette_size, 10);
        assert_eq!(config.cache_ttl_secs, 86400);
        assert_eq!(config.chunk_size, 16);
        assert!(config.gazetteer.is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{ "chunkSize": 1 }"#).unwrap();
        assert_eq!(config.chunk_size, 1);
        assert_eq!(config.palette_size, 10);
        assert_eq!(config.cache_ttl_secs, 86400);
    }

    #[test]
    fn test_missing_gazetteer_is_empty() {
        let gazetteer = Config::default().load_gazetteer(".").unwrap();
        assert!(gazetteer.is_empty());
    }
}

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::fetch::DEFAULT_USER_AGENT;

/// Default number of tiles kept in memory.
pub const DEFAULT_MEMORY_CAPACITY: usize = 2048;

/// Configuration of a [`TileCache`](super::TileCache).
///
/// All fields have defaults, so a configuration file only needs to list what it changes:
///
/// ```json
/// {
///     "memory_capacity": 512,
///     "persistent_cache": { "path": ".tile_cache", "ttl_secs": 86400 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileCacheConfig {
    /// Maximum number of decoded tiles kept in memory.
    pub memory_capacity: usize,
    /// File cache settings. No file cache is used if `None`.
    pub persistent_cache: Option<PersistentCacheConfig>,
    /// User agent of tile requests.
    pub user_agent: String,
    /// Url of the proxy to send tile requests through.
    pub proxy: Option<String>,
    /// Timeout of one tile request.
    pub request_timeout_secs: Option<u64>,
}

/// File cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentCacheConfig {
    /// Root folder of the cache.
    pub path: PathBuf,
    /// Time-to-live of the cached files. Zero means the files never expire.
    #[serde(default)]
    pub ttl_secs: u64,
}

impl PersistentCacheConfig {
    /// Time-to-live of the cached files.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl TileCacheConfig {
    /// Timeout of one tile request.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for TileCacheConfig {
    fn default() -> Self {
        Self {
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            persistent_cache: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            request_timeout_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        let config: TileCacheConfig = serde_json::from_str("{}").expect("valid json");
        assert_eq!(config, TileCacheConfig::default());
        assert_eq!(config.memory_capacity, DEFAULT_MEMORY_CAPACITY);
        assert!(config.user_agent.starts_with("geotile/"));
    }

    #[test]
    fn partial_config() {
        let config: TileCacheConfig = serde_json::from_str(
            r#"{
                "memory_capacity": 16,
                "persistent_cache": { "path": "/tmp/tiles" },
                "proxy": "http://localhost:3128",
                "request_timeout_secs": 10
            }"#,
        )
        .expect("valid json");

        assert_eq!(config.memory_capacity, 16);
        assert_eq!(config.proxy.as_deref(), Some("http://localhost:3128"));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(10)));

        let persistent = config.persistent_cache.expect("file cache configured");
        assert_eq!(persistent.path, PathBuf::from("/tmp/tiles"));
        assert_eq!(persistent.ttl(), Duration::ZERO);
    }
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::record::DEFAULT_LOCATIONS;

/// Longest accepted cache TTL (one year)
const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Main configuration structure
///
/// Every section is optional in the file; anything left out keeps the
/// built-in default, which is what the service runs with when there is no
/// config file at all.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub cache: CacheConfig,
    pub locations: LocationConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Load config from the default location, falling back to defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.feed.url.trim().is_empty() {
            return Err(crate::Error::ConfigError("feed.url must not be empty".into()));
        }
        if self.feed.timeout_secs == 0 {
            return Err(crate::Error::ConfigError("feed.timeout_secs must be positive".into()));
        }
        if self.cache.ttl_secs == 0 || self.cache.ttl_secs > MAX_TTL_SECS {
            return Err(crate::Error::ConfigError(format!(
                "cache.ttl_secs must be between 1 and {}",
                MAX_TTL_SECS
            )));
        }
        if self.locations.allowed.is_empty() {
            return Err(crate::Error::ConfigError(
                "locations.allowed must name at least one location".into(),
            ));
        }
        Ok(())
    }

    /// Get the config file path (XDG on Linux, AppData on Windows)
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("mensa-feed");

        Ok(config_dir.join("config.toml"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Upstream meal plan XML
    #[serde(default = "default_feed_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl FeedConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

fn default_feed_url() -> String {
    mensa_api::feed::DEFAULT_FEED_URL.to_string()
}

fn default_timeout() -> u64 {
    mensa_api::feed::DEFAULT_TIMEOUT.as_secs()
}

fn default_user_agent() -> String {
    mensa_api::feed::DEFAULT_USER_AGENT.to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a fetched meal plan is served before refetching
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_secs.min(MAX_TTL_SECS) as i64)
    }
}

fn default_cache_ttl() -> u64 {
    3600 // the feed is updated a few times a day at most
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Locations whose meals are served; everything else is dropped
    #[serde(default = "default_locations")]
    pub allowed: Vec<String>,
}

fn default_locations() -> Vec<String> {
    DEFAULT_LOCATIONS.iter().map(|l| l.to_string()).collect()
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            allowed: default_locations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

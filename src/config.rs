use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Application configuration, TOML on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub remote: RemoteConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Feed endpoint. The comments endpoint is derived from its base.
    pub feed_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    #[serde(default = "default_cache_dir")]
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Single JSON snapshot file.
    File,
    /// Transactional SQLite database.
    #[default]
    Sqlite,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    crate::remote::DEFAULT_USER_AGENT.to_string()
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("feedvault")
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            directory: default_cache_dir(),
        }
    }
}

impl Config {
    pub fn new(feed_url: &str) -> Self {
        Self {
            remote: RemoteConfig {
                feed_url: feed_url.to_string(),
                timeout_secs: default_timeout_secs(),
                user_agent: default_user_agent(),
            },
            cache: CacheConfig::default(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|_| {
            Error::Config(format!(
                "configuration not found: {}",
                path.as_ref().display()
            ))
        })?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from disk, then apply `FEEDVAULT_FEED_URL` and
    /// `FEEDVAULT_CACHE_DIR` overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|err| Error::Config(err.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.remote.feed_url)
            .map_err(|err| Error::InvalidUrl(format!("feed_url: {err}")))?;

        if self.remote.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be positive".to_string()));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("FEEDVAULT_FEED_URL") {
            self.remote.feed_url = url;
        }
        if let Ok(dir) = std::env::var("FEEDVAULT_CACHE_DIR") {
            self.cache.directory = PathBuf::from(dir);
        }
    }

    pub fn feed_url(&self) -> Result<Url> {
        Url::parse(&self.remote.feed_url)
            .map_err(|err| Error::InvalidUrl(format!("feed_url: {err}")))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.remote.timeout_secs)
    }

    /// Location of the file-backed store's snapshot.
    pub fn snapshot_path(&self) -> PathBuf {
        self.cache.directory.join("feed_cache.json")
    }

    /// Location of the SQLite store's database.
    pub fn database_path(&self) -> PathBuf {
        self.cache.directory.join("feed_cache.db")
    }
}

//! Configuration management for gameshelf.
//!
//! Configuration is read from `~/.config/gameshelf/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::fetcher::http_transport::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::fetcher::DEFAULT_MAX_REDIRECTS;

pub const DEFAULT_MANIFEST_URL: &str = "https://example.com/gameshelf/manifest.json";
pub const DEFAULT_ICON_BASE_URL: &str = "https://example.com/gameshelf/icons/";

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub downloader: DownloaderConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    /// Redirects followed before giving up (default: 10)
    pub max_redirects: usize,

    /// Per-request timeout in seconds (default: 10)
    pub timeout_secs: u64,

    pub user_agent: String,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            max_redirects: DEFAULT_MAX_REDIRECTS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl DownloaderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub manifest_url: String,

    /// Directory that per-game and per-engine icons live under
    pub icon_base_url: String,

    /// Interval used by `gameshelf watch` (e.g. "30m", "1h", "1d")
    pub refresh_interval: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            icon_base_url: DEFAULT_ICON_BASE_URL.to_string(),
            refresh_interval: "1h".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            Self::create_default_config(config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/gameshelf/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("gameshelf").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        format!(
            r##"# gameshelf configuration

[downloader]
# Redirects to follow before failing with "too many redirects"
max_redirects = {max_redirects}

# Per-request timeout in seconds
timeout_secs = {timeout_secs}

user_agent = "{user_agent}"

[catalog]
# JSON manifest: an array of {{ "id", "title", "engine" }} objects
manifest_url = "{manifest_url}"

# Icons are looked up as <icon_base_url>/<id>.png, then <icon_base_url>/<engine>.png
icon_base_url = "{icon_base_url}"

# Interval for `gameshelf watch`: "30s", "15m", "1h", "1d" or plain seconds
refresh_interval = "1h"
"##,
            max_redirects = DEFAULT_MAX_REDIRECTS,
            timeout_secs = DEFAULT_TIMEOUT_SECS,
            user_agent = DEFAULT_USER_AGENT,
            manifest_url = DEFAULT_MANIFEST_URL,
            icon_base_url = DEFAULT_ICON_BASE_URL,
        )
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

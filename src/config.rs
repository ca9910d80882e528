//! Configuration management for PodTUI
//!
//! Config is stored at ~/.config/podtui/config.toml. Every field is optional
//! in the file; missing or unparsable files fall back to defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::directory::{DEFAULT_DIRECTORY_URL, DEFAULT_SEARCH_LIMIT};

/// Environment variable overriding the directory endpoint
pub const DIRECTORY_URL_ENV: &str = "PODTUI_DIRECTORY_URL";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the podcast directory search service
    pub directory_url: String,
    /// Maximum number of shows per search
    pub search_limit: u32,
    /// Timeout for directory and feed requests
    pub request_timeout_secs: u64,
    /// Where downloaded episodes are kept while playing (system temp dir if unset)
    pub download_dir: Option<PathBuf>,
    /// Log file directory (platform data dir if unset)
    pub log_dir: Option<PathBuf>,
    /// UI refresh interval
    pub tick_rate_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory_url: DEFAULT_DIRECTORY_URL.to_string(),
            search_limit: DEFAULT_SEARCH_LIMIT,
            request_timeout_secs: 30,
            download_dir: None,
            log_dir: None,
            tick_rate_ms: 250,
        }
    }
}

impl Config {
    /// Get config file path (~/.config/podtui/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("podtui").join("config.toml"))
    }

    /// Load config from the default location
    pub fn load() -> Self {
        Self::load_from(None)
    }

    /// Load config from `path` (or the default location), then apply env overrides
    pub fn load_from(path: Option<&Path>) -> Self {
        let path = path.map(Path::to_path_buf).or_else(Self::path);
        let mut config = path
            .as_deref()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| match toml::from_str::<Config>(&s) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring unparsable config file");
                    None
                }
            })
            .unwrap_or_default();

        if let Ok(url) = std::env::var(DIRECTORY_URL_ENV) {
            config.apply_directory_override(&url);
        }
        config
    }

    fn apply_directory_override(&mut self, url: &str) {
        let url = url.trim();
        if !url.is_empty() {
            self.directory_url = url.to_string();
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;
        self.save_to(&path)
    }

    /// Save config to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.clamp(16, 2000))
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Log directory with fallback chain:
    /// 1. `log_dir` from the config file
    /// 2. Platform data dir + podtui/logs
    /// 3. `.logs` in the working directory
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|p| p.join("podtui").join("logs")))
            .unwrap_or_else(|| PathBuf::from(".logs"))
    }
}

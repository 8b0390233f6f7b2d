//! Configuration management for ralph-live.
//!
//! Configuration is loaded from multiple sources with precedence:
//! 1. Environment variables (RALPH_LIVE_*)
//! 2. Config file (RALPH_LIVE_CONFIG, or config.toml in the data dir)
//! 3. Default values

use anyhow::{Context, Result};
use directories::ProjectDirs;
use ralph_live_core::LiveConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Ralph server API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Polling, history and stream tuning
    #[serde(default)]
    pub live: LiveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for the Ralph server
    #[serde(default = "default_api_url")]
    pub url: String,

    /// Bearer token for authentication
    pub api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            api_key: None,
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_data_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("dev", "ralph", "ralph-live") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ralph-live")
    }
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load a config file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("RALPH_LIVE_CONFIG") {
            PathBuf::from(path)
        } else {
            default_data_dir().join("config.toml")
        }
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("RALPH_LIVE_API_URL").filter(|v| !v.is_empty()) {
            self.api.url = url;
        }
        if let Some(key) = lookup("RALPH_LIVE_API_KEY").filter(|v| !v.is_empty()) {
            self.api.api_key = Some(key);
        }
    }
}

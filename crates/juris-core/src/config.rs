use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::models::Mode;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const API_URL_ENV: &str = "JURIS_API_URL";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_url: Option<String>,
    pub default_mode: Option<Mode>,
    pub request_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            api_url: None,
            default_mode: Some(Mode::default()),
            request_timeout_secs: None,
            log_level: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    pub fn save_default_mode(mode: Mode) -> Result<()> {
        let mut config = Self::load().unwrap_or_else(|_| Self::new());
        config.default_mode = Some(mode);
        config.save()
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("juris").join("config.json"))
    }

    /// Service base URL: CLI flag, then `JURIS_API_URL`, then config file.
    pub fn api_url(&self, flag: Option<&str>) -> String {
        pick_api_url(flag, std::env::var(API_URL_ENV).ok(), self.api_url.as_deref())
    }

    pub fn mode(&self, flag: Option<Mode>) -> Mode {
        flag.or(self.default_mode).unwrap_or_default()
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

fn pick_api_url(flag: Option<&str>, env: Option<String>, file: Option<&str>) -> String {
    flag.map(str::to_string)
        .or(env.filter(|url| !url.trim().is_empty()))
        .or_else(|| file.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

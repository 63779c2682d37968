use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::diagram::LayoutConfig;
use crate::{plog_debug, Error, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub api_url: Option<String>,
    pub project: Option<String>,
    pub token: Option<String>,
    pub request_timeout_secs: Option<u64>,
    /// Periodic refresh in the TUI; unset or zero disables it.
    pub refresh_interval_secs: Option<u64>,
    #[serde(default)]
    pub layout: LayoutConfig,
}

impl Config {
    pub fn pert_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".pert"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::pert_dir()?.join("pert.toml"))
    }

    pub fn effective_api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        plog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            plog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        config.layout.validate()?;
        plog_debug!(
            "Config loaded: api_url={}, project={:?}, token={}",
            config.effective_api_url(),
            config.project,
            if config.token.is_some() { "set" } else { "unset" }
        );
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                plog_debug!("Creating config directory: {}", dir.display());
                fs::create_dir_all(dir)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        plog_debug!("Config saved to {}", path.display());
        Ok(())
    }

    /// Apply command-line overrides on top of the file values.
    pub fn with_overrides(mut self, api_url: Option<String>, project: Option<String>) -> Self {
        if api_url.is_some() {
            self.api_url = api_url;
        }
        if project.is_some() {
            self.project = project;
        }
        self
    }
}

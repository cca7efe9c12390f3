//! User settings
//!
//! Read from `~/.config/pantry/config.toml` (or `--config` / `PANTRY_CONFIG`).
//! Every key is optional; command-line flags win over the file.

use anyhow::{Context, Result, bail};
use declarative::FailurePolicy;
use pkgkit::{BackendKind, RetryConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("pantry"))
}

/// Default settings file path
pub fn default_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// When to wrap package manager commands in sudo
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SudoMode {
    /// Use sudo when not running as root
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RetrySettings {
    /// Attempts for lock and network failures, including the first
    pub attempts: u32,
    /// Delay before the first retry, doubled each time
    pub base_delay_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay_secs: 5,
        }
    }
}

impl RetrySettings {
    pub fn to_config(&self) -> RetryConfig {
        RetryConfig::new(self.attempts, Duration::from_secs(self.base_delay_secs), 2.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Settings {
    pub backend: BackendKind,
    pub policy: FailurePolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    pub sudo: SudoMode,
    pub retry: RetrySettings,
}

impl Settings {
    /// Resolve the settings path: explicit beats default
    pub fn path(explicit: Option<&str>) -> Result<PathBuf> {
        match explicit {
            Some(p) => Ok(PathBuf::from(shellexpand::tilde(p).as_ref())),
            None => default_path(),
        }
    }

    /// Load settings
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        let path = Self::path(explicit)?;
        if !path.exists() {
            if explicit.is_some() {
                bail!("Settings file not found: {}", path.display());
            }
            log::debug!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let settings = toml::from_str(&content)
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize settings")
    }
}

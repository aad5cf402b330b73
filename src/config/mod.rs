// Tool settings (~/.config/aws-sso-profiles/config.toml)
use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "aws-sso-profiles";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub defaults: Defaults,
}

/// Fallbacks for flags the command line leaves unset
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Defaults {
    pub profile_prefix: Option<String>,
    pub region: Option<String>,
}

impl Settings {
    /// Get the settings directory path
    ///
    /// Priority:
    /// 1. XDG_CONFIG_HOME/aws-sso-profiles (if env var is set)
    /// 2. ~/.config/aws-sso-profiles (if ~/.config exists)
    /// 3. ~/.aws-sso-profiles (fallback on Unix)
    /// 4. Platform default on Windows
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            if !xdg_config.is_empty() {
                return Ok(PathBuf::from(xdg_config).join(APP_DIR));
            }
        }

        #[cfg(unix)]
        {
            if let Some(home_dir) = dirs::home_dir() {
                let xdg_config = home_dir.join(".config");
                if xdg_config.exists() {
                    return Ok(xdg_config.join(APP_DIR));
                }
                return Ok(home_dir.join(format!(".{}", APP_DIR)));
            }
        }

        #[cfg(not(unix))]
        {
            if let Some(config_dir) = dirs::config_dir() {
                return Ok(config_dir.join(APP_DIR));
            }
        }

        Err(SyncError::Config(
            "Could not determine config directory".to_string(),
        ))
    }

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load settings from the default location; a missing file means defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Settings::default());
        }

        tracing::debug!("Loading settings from: {}", path.display());
        let contents = fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        toml::from_str(&contents)
            .map_err(|e| SyncError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }
}

//! Configuration management for glucosed.
//!
//! Loads daemon settings from /etc/glucose-voice/glucosed.toml or uses
//! defaults. Nightscout and unit settings are not here: they are read from
//! the environment on every skill request (see `glucose_common::settings`).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/glucose-voice/glucosed.toml";

/// Overrides the config file path
pub const CONFIG_PATH_ENV: &str = "GLUCOSED_CONFIG";

/// Overrides `bind_addr`
pub const BIND_ENV: &str = "GLUCOSED_BIND";

/// Daemon configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Address the skill endpoint listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Log filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Path Alexa posts skill requests to
    #[serde(default = "default_skill_path")]
    pub skill_path: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:7866".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_skill_path() -> String {
    "/alexa".to_string()
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            log_level: default_log_level(),
            skill_path: default_skill_path(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("skill_path must start with '/', got '{0}'")]
    InvalidSkillPath(String),
}

impl DaemonConfig {
    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Same as `load`, with environment variables read through `lookup`
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_PATH));

        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            info!("No config at {:?}, using defaults", path);
            Self::default()
        };

        if let Some(bind) = lookup(BIND_ENV) {
            if bind.trim().is_empty() {
                warn!("Ignoring empty {}", BIND_ENV);
            } else {
                config.bind_addr = bind.trim().to_string();
            }
        }

        Ok(config)
    }

    /// Load from an explicit file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: DaemonConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if !config.skill_path.starts_with('/') {
            return Err(ConfigError::InvalidSkillPath(config.skill_path));
        }

        info!("Loaded config from {:?}", path);
        Ok(config)
    }
}

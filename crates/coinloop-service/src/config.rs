//! Service configuration types

use crate::error::{Result, ServiceError};
use coinloop_economics::{CalendarConfig, EconomyConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete Coinloop configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinloopConfig {
    /// Economy policy
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Day and week boundaries
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// Storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Transaction behavior
    #[serde(default)]
    pub service: ServiceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CoinloopConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ServiceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(ServiceError::Config(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.economy.validate()?;
        if self.storage.state_path.trim().is_empty() {
            return Err(ServiceError::Config("storage.state_path is empty".into()));
        }
        Ok(())
    }

    /// Effective configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ServiceError::Config(e.to_string()))
    }
}

/// Storage configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Economy state document
    #[serde(default = "default_state_path")]
    pub state_path: String,
}

fn default_state_path() -> String {
    "~/.coinloop/economy.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
        }
    }
}

/// Transaction settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Re-runs allowed after a version conflict
    #[serde(default = "default_max_commit_retries")]
    pub max_commit_retries: u32,

    /// Reject unknown difficulty labels instead of using the default
    #[serde(default)]
    pub strict_difficulty: bool,
}

fn default_max_commit_retries() -> u32 {
    10
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_commit_retries: default_max_commit_retries(),
            strict_difficulty: false,
        }
    }
}

/// Logging configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format ("text" or "json")
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

//! Configuration for the observer registry and logging.

use crate::error::{ObserverError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ObserverConfig {
    pub registry: RegistryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Number of physical card slots on the device
    pub slot_count: i32,
    /// Slot that unselected subscriptions follow
    pub default_slot_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            slot_count: 2,
            default_slot_id: crate::observer::DEFAULT_SIM_SLOT_ID,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl ObserverConfig {
    /// Load config from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load config from `path`, falling back to defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        debug!("Config saved to {}", path.display());
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| ObserverError::Configuration {
            reason: "Could not determine config directory".to_string(),
        })?;

        Ok(config_dir.join("telephony-observer").join("config.toml"))
    }

    /// Validate config settings
    pub fn validate(&self) -> Result<()> {
        if self.registry.slot_count <= 0 {
            return Err(ObserverError::Configuration {
                reason: "slot_count must be greater than 0".to_string(),
            });
        }

        if self.registry.default_slot_id < 0
            || self.registry.default_slot_id >= self.registry.slot_count
        {
            return Err(ObserverError::Configuration {
                reason: format!(
                    "default_slot_id {} is outside 0..{}",
                    self.registry.default_slot_id, self.registry.slot_count
                ),
            });
        }

        if self.registry.slot_count > 4 {
            warn!("Unusually high slot count configured: {}", self.registry.slot_count);
        }

        Ok(())
    }
}

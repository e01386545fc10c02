use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigData, ConfigError, ConfigFormat};

/// What the stop sequence does when a unit's stop call fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopPolicy {
    /// Stop at the failing unit and leave the rest of the sequence running
    #[default]
    Halt,
    /// Release the failing unit, keep stopping the remaining units and report
    /// the first failure at the end
    Continue,
}

/// Engine-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub stop_policy: StopPolicy,

    /// Per-unit configuration overrides, keyed by unit name
    #[serde(default)]
    pub units: HashMap<String, ConfigData>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stop_policy(mut self, policy: StopPolicy) -> Self {
        self.stop_policy = policy;
        self
    }

    pub fn with_unit(mut self, name: &str, config: ConfigData) -> Self {
        self.units.insert(name.to_string(), config);
        self
    }

    /// Override for a single unit
    pub fn unit(&self, name: &str) -> Option<&ConfigData> {
        self.units.get(name)
    }

    /// Parse configuration text in the given format
    pub fn parse(data: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        format.decode(data)
    }

    /// Load configuration from a file, picking the format from its extension
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            ConfigError::UnsupportedFormat(
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .unwrap_or("<none>")
                    .to_string(),
            )
        })?;
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loading engine configuration from {}", path.display());
        Self::parse(&data, format)
    }

    pub fn serialize(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        format.encode(self)
    }
}

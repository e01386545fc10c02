//! # Singular Configuration
//!
//! Configuration values handed to units. A unit's resolved configuration is
//! its descriptor defaults with the caller's override merged on top; the
//! engine-wide [`EngineConfig`] can carry per-unit overrides and the stop
//! policy, loaded from JSON, YAML or TOML.
pub mod engine;
pub mod error;

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use engine::{EngineConfig, StopPolicy};
pub use error::ConfigError;

/// Supported configuration formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }

    pub(crate) fn encode<T: Serialize>(&self, value: &T) -> Result<String, ConfigError> {
        match self {
            ConfigFormat::Json => serde_json::to_string_pretty(value)
                .map_err(|e| ConfigError::serialization("json", e)),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => {
                serde_yaml::to_string(value).map_err(|e| ConfigError::serialization("yaml", e))
            }
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => {
                toml::to_string_pretty(value).map_err(|e| ConfigError::serialization("toml", e))
            }
        }
    }

    pub(crate) fn decode<T: for<'de> Deserialize<'de>>(&self, data: &str) -> Result<T, ConfigError> {
        match self {
            ConfigFormat::Json => {
                serde_json::from_str(data).map_err(|e| ConfigError::deserialization("json", e))
            }
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => {
                serde_yaml::from_str(data).map_err(|e| ConfigError::deserialization("yaml", e))
            }
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => {
                toml::from_str(data).map_err(|e| ConfigError::deserialization("toml", e))
            }
        }
    }
}

/// Flat key/value configuration passed to unit start and stop calls
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigData {
    /// Raw configuration values
    #[serde(flatten)]
    values: HashMap<String, serde_json::Value>,
}

impl ConfigData {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration from a HashMap
    pub fn from_hashmap(values: HashMap<String, serde_json::Value>) -> Self {
        Self { values }
    }

    /// Create a configuration from a JSON object value
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        match value {
            serde_json::Value::Object(map) => Ok(Self {
                values: map.into_iter().collect(),
            }),
            serde_json::Value::Null => Ok(Self::new()),
            other => Err(ConfigError::InvalidValue {
                key: "<root>".to_string(),
                message: format!("expected an object, found {}", other),
            }),
        }
    }

    /// Get a configuration value
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Get a configuration value with default
    pub fn get_or<T: for<'de> Deserialize<'de>>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Raw JSON value for a key
    pub fn get_raw(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// Set a configuration value
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), ConfigError> {
        let json_value = serde_json::to_value(value).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.values.insert(key.to_string(), json_value);
        Ok(())
    }

    /// Insert an already converted JSON value
    pub fn insert(&mut self, key: &str, value: serde_json::Value) {
        self.values.insert(key.to_string(), value);
    }

    /// Builder-style [`ConfigData::set`]
    pub fn with<T: Serialize>(mut self, key: &str, value: T) -> Result<Self, ConfigError> {
        self.set(key, value)?;
        Ok(self)
    }

    /// Remove a configuration value
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.values.remove(key)
    }

    /// Check if key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Get all keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge with another config, overriding existing values
    pub fn merge(&mut self, other: &ConfigData) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// `self` with `other` merged on top, leaving both untouched
    pub fn merged(&self, other: &ConfigData) -> ConfigData {
        let mut result = self.clone();
        result.merge(other);
        result
    }

    /// Serialize to string based on format
    pub fn serialize(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        format.encode(self)
    }

    /// Deserialize from string based on format
    pub fn deserialize(data: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        format.decode(data)
    }
}

impl From<HashMap<String, serde_json::Value>> for ConfigData {
    fn from(values: HashMap<String, serde_json::Value>) -> Self {
        Self::from_hashmap(values)
    }
}

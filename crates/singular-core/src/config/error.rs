//! # Singular Configuration Errors
//!
//! [`ConfigError`] covers reading engine configuration files and converting
//! configuration data between its in-memory form and the supported formats.
use std::path::PathBuf;

use thiserror::Error;

use crate::kernel::error::DynError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading configuration '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization to '{format}' failed: {source}")]
    Serialization {
        format: String,
        #[source]
        source: DynError,
    },

    #[error("Deserialization from '{format}' failed: {source}")]
    Deserialization {
        format: String,
        #[source]
        source: DynError,
    },

    #[error("Configuration value for '{key}' is invalid: {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    pub(crate) fn serialization<E>(format: &str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ConfigError::Serialization {
            format: format.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn deserialization<E>(format: &str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ConfigError::Deserialization {
            format: format.to_string(),
            source: Box::new(source),
        }
    }
}

//! # Singular Kernel Errors
//!
//! Defines the crate-wide [`Error`] type.
//!
//! Each subsystem owns a typed error enum ([`GraphError`], [`RegistryError`],
//! [`LifecycleError`], [`ThreadError`], [`ConfigError`]); the kernel error
//! aggregates them so that every public operation returns a single
//! [`Result`] type.
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::config::ConfigError;
use crate::graph::GraphError;
use crate::lifecycle::LifecycleError;
use crate::registry::RegistryError;
use crate::thread::ThreadError;

/// Boxed error returned by unit start/stop bodies
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Registration-time graph error (unknown dependency, cycle)
    #[error("Dependency graph error: {0}")]
    Graph(#[from] GraphError),

    /// Registry operation or lookup failure
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A unit failed to start or stop
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// Thread bookkeeping error
    #[error("Thread error: {0}")]
    Thread(#[from] ThreadError),

    /// Configuration loading or serialization error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error raised by caller code, e.g. the body passed to `run`
    #[error("{0}")]
    Custom(#[source] DynError),

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl Error {
    /// The lifecycle failure behind this error, if any
    pub fn as_lifecycle(&self) -> Option<&LifecycleError> {
        match self {
            Error::Lifecycle(err) => Some(err),
            _ => None,
        }
    }

    /// Whether this error is a cyclic dependency rejection
    pub fn is_cyclic_dependency(&self) -> bool {
        matches!(self, Error::Graph(GraphError::CyclicDependency(_)))
    }
}

impl From<DynError> for Error {
    fn from(err: DynError) -> Self {
        Error::Custom(err)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

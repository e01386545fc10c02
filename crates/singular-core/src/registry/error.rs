//! # Singular Registry Errors
//!
//! [`RegistryError`] covers registration conflicts, lookups of units that are
//! unknown or not running, and failed lookups through a local scope.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Unit '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("Unit name '{0}' is reserved")]
    ReservedName(String),

    #[error("Unit '{0}' is not registered")]
    UnknownUnit(String),

    #[error("Unit '{name}' is running ({ref_count} references) and cannot be unregistered")]
    UnitRunning { name: String, ref_count: usize },

    #[error("No live instance for unit '{0}'")]
    NotFound(String),

    #[error("Layout of unit '{unit}' does not match its dependencies at alias '{alias}'")]
    InvalidLayout { unit: String, alias: String },

    #[error("Name '{0}' is given both as a value and as a unit")]
    ScopeCollision(String),

    #[error("Unit '{unit}' has no dependency named '{alias}'")]
    UnknownAlias { unit: String, alias: String },

    #[error("Instance of '{name}' is a {actual}, not a {expected}")]
    DowncastFailed {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("The engine owning this scope has been dropped")]
    EngineDropped,
}

//! # Singular Lifecycle Errors
//!
//! [`LifecycleError`] reports a unit whose start or stop call failed. When
//! undoing a failed start fails as well, [`LifecycleError::RollbackFailure`]
//! carries both failures, with the original one as its error source.
use thiserror::Error;

use crate::kernel::error::DynError;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Unit '{unit}' failed to start: {source}")]
    StartFailure {
        unit: String,
        #[source]
        source: DynError,
    },

    #[error("Unit '{unit}' failed to stop: {source}")]
    StopFailure {
        unit: String,
        #[source]
        source: DynError,
    },

    #[error("Rollback failed ({rollback}) after: {original}")]
    RollbackFailure {
        rollback: Box<LifecycleError>,
        #[source]
        original: Box<LifecycleError>,
    },
}

impl LifecycleError {
    pub(crate) fn start_failure(unit: &str, source: impl Into<DynError>) -> Self {
        LifecycleError::StartFailure {
            unit: unit.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn stop_failure(unit: &str, source: impl Into<DynError>) -> Self {
        LifecycleError::StopFailure {
            unit: unit.to_string(),
            source: source.into(),
        }
    }

    /// The failure that started it all: the start failure behind a failed
    /// rollback, or this error itself
    pub fn original(&self) -> &LifecycleError {
        match self {
            LifecycleError::RollbackFailure { original, .. } => original.original(),
            other => other,
        }
    }

    /// The failed rollback, if there was one
    pub fn rollback(&self) -> Option<&LifecycleError> {
        match self {
            LifecycleError::RollbackFailure { rollback, .. } => Some(rollback),
            _ => None,
        }
    }

    /// Unit whose call failed
    pub fn unit(&self) -> &str {
        match self {
            LifecycleError::StartFailure { unit, .. } | LifecycleError::StopFailure { unit, .. } => {
                unit
            }
            LifecycleError::RollbackFailure { rollback, .. } => rollback.unit(),
        }
    }

    /// The error returned by the unit itself
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        match self {
            LifecycleError::StartFailure { source, .. } | LifecycleError::StopFailure { source, .. } => {
                source.as_ref()
            }
            LifecycleError::RollbackFailure { original, .. } => original.cause(),
        }
    }

    pub fn is_start_failure(&self) -> bool {
        matches!(self, LifecycleError::StartFailure { .. })
    }

    pub fn is_stop_failure(&self) -> bool {
        matches!(self, LifecycleError::StopFailure { .. })
    }
}

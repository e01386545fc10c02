use async_trait::async_trait;

use crate::config::ConfigData;
use crate::kernel::error::DynError;
use crate::scope::LocalScope;
use crate::unit::{Exports, Instance, UnitDependency};

/// Lifecycle contract of a managed component
#[async_trait]
pub trait Unit: Send + Sync {
    /// Dependencies by local alias
    fn dependencies(&self) -> Vec<UnitDependency> {
        Vec::new()
    }

    /// Default configuration, merged under the caller's override
    fn defaults(&self) -> ConfigData {
        ConfigData::new()
    }

    /// Bring the unit up.
    ///
    /// Returning `Ok(None)` makes `exports` the unit's instance.
    async fn start(
        &self,
        config: &ConfigData,
        scope: &LocalScope,
        exports: &Exports,
    ) -> Result<Option<Instance>, DynError>;

    /// Tear the unit down. Called once, when the last thread using it stops.
    async fn stop(
        &self,
        _config: &ConfigData,
        _scope: &LocalScope,
        _instance: &Instance,
    ) -> Result<(), DynError> {
        Ok(())
    }
}

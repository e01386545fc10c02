use std::path::Path;

use crate::config::{ConfigData, EngineConfig, StopPolicy};
use crate::kernel::engine::Singular;
use crate::kernel::error::Result;
use crate::registry::{Registration, RegistryError};
use crate::unit::{Injectable, Instance, UnitDescriptor};

/// Assembles a [`Singular`] from units, literal values and configuration.
///
/// Everything is registered in one batch when [`SingularBuilder::build`]
/// runs, so units may be added in any order.
#[derive(Debug, Default)]
pub struct SingularBuilder {
    config: EngineConfig,
    config_path: Option<std::path::PathBuf>,
    /// Policy chosen on the builder, applied over any config file
    stop_policy: Option<StopPolicy>,
    units: Vec<(String, UnitDescriptor)>,
    values: Vec<(String, Instance)>,
}

impl SingularBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the engine configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.stop_policy = Some(config.stop_policy);
        self.config = config;
        self
    }

    /// Load the engine configuration from a file at build time
    pub fn config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn stop_policy(mut self, policy: StopPolicy) -> Self {
        self.stop_policy = Some(policy);
        self
    }

    /// Override the configuration of one unit
    pub fn unit_config(mut self, name: &str, config: ConfigData) -> Self {
        self.config.units.insert(name.to_string(), config);
        self
    }

    pub fn unit(mut self, name: &str, descriptor: UnitDescriptor) -> Self {
        self.units.push((name.to_string(), descriptor));
        self
    }

    /// Expose a literal value as a zero-dependency unit
    pub fn value<T: Injectable>(mut self, name: &str, value: T) -> Self {
        self.values.push((name.to_string(), Instance::new(value)));
        self
    }

    pub fn build(self) -> Result<Singular> {
        let mut config = match &self.config_path {
            Some(path) => EngineConfig::from_path(path)?,
            None => EngineConfig::default(),
        };
        // Settings made on the builder win over the file
        if let Some(policy) = self.stop_policy {
            config.stop_policy = policy;
        }
        config.units.extend(self.config.units);

        if let Some((name, _)) = self
            .values
            .iter()
            .find(|(name, _)| self.units.iter().any(|(unit, _)| unit == name))
        {
            return Err(RegistryError::ScopeCollision(name.clone()).into());
        }

        let batch: Vec<Registration> = self
            .values
            .into_iter()
            .map(|(name, value)| (name, UnitDescriptor::instance(value)))
            .chain(self.units)
            .map(|(name, descriptor)| Registration::new(&name, descriptor, None))
            .collect();

        let engine = Singular::with_config(config);
        engine.register_many(batch)?;
        log::debug!("Built engine with {} unit(s)", engine.unit_names().len());
        Ok(engine)
    }
}

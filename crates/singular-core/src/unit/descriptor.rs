use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::ConfigData;
use crate::registry::RegistryError;
use crate::unit::{Injectable, Instance, Unit, ValueUnit};

/// A unit as the registry sees it: its lifecycle plus layout, dependency
/// flags and defaults
#[derive(Clone)]
pub struct UnitDescriptor {
    /// Local alias -> registered unit name
    layout: BTreeMap<String, String>,
    /// Local alias -> hard (`true`) or weak (`false`)
    deps: BTreeMap<String, bool>,
    defaults: ConfigData,
    unit: Arc<dyn Unit>,
}

impl UnitDescriptor {
    /// Describe a unit with an identity layout (every alias names the unit it
    /// depends on)
    pub fn new<U: Unit + 'static>(unit: U) -> Self {
        Self::from_arc(Arc::new(unit))
    }

    pub fn from_arc(unit: Arc<dyn Unit>) -> Self {
        let mut layout = BTreeMap::new();
        let mut deps = BTreeMap::new();
        for dep in unit.dependencies() {
            layout.insert(dep.name.clone(), dep.name.clone());
            // A repeated alias is hard if any declaration is
            let required = deps.get(&dep.name).copied().unwrap_or(false) || dep.required;
            deps.insert(dep.name, required);
        }
        let defaults = unit.defaults();
        Self {
            layout,
            deps,
            defaults,
            unit,
        }
    }

    /// Literal value exposed as a zero-dependency unit
    pub fn value<T: Injectable>(value: T) -> Self {
        Self::new(ValueUnit::new(value))
    }

    pub fn instance(instance: Instance) -> Self {
        Self::new(ValueUnit::from_instance(instance))
    }

    /// Point a local alias at another registered unit
    pub fn with_layout(mut self, alias: &str, target: &str) -> Self {
        self.layout.insert(alias.to_string(), target.to_string());
        self
    }

    pub fn with_defaults(mut self, defaults: ConfigData) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn layout(&self) -> &BTreeMap<String, String> {
        &self.layout
    }

    pub fn deps(&self) -> &BTreeMap<String, bool> {
        &self.deps
    }

    pub fn defaults(&self) -> &ConfigData {
        &self.defaults
    }

    pub fn unit(&self) -> &Arc<dyn Unit> {
        &self.unit
    }

    /// Registered unit an alias resolves to
    pub fn target_of(&self, alias: &str) -> Option<&str> {
        self.layout.get(alias).map(String::as_str)
    }

    /// Whether an alias is a hard dependency; `None` if not declared
    pub fn is_hard(&self, alias: &str) -> Option<bool> {
        self.deps.get(alias).copied()
    }

    /// Targets of hard dependencies
    pub fn hard_targets(&self) -> impl Iterator<Item = &str> {
        self.deps
            .iter()
            .filter(|(_, hard)| **hard)
            .filter_map(|(alias, _)| self.target_of(alias))
    }

    /// Every unit name the layout refers to
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.layout.values().map(String::as_str)
    }

    /// Check that layout and dependency flags describe the same aliases
    pub fn validate_layout(&self, unit: &str) -> Result<(), RegistryError> {
        let undeclared = self.layout.keys().find(|alias| !self.deps.contains_key(*alias));
        let unmapped = self.deps.keys().find(|alias| !self.layout.contains_key(*alias));
        match undeclared.or(unmapped) {
            Some(alias) => Err(RegistryError::InvalidLayout {
                unit: unit.to_string(),
                alias: alias.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for UnitDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitDescriptor")
            .field("layout", &self.layout)
            .field("deps", &self.deps)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

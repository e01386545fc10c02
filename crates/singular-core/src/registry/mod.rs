//! # Singular Unit Registry
//!
//! Owns every registered unit: its descriptor, resolved configuration, live
//! instance and reference count. The dependency graph and full start order
//! are recomputed whenever the set of units changes, so an invalid graph is
//! rejected at registration instead of at start time.
pub mod error;

use std::collections::{BTreeMap, BTreeSet};

pub use error::RegistryError;

use crate::config::ConfigData;
use crate::graph::{DependencyGraph, GraphError};
use crate::kernel::constants::SELF_UNIT_NAME;
use crate::kernel::error::Result;
use crate::unit::{Instance, UnitDescriptor};

/// Registry state of a single unit
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub descriptor: UnitDescriptor,
    /// Defaults with the caller override merged on top
    pub config: ConfigData,
    /// Live value, present while the unit runs (and during its start call)
    pub instance: Option<Instance>,
    /// Number of threads currently holding the unit
    pub ref_count: usize,
}

impl RegistryEntry {
    fn new(descriptor: UnitDescriptor, overrides: Option<&ConfigData>) -> Self {
        let config = match overrides {
            Some(overrides) => descriptor.defaults().merged(overrides),
            None => descriptor.defaults().clone(),
        };
        Self {
            descriptor,
            config,
            instance: None,
            ref_count: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.ref_count > 0
    }

    /// Drop the live instance and forget every reference
    pub(crate) fn release(&mut self) {
        self.instance = None;
        self.ref_count = 0;
    }
}

/// A unit waiting to be registered
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub descriptor: UnitDescriptor,
    pub config: Option<ConfigData>,
}

impl Registration {
    pub fn new(name: &str, descriptor: UnitDescriptor, config: Option<ConfigData>) -> Self {
        Self {
            name: name.to_string(),
            descriptor,
            config,
        }
    }
}

/// Name -> unit state, plus the derived graph and order
#[derive(Debug, Default)]
pub struct UnitRegistry {
    entries: BTreeMap<String, RegistryEntry>,
    graph: DependencyGraph,
    order: Vec<String>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single unit
    pub fn register(
        &mut self,
        name: &str,
        descriptor: UnitDescriptor,
        config: Option<ConfigData>,
    ) -> Result<()> {
        self.register_many(vec![Registration::new(name, descriptor, config)])
    }

    /// Register a batch of units atomically.
    ///
    /// Units in the batch may refer to each other in any order. Nothing is
    /// committed unless the whole batch is valid and the resulting graph is
    /// acyclic.
    pub fn register_many(&mut self, batch: Vec<Registration>) -> Result<()> {
        let mut incoming: BTreeSet<&str> = BTreeSet::new();
        for registration in &batch {
            let name = registration.name.as_str();
            if name == SELF_UNIT_NAME {
                return Err(RegistryError::ReservedName(name.to_string()).into());
            }
            if self.entries.contains_key(name) || !incoming.insert(name) {
                return Err(RegistryError::AlreadyRegistered(name.to_string()).into());
            }
            registration.descriptor.validate_layout(name)?;
        }

        for registration in &batch {
            if let Some(missing) = registration
                .descriptor
                .targets()
                .find(|target| !self.entries.contains_key(*target) && !incoming.contains(target))
            {
                return Err(GraphError::UnknownDependency {
                    unit: registration.name.clone(),
                    dependency: missing.to_string(),
                }
                .into());
            }
        }

        let graph = DependencyGraph::from_units(
            self.entries
                .iter()
                .map(|(name, entry)| (name.as_str(), &entry.descriptor))
                .chain(batch.iter().map(|r| (r.name.as_str(), &r.descriptor))),
        );
        let order = graph.topological_order()?;

        for registration in batch {
            log::debug!("Registered unit '{}'", registration.name);
            let entry = RegistryEntry::new(registration.descriptor, registration.config.as_ref());
            self.entries.insert(registration.name, entry);
        }
        self.graph = graph;
        self.order = order;
        Ok(())
    }

    /// Remove a unit that no thread holds. Returns whether it was registered.
    ///
    /// A unit with an instance is refused too: its start call may still be
    /// running, and its stop call would never run once it is gone.
    pub fn unregister(&mut self, name: &str) -> Result<bool> {
        let Some(entry) = self.entries.get(name) else {
            return Ok(false);
        };
        if entry.ref_count > 0 || entry.instance.is_some() {
            return Err(RegistryError::UnitRunning {
                name: name.to_string(),
                ref_count: entry.ref_count,
            }
            .into());
        }
        self.entries.remove(name);
        self.rebuild_graph()?;
        log::debug!("Unregistered unit '{}'", name);
        Ok(true)
    }

    fn rebuild_graph(&mut self) -> Result<()> {
        let graph = DependencyGraph::from_units(
            self.entries
                .iter()
                .map(|(name, entry)| (name.as_str(), &entry.descriptor)),
        );
        self.order = graph.topological_order()?;
        self.graph = graph;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered unit names, sorted
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn entry(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.get(name)
    }

    pub(crate) fn entry_mut(&mut self, name: &str) -> Option<&mut RegistryEntry> {
        self.entries.get_mut(name)
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Start order of every registered unit
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Live instance of a unit
    pub fn get(&self, name: &str) -> std::result::Result<Instance, RegistryError> {
        self.entries
            .get(name)
            .and_then(|entry| entry.instance.clone())
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn ref_count(&self, name: &str) -> usize {
        self.entries.get(name).map_or(0, |entry| entry.ref_count)
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.ref_count(name) > 0
    }

    pub fn config(&self, name: &str) -> Option<&ConfigData> {
        self.entries.get(name).map(|entry| &entry.config)
    }

    /// Start order for `required` and everything it hard-depends on
    pub fn order_for<S: AsRef<str>>(&self, required: &[S]) -> Vec<String> {
        let closure = self.graph.closure(required);
        self.order
            .iter()
            .filter(|name| closure.contains(*name))
            .cloned()
            .collect()
    }

    /// Every live instance, by unit name
    pub fn live_scope(&self) -> BTreeMap<String, Instance> {
        self.entries
            .iter()
            .filter_map(|(name, entry)| entry.instance.clone().map(|i| (name.clone(), i)))
            .collect()
    }

    /// Live instances of the given units
    pub fn scope_for<S: AsRef<str>>(&self, names: &[S]) -> BTreeMap<String, Instance> {
        names
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                self.get(name).ok().map(|instance| (name.to_string(), instance))
            })
            .collect()
    }
}

//! # Singular Local Scopes
//!
//! A [`LocalScope`] is the read-only view a unit receives in its start and
//! stop calls: its declared dependencies by local alias, the unit's own name
//! and a weak [`EngineHandle`] back to the engine. Hard dependencies are
//! resolved when the scope is built; weak ones become [`LazyInstance`]
//! handles looked up on access, since the peer may not be running yet.
//!
//! [`Scope`] is the per-thread view returned when a thread starts.
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::kernel::engine::EngineCore;
use crate::registry::{RegistryError, UnitRegistry};
use crate::unit::{Injectable, Instance};

/// Weak back-reference to the engine
#[derive(Clone, Default)]
pub struct EngineHandle {
    core: Weak<EngineCore>,
}

impl EngineHandle {
    pub(crate) fn new(core: &Arc<EngineCore>) -> Self {
        Self {
            core: Arc::downgrade(core),
        }
    }

    fn with_registry<T>(&self, f: impl FnOnce(&UnitRegistry) -> T) -> Result<T, RegistryError> {
        let core = self.core.upgrade().ok_or(RegistryError::EngineDropped)?;
        let state = core.state();
        Ok(f(&state.registry))
    }

    /// Whether the engine is still alive
    pub fn is_alive(&self) -> bool {
        self.core.strong_count() > 0
    }

    /// Live instance of a registered unit
    pub fn get(&self, name: &str) -> Result<Instance, RegistryError> {
        self.with_registry(|registry| registry.get(name))?
    }

    pub fn has_unit(&self, name: &str) -> bool {
        self.with_registry(|registry| registry.contains(name))
            .unwrap_or(false)
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.with_registry(|registry| registry.is_running(name))
            .unwrap_or(false)
    }

    pub fn unit_names(&self) -> Vec<String> {
        self.with_registry(UnitRegistry::names).unwrap_or_default()
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Handle to a weakly depended-on unit, resolved on every access
#[derive(Clone, Debug)]
pub struct LazyInstance {
    target: String,
    engine: EngineHandle,
}

impl LazyInstance {
    pub(crate) fn new(target: &str, engine: EngineHandle) -> Self {
        Self {
            target: target.to_string(),
            engine,
        }
    }

    /// Registered unit this handle resolves to
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Current instance of the target, if it has one
    pub fn get(&self) -> Result<Instance, RegistryError> {
        self.engine.get(&self.target)
    }

    pub fn get_as<T: Injectable>(&self) -> Result<Arc<T>, RegistryError> {
        downcast(&self.target, self.get()?)
    }

    /// Whether the target currently has an instance
    pub fn is_live(&self) -> bool {
        self.get().is_ok()
    }
}

fn downcast<T: Injectable>(name: &str, instance: Instance) -> Result<Arc<T>, RegistryError> {
    instance
        .downcast::<T>()
        .ok_or_else(|| RegistryError::DowncastFailed {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
            actual: instance.type_name(),
        })
}

struct LocalScopeInner {
    unit: String,
    hard: BTreeMap<String, Instance>,
    weak: BTreeMap<String, LazyInstance>,
    targets: BTreeMap<String, String>,
    engine: EngineHandle,
}

/// Dependencies of one unit by local alias
#[derive(Clone)]
pub struct LocalScope {
    inner: Arc<LocalScopeInner>,
}

impl LocalScope {
    /// Name of the unit this scope belongs to
    pub fn unit_name(&self) -> &str {
        &self.inner.unit
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.inner.engine
    }

    /// Instance behind a local alias. Weak aliases are resolved now.
    pub fn get(&self, alias: &str) -> Result<Instance, RegistryError> {
        if let Some(instance) = self.inner.hard.get(alias) {
            return Ok(instance.clone());
        }
        match self.inner.weak.get(alias) {
            Some(lazy) => lazy.get(),
            None => Err(RegistryError::UnknownAlias {
                unit: self.inner.unit.clone(),
                alias: alias.to_string(),
            }),
        }
    }

    pub fn get_as<T: Injectable>(&self, alias: &str) -> Result<Arc<T>, RegistryError> {
        let instance = self.get(alias)?;
        let name = self.target_of(alias).unwrap_or(alias);
        downcast(name, instance)
    }

    /// Lazy handle for a weak alias
    pub fn weak(&self, alias: &str) -> Option<LazyInstance> {
        self.inner.weak.get(alias).cloned()
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.inner.hard.contains_key(alias) || self.inner.weak.contains_key(alias)
    }

    /// Registered unit behind a local alias
    pub fn target_of(&self, alias: &str) -> Option<&str> {
        self.inner.targets.get(alias).map(String::as_str)
    }

    /// Declared aliases, sorted
    pub fn aliases(&self) -> Vec<String> {
        self.inner.targets.keys().cloned().collect()
    }
}

impl fmt::Debug for LocalScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalScope")
            .field("unit", &self.inner.unit)
            .field("hard", &self.inner.hard.keys().collect::<Vec<_>>())
            .field("weak", &self.inner.weak.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Build the local scope of `unit` from the registry's current state.
///
/// Hard targets must be live; weak targets only have to be registered.
pub(crate) fn build_local_scope(
    registry: &UnitRegistry,
    unit: &str,
    engine: EngineHandle,
) -> Result<LocalScope, RegistryError> {
    let entry = registry
        .entry(unit)
        .ok_or_else(|| RegistryError::UnknownUnit(unit.to_string()))?;
    let descriptor = &entry.descriptor;

    let mut hard = BTreeMap::new();
    let mut weak = BTreeMap::new();
    for (alias, target) in descriptor.layout() {
        if !registry.contains(target) {
            return Err(RegistryError::NotFound(target.clone()));
        }
        if descriptor.is_hard(alias).unwrap_or(true) {
            hard.insert(alias.clone(), registry.get(target)?);
        } else {
            weak.insert(alias.clone(), LazyInstance::new(target, engine.clone()));
        }
    }

    Ok(LocalScope {
        inner: Arc::new(LocalScopeInner {
            unit: unit.to_string(),
            hard,
            weak,
            targets: descriptor.layout().clone(),
            engine,
        }),
    })
}

/// Instances visible to a started thread, by unit name
#[derive(Clone, Debug, Default)]
pub struct Scope {
    entries: BTreeMap<String, Instance>,
}

impl Scope {
    pub fn new(entries: BTreeMap<String, Instance>) -> Self {
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Result<Instance, RegistryError> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn get_as<T: Injectable>(&self, name: &str) -> Result<Arc<T>, RegistryError> {
        downcast(name, self.get(name)?)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Instance)> {
        self.entries.iter().map(|(name, instance)| (name.as_str(), instance))
    }
}

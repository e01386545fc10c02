use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::{ConfigData, EngineConfig};
use crate::event::SharedEventDispatcher;
use crate::kernel::builder::SingularBuilder;
use crate::kernel::constants;
use crate::kernel::error::{DynError, Result};
use crate::registry::{Registration, RegistryError, UnitRegistry};
use crate::scope::{EngineHandle, Scope};
use crate::thread::{Thread, ThreadId, ThreadManager, ThreadTable};
use crate::unit::{Injectable, Instance, UnitDescriptor};

/// Mutable engine state, guarded by [`EngineCore::state`]
#[derive(Debug, Default)]
pub(crate) struct EngineState {
    pub(crate) registry: UnitRegistry,
    pub(crate) threads: ThreadTable,
}

/// Shared engine internals
#[derive(Debug)]
pub(crate) struct EngineCore {
    /// Locked only for short synchronous sections, never across an await
    state: Mutex<EngineState>,
    /// Held for the whole of a thread start or stop
    pub(crate) sequencer: tokio::sync::Mutex<()>,
    pub(crate) events: SharedEventDispatcher,
    pub(crate) config: EngineConfig,
}

impl EngineCore {
    fn new(config: EngineConfig) -> Self {
        Self {
            state: Mutex::new(EngineState::default()),
            sequencer: tokio::sync::Mutex::new(()),
            events: SharedEventDispatcher::new(),
            config,
        }
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, EngineState> {
        // Every critical section leaves the state consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Dependency injection and lifecycle engine.
///
/// Cloning is cheap; clones share the same registry and threads.
#[derive(Clone, Debug)]
pub struct Singular {
    core: Arc<EngineCore>,
}

impl Default for Singular {
    fn default() -> Self {
        Self::new()
    }
}

impl Singular {
    /// Empty engine with default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        log::debug!("Creating {} engine v{}", constants::APP_NAME, constants::APP_VERSION);
        Self {
            core: Arc::new(EngineCore::new(config)),
        }
    }

    pub fn builder() -> SingularBuilder {
        SingularBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.core.config
    }

    /// Dispatcher for lifecycle notifications
    pub fn events(&self) -> &SharedEventDispatcher {
        &self.core.events
    }

    /// Weak handle to this engine, as given to local scopes
    pub fn handle(&self) -> EngineHandle {
        EngineHandle::new(&self.core)
    }

    fn resolve_override(&self, name: &str, config: Option<ConfigData>) -> Option<ConfigData> {
        config.or_else(|| self.core.config.unit(name).cloned())
    }

    /// Register a unit.
    ///
    /// `config` is merged over the unit's defaults; without it the engine
    /// configuration's entry for `name` is used, if any.
    pub fn register(
        &self,
        name: &str,
        descriptor: UnitDescriptor,
        config: Option<ConfigData>,
    ) -> Result<()> {
        let config = self.resolve_override(name, config);
        self.core.state().registry.register(name, descriptor, config)
    }

    /// Register several units at once; they may depend on each other in any
    /// order
    pub fn register_many(&self, batch: Vec<Registration>) -> Result<()> {
        let batch = batch
            .into_iter()
            .map(|registration| Registration {
                config: self.resolve_override(&registration.name, registration.config),
                ..registration
            })
            .collect();
        self.core.state().registry.register_many(batch)
    }

    /// Register a literal value as a zero-dependency unit
    pub fn register_value<T: Injectable>(&self, name: &str, value: T) -> Result<()> {
        self.register(name, UnitDescriptor::value(value), None)
    }

    /// Remove a unit no thread holds. Returns whether it was registered.
    pub fn unregister(&self, name: &str) -> Result<bool> {
        self.core.state().registry.unregister(name)
    }

    pub fn has_unit(&self, name: &str) -> bool {
        self.core.state().registry.contains(name)
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.core.state().registry.is_running(name)
    }

    pub fn ref_count(&self, name: &str) -> usize {
        self.core.state().registry.ref_count(name)
    }

    /// Registered unit names, sorted
    pub fn unit_names(&self) -> Vec<String> {
        self.core.state().registry.names()
    }

    /// Start order of every registered unit
    pub fn order(&self) -> Vec<String> {
        self.core.state().registry.order().to_vec()
    }

    /// Resolved configuration of a unit
    pub fn unit_config(&self, name: &str) -> Option<ConfigData> {
        self.core.state().registry.config(name).cloned()
    }

    /// Ids of running threads
    pub fn active_threads(&self) -> Vec<ThreadId> {
        self.core.state().threads.ids()
    }

    /// Units a running thread asked for
    pub fn thread_units(&self, id: ThreadId) -> Option<Vec<String>> {
        self.core
            .state()
            .threads
            .get(id)
            .map(|record| record.required.clone())
    }

    /// Live instance of a unit
    pub fn get(&self, name: &str) -> Result<Instance> {
        Ok(self.core.state().registry.get(name)?)
    }

    pub fn get_as<T: Injectable>(&self, name: &str) -> Result<Arc<T>> {
        let instance = self.get(name)?;
        instance.downcast::<T>().ok_or_else(|| {
            RegistryError::DowncastFailed {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
                actual: instance.type_name(),
            }
            .into()
        })
    }

    /// Start thread `id` over every registered unit
    pub async fn start(&self, id: ThreadId) -> Result<Thread> {
        ThreadManager::new(&self.core).start(Some(id), None).await
    }

    /// Start thread `id` over `names` and everything they hard-depend on
    pub async fn start_units<S: AsRef<str>>(&self, id: ThreadId, names: &[S]) -> Result<Thread> {
        ThreadManager::new(&self.core)
            .start(Some(id), Some(to_names(names)))
            .await
    }

    /// Start a thread under the next free id
    pub async fn spawn<S: AsRef<str>>(&self, names: Option<&[S]>) -> Result<Thread> {
        ThreadManager::new(&self.core)
            .start(None, names.map(to_names))
            .await
    }

    /// Stop a running thread
    pub async fn stop(&self, id: ThreadId) -> Result<()> {
        ThreadManager::new(&self.core).stop(id).await
    }

    /// Stop every running thread, newest first. Returns the first failure.
    pub async fn stop_all(&self) -> Result<()> {
        let mut first_failure = None;
        for id in self.active_threads().into_iter().rev() {
            if let Err(err) = self.stop(id).await {
                first_failure.get_or_insert(err);
            }
        }
        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Run `body` against every registered unit inside a short-lived thread
    pub async fn run<F, Fut, T>(&self, body: F) -> Result<T>
    where
        F: FnOnce(Scope) -> Fut,
        Fut: Future<Output = std::result::Result<T, DynError>>,
    {
        ThreadManager::new(&self.core).run(None, body).await
    }

    /// Run `body` against `names` inside a short-lived thread
    pub async fn run_units<S, F, Fut, T>(&self, names: &[S], body: F) -> Result<T>
    where
        S: AsRef<str>,
        F: FnOnce(Scope) -> Fut,
        Fut: Future<Output = std::result::Result<T, DynError>>,
    {
        ThreadManager::new(&self.core)
            .run(Some(to_names(names)), body)
            .await
    }
}

fn to_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    names.iter().map(|name| name.as_ref().to_string()).collect()
}

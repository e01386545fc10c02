//! # Singular Lifecycle Engine
//!
//! Drives the sequential start and stop of an ordered list of units.
//!
//! Units are processed strictly one at a time: the state lock is taken to
//! inspect and update the registry, released while the unit's start or stop
//! call runs, and taken again to record the outcome. The caller holds the
//! engine's sequencer for the whole sequence, so sequences of different
//! threads never interleave.
//!
//! Reference counting lives here. A unit that is already running only has
//! its count bumped on start and decremented on stop; its start and stop
//! calls run once, for the first and the last thread holding it.
pub mod error;

use std::sync::Arc;

pub use error::LifecycleError;

use crate::config::{ConfigData, StopPolicy};
use crate::event::LifecycleEvent;
use crate::kernel::engine::EngineCore;
use crate::kernel::error::DynError;
use crate::registry::RegistryError;
use crate::scope::{EngineHandle, LocalScope, build_local_scope};
use crate::unit::{Exports, Instance, UnitDescriptor};

/// What a start step has to do for one unit
enum StartStep {
    /// Already running for another thread
    Shared(usize),
    /// Needs its start call
    Launch {
        descriptor: UnitDescriptor,
        config: ConfigData,
        scope: LocalScope,
        exports: Exports,
        placeholder: Instance,
    },
}

/// What a stop step has to do for one unit
enum StopStep {
    /// Nothing to release
    Skip,
    /// Still held by other threads
    Release(usize),
    /// Last holder, needs its stop call
    Shutdown {
        descriptor: UnitDescriptor,
        config: ConfigData,
        scope: LocalScope,
        instance: Instance,
    },
}

pub(crate) struct LifecycleEngine<'a> {
    core: &'a Arc<EngineCore>,
}

impl<'a> LifecycleEngine<'a> {
    pub(crate) fn new(core: &'a Arc<EngineCore>) -> Self {
        Self { core }
    }

    fn policy(&self) -> StopPolicy {
        self.core.config.stop_policy
    }

    /// Start `order` and undo every step taken if one of them fails.
    ///
    /// Returns the units this attempt touched. On failure the original start
    /// error is returned unless the rollback fails too, in which case a
    /// [`LifecycleError::RollbackFailure`] carries both.
    pub(crate) async fn start_with_rollback(
        &self,
        order: &[String],
    ) -> Result<Vec<String>, LifecycleError> {
        let mut ready = Vec::with_capacity(order.len());
        let original = match self.start_sequence(order, &mut ready).await {
            Ok(()) => return Ok(ready),
            Err(err) => err,
        };

        log::warn!(
            "Start failed at unit '{}', rolling back {} unit(s)",
            original.unit(),
            ready.len()
        );
        let rollback: Vec<String> = ready.into_iter().rev().collect();
        match self.stop_sequence(&rollback).await {
            Ok(()) => Err(original),
            Err(rollback) => {
                log::error!("Rollback failed: {}", rollback);
                Err(LifecycleError::RollbackFailure {
                    rollback: Box::new(rollback),
                    original: Box::new(original),
                })
            }
        }
    }

    /// Start every unit of `order` in turn, appending each one touched to
    /// `ready`. Stops at the first failing unit.
    pub(crate) async fn start_sequence(
        &self,
        order: &[String],
        ready: &mut Vec<String>,
    ) -> Result<(), LifecycleError> {
        for name in order {
            match self.prepare_start(name)? {
                StartStep::Shared(ref_count) => {
                    log::debug!("Unit '{}' already running, now {} references", name, ref_count);
                }
                StartStep::Launch {
                    descriptor,
                    config,
                    scope,
                    exports,
                    placeholder,
                } => {
                    log::debug!("Starting unit '{}'", name);
                    let result = descriptor.unit().start(&config, &scope, &exports).await;
                    let instance = self.finish_start(name, result.map(|i| i.unwrap_or(placeholder)))?;
                    self.core
                        .events
                        .dispatch(&LifecycleEvent::UnitStarted {
                            name: name.clone(),
                            instance,
                        })
                        .await;
                }
            }
            ready.push(name.clone());
        }
        Ok(())
    }

    fn prepare_start(&self, name: &str) -> Result<StartStep, LifecycleError> {
        let handle = EngineHandle::new(self.core);
        let mut state = self.core.state();
        let registry = &mut state.registry;

        let entry = registry
            .entry_mut(name)
            .ok_or_else(|| LifecycleError::start_failure(name, RegistryError::UnknownUnit(name.to_string())))?;
        if entry.ref_count > 0 {
            entry.ref_count += 1;
            return Ok(StartStep::Shared(entry.ref_count));
        }
        let descriptor = entry.descriptor.clone();
        let config = entry.config.clone();

        let scope = build_local_scope(registry, name, handle).map_err(|err| {
            log::error!("Cannot build scope of unit '{}': {}", name, err);
            LifecycleError::start_failure(name, err)
        })?;

        // Visible to weak peers while the start call runs
        let exports = Exports::new();
        let placeholder = Instance::new(exports.clone());
        if let Some(entry) = registry.entry_mut(name) {
            entry.instance = Some(placeholder.clone());
        }

        Ok(StartStep::Launch {
            descriptor,
            config,
            scope,
            exports,
            placeholder,
        })
    }

    fn finish_start(
        &self,
        name: &str,
        result: Result<Instance, DynError>,
    ) -> Result<Instance, LifecycleError> {
        let mut state = self.core.state();
        let entry = state.registry.entry_mut(name);
        match (result, entry) {
            (Ok(instance), Some(entry)) => {
                entry.instance = Some(instance.clone());
                entry.ref_count = 1;
                Ok(instance)
            }
            (Ok(_), None) => Err(LifecycleError::start_failure(
                name,
                RegistryError::UnknownUnit(name.to_string()),
            )),
            (Err(source), entry) => {
                if let Some(entry) = entry.filter(|entry| entry.ref_count == 0) {
                    entry.instance = None;
                }
                log::error!("Unit '{}' failed to start: {}", name, source);
                Err(LifecycleError::start_failure(name, source))
            }
        }
    }

    /// Stop every unit of `order` in turn (already in stop order).
    ///
    /// Under [`StopPolicy::Halt`] the first failing stop call ends the
    /// sequence and the failing unit and every later one keep running. Under
    /// [`StopPolicy::Continue`] the failing unit is released anyway, the
    /// remaining units are stopped and the first failure is returned at the
    /// end.
    pub(crate) async fn stop_sequence(&self, order: &[String]) -> Result<(), LifecycleError> {
        let policy = self.policy();
        let mut first_failure = None;

        for name in order {
            let (descriptor, config, scope, instance) = match self.prepare_stop(name) {
                Ok(StopStep::Skip) => continue,
                Ok(StopStep::Release(ref_count)) => {
                    log::debug!("Released unit '{}', {} references left", name, ref_count);
                    continue;
                }
                Ok(StopStep::Shutdown {
                    descriptor,
                    config,
                    scope,
                    instance,
                }) => (descriptor, config, scope, instance),
                Err(err) => match policy {
                    StopPolicy::Halt => return Err(err),
                    StopPolicy::Continue => {
                        self.release(name);
                        first_failure.get_or_insert(err);
                        continue;
                    }
                },
            };

            log::debug!("Stopping unit '{}'", name);
            match descriptor.unit().stop(&config, &scope, &instance).await {
                Ok(()) => {
                    self.release(name);
                    self.core
                        .events
                        .dispatch(&LifecycleEvent::UnitStopped { name: name.clone() })
                        .await;
                }
                Err(source) => {
                    log::error!("Unit '{}' failed to stop: {}", name, source);
                    let err = LifecycleError::stop_failure(name, source);
                    match policy {
                        StopPolicy::Halt => return Err(err),
                        StopPolicy::Continue => {
                            log::warn!("Continuing shutdown past unit '{}'", name);
                            self.release(name);
                            first_failure.get_or_insert(err);
                        }
                    }
                }
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn prepare_stop(&self, name: &str) -> Result<StopStep, LifecycleError> {
        let handle = EngineHandle::new(self.core);
        let mut state = self.core.state();
        let registry = &mut state.registry;

        let Some(entry) = registry.entry_mut(name) else {
            log::warn!("Unit '{}' vanished from the registry before stopping", name);
            return Ok(StopStep::Skip);
        };
        match entry.ref_count {
            0 => return Ok(StopStep::Skip),
            1 => {}
            _ => {
                entry.ref_count -= 1;
                return Ok(StopStep::Release(entry.ref_count));
            }
        }
        let Some(instance) = entry.instance.clone() else {
            entry.ref_count = 0;
            return Ok(StopStep::Skip);
        };
        let descriptor = entry.descriptor.clone();
        let config = entry.config.clone();

        let scope = build_local_scope(registry, name, handle).map_err(|err| {
            log::error!("Cannot build scope of unit '{}': {}", name, err);
            LifecycleError::stop_failure(name, err)
        })?;

        Ok(StopStep::Shutdown {
            descriptor,
            config,
            scope,
            instance,
        })
    }

    fn release(&self, name: &str) {
        if let Some(entry) = self.core.state().registry.entry_mut(name) {
            entry.release();
        }
    }
}

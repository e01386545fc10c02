use std::future::Future;
use std::sync::Arc;

use crate::event::LifecycleEvent;
use crate::kernel::engine::EngineCore;
use crate::kernel::error::{DynError, Error, Result};
use crate::lifecycle::LifecycleEngine;
use crate::registry::RegistryError;
use crate::scope::Scope;
use crate::thread::{Thread, ThreadError, ThreadId, ThreadRecord};

/// Starts, stops and runs threads on behalf of the engine
pub(crate) struct ThreadManager<'a> {
    core: &'a Arc<EngineCore>,
}

impl<'a> ThreadManager<'a> {
    pub(crate) fn new(core: &'a Arc<EngineCore>) -> Self {
        Self { core }
    }

    /// Start a thread over `required` (every registered unit when `None`).
    ///
    /// Without an explicit id the next free one is allocated.
    pub(crate) async fn start(
        &self,
        id: Option<ThreadId>,
        required: Option<Vec<String>>,
    ) -> Result<Thread> {
        let _sequence = self.core.sequencer.lock().await;
        let all = required.is_none();

        let (id, required, order) = {
            let mut state = self.core.state();
            if let Some(id) = id.filter(|id| state.threads.contains(*id)) {
                return Err(ThreadError::Conflict(id).into());
            }
            let required = match required {
                Some(names) => {
                    if let Some(unknown) = names.iter().find(|name| !state.registry.contains(name)) {
                        return Err(RegistryError::UnknownUnit(unknown.clone()).into());
                    }
                    names
                }
                None => state.registry.names(),
            };
            // Only a request that can run consumes an id
            let id = match id {
                Some(id) => id,
                None => state.threads.allocate_id(),
            };
            let order = state.registry.order_for(&required);
            (id, required, order)
        };

        log::info!("Starting thread {} ({} unit(s))", id, order.len());
        LifecycleEngine::new(self.core)
            .start_with_rollback(&order)
            .await?;

        let scope = {
            let mut state = self.core.state();
            state.threads.insert(ThreadRecord {
                id,
                required: required.clone(),
                order: order.clone(),
            });
            if all {
                state.registry.live_scope()
            } else {
                state.registry.scope_for(&required)
            }
        };

        self.core
            .events
            .dispatch(&LifecycleEvent::Started {
                thread: id,
                units: required.clone(),
            })
            .await;
        log::info!("Thread {} started", id);

        Ok(Thread {
            id,
            required,
            order,
            scope: Scope::new(scope),
        })
    }

    /// Stop a thread, releasing its units in reverse start order.
    ///
    /// The thread is forgotten even when a stop call fails.
    pub(crate) async fn stop(&self, id: ThreadId) -> Result<()> {
        let _sequence = self.core.sequencer.lock().await;

        let record = self
            .core
            .state()
            .threads
            .remove(id)
            .ok_or(ThreadError::NotFound(id))?;

        log::info!("Stopping thread {}", id);
        let reversed: Vec<String> = record.order.iter().rev().cloned().collect();
        let result = LifecycleEngine::new(self.core).stop_sequence(&reversed).await;

        self.core
            .events
            .dispatch(&LifecycleEvent::Stopped {
                thread: id,
                success: result.is_ok(),
            })
            .await;
        match &result {
            Ok(()) => log::info!("Thread {} stopped", id),
            Err(err) => log::error!("Thread {} stopped with error: {}", id, err),
        }
        result.map_err(Error::from)
    }

    /// Start a thread, hand its scope to `body`, then stop the thread whatever
    /// `body` returned.
    ///
    /// A failing `body` wins over a failing stop; the stop failure is logged.
    pub(crate) async fn run<F, Fut, T>(&self, required: Option<Vec<String>>, body: F) -> Result<T>
    where
        F: FnOnce(Scope) -> Fut,
        Fut: Future<Output = std::result::Result<T, DynError>>,
    {
        let thread = self.start(None, required).await?;
        let id = thread.id();
        let outcome = body(thread.into_scope()).await;
        let stopped = self.stop(id).await;

        match (outcome, stopped) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), stopped) => {
                if let Err(stop_err) = stopped {
                    log::error!("Thread {} failed to stop after its body failed: {}", id, stop_err);
                }
                Err(Error::Custom(err))
            }
        }
    }
}

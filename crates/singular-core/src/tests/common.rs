//! Shared fixtures for unit and integration tests
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::ConfigData;
use crate::kernel::error::DynError;
use crate::scope::LocalScope;
use crate::unit::{Exports, Instance, Unit, UnitBuilder, UnitDependency, UnitDescriptor};

/// Ordered record of lifecycle calls, e.g. `start:a`, `stop:a`
pub(crate) type Tracker = Arc<Mutex<Vec<String>>>;

pub(crate) fn tracker() -> Tracker {
    Arc::new(Mutex::new(Vec::new()))
}

pub(crate) fn entries(tracker: &Tracker) -> Vec<String> {
    tracker.lock().unwrap().clone()
}

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn with_deps(deps: &[&str]) -> UnitBuilder {
    deps.iter()
        .fold(UnitBuilder::new(), |builder, dep| builder.depends_on(dep))
}

fn record_stop(builder: UnitBuilder, name: &str, tracker: &Tracker) -> UnitBuilder {
    let tracker = tracker.clone();
    let name = name.to_string();
    builder.on_stop(move |_config, _scope, _instance| {
        let tracker = tracker.clone();
        let name = name.clone();
        async move {
            tracker.lock().unwrap().push(format!("stop:{}", name));
            Ok::<_, DynError>(())
        }
    })
}

/// Unit that records its calls; its instance is its own name
pub(crate) fn tracked(name: &str, deps: &[&str], tracker: &Tracker) -> UnitDescriptor {
    let start_tracker = tracker.clone();
    let start_name = name.to_string();
    let builder = with_deps(deps).on_start(move |_config, _scope, _exports| {
        let tracker = start_tracker.clone();
        let name = start_name.clone();
        async move {
            tracker.lock().unwrap().push(format!("start:{}", name));
            Ok::<_, DynError>(Some(Instance::new(name)))
        }
    });
    record_stop(builder, name, tracker).build()
}

/// Unit whose start call always fails
pub(crate) fn failing(name: &str, deps: &[&str], tracker: &Tracker) -> UnitDescriptor {
    let start_tracker = tracker.clone();
    let start_name = name.to_string();
    let builder = with_deps(deps).on_start(move |_config, _scope, _exports| {
        let tracker = start_tracker.clone();
        let name = start_name.clone();
        async move {
            tracker.lock().unwrap().push(format!("start:{}", name));
            Err::<Option<Instance>, DynError>(format!("{} refused to start", name).into())
        }
    });
    record_stop(builder, name, tracker).build()
}

/// Unit that starts fine but whose stop call always fails
pub(crate) fn failing_stop(name: &str, deps: &[&str], tracker: &Tracker) -> UnitDescriptor {
    let start_tracker = tracker.clone();
    let stop_tracker = tracker.clone();
    let start_name = name.to_string();
    let stop_name = name.to_string();
    with_deps(deps)
        .on_start(move |_config, _scope, _exports| {
            let tracker = start_tracker.clone();
            let name = start_name.clone();
            async move {
                tracker.lock().unwrap().push(format!("start:{}", name));
                Ok::<_, DynError>(Some(Instance::new(name)))
            }
        })
        .on_stop(move |_config, _scope, _instance| {
            let tracker = stop_tracker.clone();
            let name = stop_name.clone();
            async move {
                tracker.lock().unwrap().push(format!("stop:{}", name));
                Err::<(), DynError>(format!("{} refused to stop", name).into())
            }
        })
        .build()
}

/// Unit counting how often its start and stop calls run
#[derive(Default)]
pub(crate) struct CountingUnit {
    pub(crate) deps: Vec<UnitDependency>,
    pub(crate) starts: Arc<AtomicUsize>,
    pub(crate) stops: Arc<AtomicUsize>,
    /// Yield to the runtime inside start, to let other tasks interleave
    pub(crate) pause: bool,
}

impl CountingUnit {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub(crate) fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Counters that keep working after the unit is moved into a descriptor
    pub(crate) fn counters(&self) -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        (self.starts.clone(), self.stops.clone())
    }
}

#[async_trait]
impl Unit for CountingUnit {
    fn dependencies(&self) -> Vec<UnitDependency> {
        self.deps.clone()
    }

    async fn start(
        &self,
        _config: &ConfigData,
        _scope: &LocalScope,
        _exports: &Exports,
    ) -> Result<Option<Instance>, DynError> {
        if self.pause {
            tokio::task::yield_now().await;
        }
        let n = self.starts.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Some(Instance::new(n)))
    }

    async fn stop(
        &self,
        _config: &ConfigData,
        _scope: &LocalScope,
        _instance: &Instance,
    ) -> Result<(), DynError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ConfigData;
use crate::kernel::error::DynError;
use crate::scope::LocalScope;
use crate::unit::{Exports, Injectable, Instance, Unit, UnitDependency, UnitDescriptor};

/// Owned future returned by unit closures
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

type StartFn =
    Arc<dyn Fn(ConfigData, LocalScope, Exports) -> BoxFuture<Result<Option<Instance>, DynError>> + Send + Sync>;
type StopFn = Arc<dyn Fn(ConfigData, LocalScope, Instance) -> BoxFuture<Result<(), DynError>> + Send + Sync>;

/// Compose a unit from closures instead of implementing [`Unit`] by hand.
///
/// ```ignore
/// let b = UnitBuilder::new()
///     .depends_on("a")
///     .on_start(|_config, scope, _exports| async move {
///         let a = scope.get_as::<i64>("a")?;
///         Ok::<_, DynError>(Some(Instance::new(*a + 1)))
///     })
///     .build();
/// ```
#[derive(Default)]
pub struct UnitBuilder {
    dependencies: Vec<UnitDependency>,
    aliases: Vec<(String, String)>,
    defaults: ConfigData,
    start: Option<StartFn>,
    stop: Option<StopFn>,
}

impl UnitBuilder {
    pub fn new() -> Self {
        <Self as Default>::default()
    }

    /// Add a hard dependency
    pub fn depends_on(mut self, name: &str) -> Self {
        self.dependencies.push(UnitDependency::hard(name));
        self
    }

    /// Add a weak dependency
    pub fn weakly_depends_on(mut self, name: &str) -> Self {
        self.dependencies.push(UnitDependency::weak(name));
        self
    }

    /// Resolve the local alias `alias` to the registered unit `target`
    pub fn alias(mut self, alias: &str, target: &str) -> Self {
        self.aliases.push((alias.to_string(), target.to_string()));
        self
    }

    /// Set a default configuration value
    pub fn default(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.defaults.insert(key, value.into());
        self
    }

    pub fn defaults(mut self, defaults: ConfigData) -> Self {
        self.defaults.merge(&defaults);
        self
    }

    pub fn on_start<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ConfigData, LocalScope, Exports) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Instance>, DynError>> + Send + 'static,
    {
        let start: StartFn = Arc::new(move |config: ConfigData, scope: LocalScope, exports: Exports| {
            Box::pin(f(config, scope, exports)) as BoxFuture<_>
        });
        self.start = Some(start);
        self
    }

    pub fn on_stop<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ConfigData, LocalScope, Instance) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), DynError>> + Send + 'static,
    {
        let stop: StopFn = Arc::new(move |config: ConfigData, scope: LocalScope, instance: Instance| {
            Box::pin(f(config, scope, instance)) as BoxFuture<_>
        });
        self.stop = Some(stop);
        self
    }

    pub fn build(self) -> UnitDescriptor {
        let aliases = self.aliases;
        let unit = FnUnit {
            dependencies: self.dependencies,
            defaults: self.defaults,
            start: self.start,
            stop: self.stop,
        };
        aliases
            .iter()
            .fold(UnitDescriptor::new(unit), |descriptor, (alias, target)| {
                descriptor.with_layout(alias, target)
            })
    }
}

/// Unit backed by closures, produced by [`UnitBuilder`]
struct FnUnit {
    dependencies: Vec<UnitDependency>,
    defaults: ConfigData,
    start: Option<StartFn>,
    stop: Option<StopFn>,
}

#[async_trait]
impl Unit for FnUnit {
    fn dependencies(&self) -> Vec<UnitDependency> {
        self.dependencies.clone()
    }

    fn defaults(&self) -> ConfigData {
        self.defaults.clone()
    }

    async fn start(
        &self,
        config: &ConfigData,
        scope: &LocalScope,
        exports: &Exports,
    ) -> Result<Option<Instance>, DynError> {
        match &self.start {
            Some(start) => start(config.clone(), scope.clone(), exports.clone()).await,
            None => Ok(None),
        }
    }

    async fn stop(
        &self,
        config: &ConfigData,
        scope: &LocalScope,
        instance: &Instance,
    ) -> Result<(), DynError> {
        match &self.stop {
            Some(stop) => stop(config.clone(), scope.clone(), instance.clone()).await,
            None => Ok(()),
        }
    }
}

/// Zero-dependency unit whose start returns a fixed value
#[derive(Debug, Clone)]
pub struct ValueUnit {
    value: Instance,
}

impl ValueUnit {
    pub fn new<T: Injectable>(value: T) -> Self {
        Self::from_instance(Instance::new(value))
    }

    pub fn from_instance(value: Instance) -> Self {
        Self { value }
    }
}

#[async_trait]
impl Unit for ValueUnit {
    async fn start(
        &self,
        _config: &ConfigData,
        _scope: &LocalScope,
        _exports: &Exports,
    ) -> Result<Option<Instance>, DynError> {
        Ok(Some(self.value.clone()))
    }
}

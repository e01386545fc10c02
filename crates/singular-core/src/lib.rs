//! # Singular Core
//!
//! A dependency injection and lifecycle orchestration kernel. Named units
//! declare dependencies on other units and a start/stop lifecycle; the kernel
//! orders them, starts them on behalf of reference-counted threads, wires each
//! unit's dependencies into a local scope and tears everything down again in
//! reverse, rolling back partially started threads on failure.
pub mod config;
pub mod event;
pub mod graph;
pub mod kernel;
pub mod lifecycle;
pub mod registry;
pub mod scope;
pub mod thread;
pub mod unit;

pub use config::{ConfigData, ConfigError, ConfigFormat, EngineConfig, StopPolicy};
pub use event::{Event, EventResult, LifecycleEvent, SharedEventDispatcher};
pub use graph::{DependencyGraph, GraphError, compute_order};
pub use kernel::error::{DynError, Error, Result};
pub use kernel::{Singular, SingularBuilder};
pub use lifecycle::LifecycleError;
pub use registry::{Registration, RegistryError};
pub use scope::{EngineHandle, LazyInstance, LocalScope, Scope};
pub use thread::{Thread, ThreadError, ThreadId};
pub use unit::{Exports, Instance, Unit, UnitBuilder, UnitDependency, UnitDescriptor, ValueUnit};

#[cfg(test)]
mod tests;

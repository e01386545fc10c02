//! # Singular Units
//!
//! The contract between the kernel and the components it manages.
//!
//! A unit declares its dependencies ([`UnitDependency`], hard or weak), its
//! default configuration and an asynchronous start/stop lifecycle ([`Unit`]).
//! At registration it is wrapped in a [`UnitDescriptor`], which adds the
//! layout mapping each local dependency alias to a registered unit name.
//! [`UnitBuilder`] composes a unit from closures and [`ValueUnit`] turns a
//! literal into a zero-dependency unit.
pub mod builder;
pub mod dependency;
pub mod descriptor;
pub mod instance;
pub mod traits;

pub use builder::{UnitBuilder, ValueUnit};
pub use dependency::UnitDependency;
pub use descriptor::UnitDescriptor;
pub use instance::{Exports, Injectable, Instance};
pub use traits::Unit;

//! # Singular Kernel
//!
//! The engine facade and the crate-wide plumbing.
//!
//! - [`Singular`] (in `engine`) owns the registry, the thread table and the
//!   event dispatcher, and exposes registration, thread start/stop/run and
//!   introspection.
//! - [`SingularBuilder`] (in `builder`) assembles an engine from units,
//!   literal values and configuration in one validated batch.
//! - `constants` holds the reserved self name and crate metadata.
//! - `error` defines [`Error`](error::Error) and [`Result`](error::Result).
pub mod builder;
pub mod constants;
pub mod engine;
pub mod error;

pub use builder::SingularBuilder;
pub use engine::Singular;
pub use error::{Error, Result};

use thiserror::Error;

/// Errors raised while building the dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A layout entry points at a unit that is not registered
    #[error("Unknown dependency '{dependency}' of unit '{unit}'")]
    UnknownDependency { unit: String, dependency: String },

    /// Hard dependencies form a cycle. The path repeats its first unit at the end.
    #[error("Cyclic dependency detected: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),
}

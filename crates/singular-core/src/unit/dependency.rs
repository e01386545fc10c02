/// A dependency declared by a unit, by local alias
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitDependency {
    /// Local alias; resolves to a unit of the same name unless the layout
    /// points it elsewhere
    pub name: String,
    /// Hard dependencies order startup and take part in cycle detection.
    /// Weak ones are only looked up.
    pub required: bool,
}

impl UnitDependency {
    pub fn new(name: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            required,
        }
    }

    /// Create a hard dependency
    pub fn hard(name: &str) -> Self {
        Self::new(name, true)
    }

    /// Create a weak dependency
    pub fn weak(name: &str) -> Self {
        Self::new(name, false)
    }

    pub fn is_weak(&self) -> bool {
        !self.required
    }
}

impl std::fmt::Display for UnitDependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.required {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} (weak)", self.name)
        }
    }
}

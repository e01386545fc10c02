use std::any::{Any, type_name};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Anything stored in the registry must be shareable across tasks
pub trait Injectable: Any + Send + Sync {}
impl<T: Any + Send + Sync> Injectable for T {}

/// Type-erased live value of a started unit
#[derive(Clone)]
pub struct Instance {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    pub fn new<T: Injectable>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc<T: Injectable>(value: Arc<T>) -> Self {
        Self {
            type_name: type_name::<T>(),
            value,
        }
    }

    /// Name of the concrete type stored in this instance
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Injectable>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast<T: Injectable>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    pub fn downcast_ref<T: Injectable>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Whether both handles point at the same value
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Mutable property bag handed to a unit's start call.
///
/// The engine stores the bag in the registry before the call, so peers with a
/// weak dependency on the unit can already see it. A unit whose start returns
/// no instance is represented by this bag for the rest of its life.
#[derive(Clone, Default)]
pub struct Exports {
    entries: Arc<RwLock<BTreeMap<String, Instance>>>,
}

impl Exports {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Instance>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Instance>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish a value under `key`, replacing any previous one
    pub fn set<T: Injectable>(&self, key: &str, value: T) {
        self.set_instance(key, Instance::new(value));
    }

    pub fn set_instance(&self, key: &str, instance: Instance) {
        self.write().insert(key.to_string(), instance);
    }

    pub fn get<T: Injectable>(&self, key: &str) -> Option<Arc<T>> {
        self.instance(key).and_then(|instance| instance.downcast::<T>())
    }

    pub fn instance(&self, key: &str) -> Option<Instance> {
        self.read().get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<Instance> {
        self.write().remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Whether both handles share the same bag
    pub fn ptr_eq(&self, other: &Exports) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl fmt::Debug for Exports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exports").field("keys", &self.keys()).finish()
    }
}

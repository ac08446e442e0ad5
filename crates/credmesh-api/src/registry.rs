//! The process-wide lifecycle registry (spec §5).
//!
//! `spec.md` mandates exactly one piece of global mutable state: a registry
//! of `{canonical_serializer, crypto_provider, log_store, memory_graph,
//! credibility_scorer}` initialized at boot and torn down at shutdown. Rather
//! than have this crate depend on every concrete component (which would
//! create a dependency cycle, since those crates depend on `credmesh-api`
//! for its error types), the registry is a typed slot map keyed by a
//! `&'static str` name and downcast via [`std::any::Any`]. `credmesh-node`
//! is the only crate that populates it, using the concrete types from every
//! component crate.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A boot-time-populated, shutdown-torn-down registry of process singletons.
///
/// No other global mutable state is permitted anywhere in the workspace
/// (spec §5); every other piece of state must be threaded explicitly through
/// constructors.
#[derive(Default)]
pub struct LifecycleRegistry {
    slots: RwLock<HashMap<&'static str, Arc<dyn Any + Send + Sync>>>,
}

impl LifecycleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a singleton under `name`. Overwrites any prior value,
    /// which is how hot key-rotation of the crypto provider is modeled.
    pub fn register<T: Send + Sync + 'static>(&self, name: &'static str, value: Arc<T>) {
        let mut slots = self
            .slots
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.insert(name, value as Arc<dyn Any + Send + Sync>);
    }

    /// Looks up a singleton by name, returning `None` if absent or if the
    /// stored type does not match `T`.
    pub fn get<T: Send + Sync + 'static>(&self, name: &'static str) -> Option<Arc<T>> {
        let slots = self
            .slots
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.get(name).and_then(|v| v.clone().downcast::<T>().ok())
    }

    /// Removes every registered singleton. Called once at process shutdown.
    pub fn shutdown(&self) {
        let mut slots = self
            .slots
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Canonical slot names for the five singletons spec §5 requires.
pub mod slots {
    pub const CANONICAL_SERIALIZER: &str = "canonical_serializer";
    pub const CRYPTO_PROVIDER: &str = "crypto_provider";
    pub const LOG_STORE: &str = "log_store";
    pub const MEMORY_GRAPH: &str = "memory_graph";
    pub const CREDIBILITY_SCORER: &str = "credibility_scorer";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_get_roundtrip() {
        let reg = LifecycleRegistry::new();
        reg.register("thing", Arc::new(42u32));
        assert_eq!(*reg.get::<u32>("thing").unwrap(), 42);
        assert!(reg.get::<String>("thing").is_none());
    }

    #[test]
    fn shutdown_clears_everything() {
        let reg = LifecycleRegistry::new();
        reg.register("a", Arc::new(1u32));
        reg.register("b", Arc::new("x".to_string()));
        assert_eq!(reg.len(), 2);
        reg.shutdown();
        assert!(reg.is_empty());
    }

    #[test]
    fn re_register_overwrites_for_key_rotation() {
        let reg = LifecycleRegistry::new();
        reg.register("key", Arc::new(1u32));
        reg.register("key", Arc::new(2u32));
        assert_eq!(*reg.get::<u32>("key").unwrap(), 2);
    }
}

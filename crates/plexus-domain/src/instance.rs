//! Type-erased capability instances and resolved dependency maps

use crate::error::{Error, Result};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A constructed capability instance
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Wrap a value as an [`Instance`]
pub fn instance<T: Any + Send + Sync>(value: T) -> Instance {
    Arc::new(value)
}

/// Named dependencies handed to a module initializer or a service factory
///
/// Names are the logical names declared by the consumer, not capability ids.
#[derive(Clone, Default)]
pub struct ResolvedDeps {
    entries: BTreeMap<String, Instance>,
}

impl ResolvedDeps {
    /// Create an empty dependency map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resolved dependency under its logical name
    pub fn insert(&mut self, name: impl Into<String>, instance: Instance) {
        self.entries.insert(name.into(), instance);
    }

    /// Typed access to a dependency
    ///
    /// Fails with [`Error::DependencyMismatch`] when the name is unknown or the
    /// instance is not a `T`.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        self.entries
            .get(name)
            .cloned()
            .and_then(|instance| instance.downcast::<T>().ok())
            .ok_or_else(|| Error::DependencyMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Untyped access to a dependency
    pub fn raw(&self, name: &str) -> Option<&Instance> {
        self.entries.get(name)
    }

    /// Whether a dependency with this name was resolved
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Dependency names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of resolved dependencies
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no dependency was resolved
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ResolvedDeps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedDeps")
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

//! Watcher Registry

use std::rc::Rc;

use indexmap::IndexMap;

use crate::Value;

/// Change callback, called with `(new, old)`
pub type Watcher = Rc<dyn Fn(&Value, &Value)>;

/// Ordered callbacks per property
#[derive(Default)]
pub struct WatcherRegistry {
    by_property: IndexMap<String, Vec<Watcher>>,
}

impl std::fmt::Debug for WatcherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.by_property.iter().map(|(k, v)| (k, v.len())))
            .finish()
    }
}

impl WatcherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, property: &str, watcher: Watcher) {
        self.by_property.entry(property.to_string()).or_default().push(watcher);
    }

    /// Snapshot of a property's watchers, in registration order.
    /// Callers invoke the snapshot after releasing the registry.
    pub fn watchers_for(&self, property: &str) -> Vec<Watcher> {
        self.by_property.get(property).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_property.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_property.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_property.clear();
    }
}

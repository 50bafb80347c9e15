//! Extension Registry
//!
//! Attribute name to a setup-time handler. Each handler runs once per
//! element carrying the attribute.

use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;

use fos_dom::NodeId;

use crate::Reactive;

/// Handler called with `(element, attribute value, state)`
pub type ExtensionHandler = Rc<dyn Fn(NodeId, &str, &Reactive) -> anyhow::Result<()>>;

/// Registered extensions plus the elements they already ran on
#[derive(Default)]
pub struct ExtensionRegistry {
    handlers: IndexMap<String, ExtensionHandler>,
    applied: HashSet<(String, NodeId)>,
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("attributes", &self.handlers.keys().collect::<Vec<_>>())
            .field("applied", &self.applied.len())
            .finish()
    }
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler; a later registration for the same attribute wins
    pub fn register(&mut self, attribute: &str, handler: ExtensionHandler) {
        self.handlers.insert(attribute.to_string(), handler);
    }

    pub fn get(&self, attribute: &str) -> Option<ExtensionHandler> {
        self.handlers.get(attribute).cloned()
    }

    /// Snapshot of all handlers in registration order
    pub fn entries(&self) -> Vec<(String, ExtensionHandler)> {
        self.handlers
            .iter()
            .map(|(attr, handler)| (attr.clone(), Rc::clone(handler)))
            .collect()
    }

    /// Record an invocation; returns false if `attribute` already ran on `node`
    pub fn mark_applied(&mut self, attribute: &str, node: NodeId) -> bool {
        self.applied.insert((attribute.to_string(), node))
    }

    /// Forget invocations so a later scan runs handlers again
    pub fn reset_applied(&mut self) {
        self.applied.clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

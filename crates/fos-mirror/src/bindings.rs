//! Binding Registry
//!
//! Property name to the DOM update sites that depend on it.

use std::collections::HashSet;

use indexmap::IndexMap;

use fos_dom::NodeId;

/// How a binding writes to its element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Text content, or a re-rendered template when the element has one
    Text,
    /// Form-control value slot
    Model,
}

/// One property -> element edge
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binding {
    pub property: String,
    pub kind: BindingKind,
    pub element: NodeId,
}

impl Binding {
    pub fn text(property: &str, element: NodeId) -> Self {
        Self { property: property.to_string(), kind: BindingKind::Text, element }
    }

    pub fn model(property: &str, element: NodeId) -> Self {
        Self { property: property.to_string(), kind: BindingKind::Model, element }
    }
}

/// Append-only binding table. A property with no bindings has no entry.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    by_property: IndexMap<String, Vec<Binding>>,
    seen: HashSet<Binding>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding; returns false if the identical edge exists
    pub fn register(&mut self, binding: Binding) -> bool {
        if !self.seen.insert(binding.clone()) {
            return false;
        }
        self.by_property
            .entry(binding.property.clone())
            .or_default()
            .push(binding);
        true
    }

    /// Bindings for a property in registration order
    pub fn bindings_for(&self, property: &str) -> &[Binding] {
        self.by_property.get(property).map_or(&[], Vec::as_slice)
    }

    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.by_property.keys().map(String::as_str)
    }

    /// Total number of bindings
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_property.clear();
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_dedupes_identical_edges() {
        let mut registry = BindingRegistry::new();
        assert!(registry.register(Binding::text("name", NodeId::new(1))));
        assert!(!registry.register(Binding::text("name", NodeId::new(1))));
        assert!(registry.register(Binding::model("name", NodeId::new(1))));
        assert!(registry.register(Binding::text("name", NodeId::new(2))));
        assert_eq!(registry.len(), 3);

        let elements: Vec<_> = registry.bindings_for("name").iter().map(|b| b.element).collect();
        assert_eq!(elements, vec![NodeId::new(1), NodeId::new(1), NodeId::new(2)]);
    }

    #[test]
    fn test_unknown_property_has_no_entry() {
        let mut registry = BindingRegistry::new();
        assert!(registry.bindings_for("nope").is_empty());
        registry.register(Binding::text("a", NodeId::new(1)));
        assert_eq!(registry.properties().collect::<Vec<_>>(), vec!["a"]);

        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.properties().count(), 0);
    }
}

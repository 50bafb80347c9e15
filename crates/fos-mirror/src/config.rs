//! Engine configuration

use indexmap::IndexMap;
use serde::Deserialize;

use fos_dom::NodeId;

use crate::MirrorError;

/// Default selector for template containers
pub const DEFAULT_BIND_SELECTOR: &str = ".bind";

/// Default attribute for two-way bound controls
pub const DEFAULT_MODEL_ATTRIBUTE: &str = "m-model";

/// Where the binder starts scanning
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RootTarget {
    /// The document body
    #[default]
    Body,
    /// A specific node
    Node(NodeId),
    /// First element matching a selector, searched from the document node
    Selector(String),
}

/// One explicit `selector -> property` binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDecl {
    pub selector: String,
    pub property: String,
}

impl BindingDecl {
    pub fn new(selector: &str, property: &str) -> Self {
        Self {
            selector: selector.to_string(),
            property: property.to_string(),
        }
    }
}

/// Options for [`Mirror::create`](crate::Mirror::create)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorConfig {
    /// Scan root
    pub root: RootTarget,
    /// Selector marking template containers
    pub bind_selector: String,
    /// Attribute naming the property of a two-way bound control
    pub model_attribute: String,
    /// Explicit bindings, applied in order before the declarative scan
    pub bindings: Vec<BindingDecl>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            root: RootTarget::Body,
            bind_selector: DEFAULT_BIND_SELECTOR.into(),
            model_attribute: DEFAULT_MODEL_ATTRIBUTE.into(),
            bindings: Vec::new(),
        }
    }
}

impl MirrorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan from a specific node
    pub fn root(mut self, node: NodeId) -> Self {
        self.root = RootTarget::Node(node);
        self
    }

    /// Scan from the first element matching `selector`
    pub fn root_selector(mut self, selector: &str) -> Self {
        self.root = RootTarget::Selector(selector.to_string());
        self
    }

    pub fn bind_selector(mut self, selector: &str) -> Self {
        self.bind_selector = selector.to_string();
        self
    }

    pub fn model_attribute(mut self, attribute: &str) -> Self {
        self.model_attribute = attribute.to_string();
        self
    }

    /// Add an explicit binding
    pub fn bind(mut self, selector: &str, property: &str) -> Self {
        self.bindings.push(BindingDecl::new(selector, property));
        self
    }

    /// Read options from JSON.
    ///
    /// ```json
    /// { "root": "#app", "bindSelector": ".bind", "modelAttribute": "m-model",
    ///   "bindings": [{ ".title": "name", "#counter": "count" }] }
    /// ```
    ///
    /// Missing or empty options fall back to the defaults.
    pub fn from_json(text: &str) -> Result<Self, MirrorError> {
        let raw: RawConfig = serde_json::from_str(text)?;
        let defaults = Self::default();

        let non_empty = |value: Option<String>| value.filter(|s| !s.is_empty());

        Ok(Self {
            root: non_empty(raw.root).map_or(RootTarget::Body, RootTarget::Selector),
            bind_selector: non_empty(raw.bind_selector).unwrap_or(defaults.bind_selector),
            model_attribute: non_empty(raw.model_attribute).unwrap_or(defaults.model_attribute),
            bindings: raw
                .bindings
                .into_iter()
                .flat_map(IndexMap::into_iter)
                .map(|(selector, property)| BindingDecl { selector, property })
                .collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default)]
    root: Option<String>,
    #[serde(default)]
    bind_selector: Option<String>,
    #[serde(default)]
    model_attribute: Option<String>,
    #[serde(default)]
    bindings: Vec<IndexMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MirrorConfig::default();
        assert_eq!(config.root, RootTarget::Body);
        assert_eq!(config.bind_selector, ".bind");
        assert_eq!(config.model_attribute, "m-model");
        assert!(config.bindings.is_empty());
    }

    #[test]
    fn test_builder() {
        let config = MirrorConfig::new()
            .root_selector("#app")
            .model_attribute("x-model")
            .bind(".title", "name")
            .bind("#counter", "count");
        assert_eq!(config.root, RootTarget::Selector("#app".into()));
        assert_eq!(config.model_attribute, "x-model");
        assert_eq!(config.bindings[1], BindingDecl::new("#counter", "count"));
    }

    #[test]
    fn test_from_json_keeps_binding_order() {
        let config = MirrorConfig::from_json(
            r##"{"root": "#app", "bindSelector": "", "bindings": [{"#b": "x", "#a": "y"}, {".c": "z"}]}"##,
        )
        .unwrap();
        assert_eq!(config.root, RootTarget::Selector("#app".into()));
        assert_eq!(config.bind_selector, ".bind");
        let selectors: Vec<_> = config.bindings.iter().map(|b| b.selector.as_str()).collect();
        assert_eq!(selectors, vec!["#b", "#a", ".c"]);
    }

    #[test]
    fn test_from_json_empty_object() {
        assert_eq!(MirrorConfig::from_json("{}").unwrap(), MirrorConfig::default());
        assert!(MirrorConfig::from_json("{\"bindings\": 3}").is_err());
    }
}

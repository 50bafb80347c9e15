//! Template Renderer
//!
//! `{{ property }}` placeholders inside captured element content.

use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::{Captures, Regex};

use crate::State;

/// Placeholder pattern: a word-character property name between double
/// braces, surrounding whitespace allowed
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("placeholder pattern is a valid regex")
});

/// Original element content captured at bind time. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    properties: IndexSet<String>,
    has_markup: bool,
}

impl Template {
    /// Capture `source` and index its placeholders
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let properties = PLACEHOLDER
            .captures_iter(&source)
            .map(|caps| caps[1].to_string())
            .collect();
        let has_markup = source.contains('<');
        Self { source, properties, has_markup }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Distinct referenced properties, in first-occurrence order
    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(String::as_str)
    }

    /// Whether the captured content contains nested markup
    pub fn has_markup(&self) -> bool {
        self.has_markup
    }

    /// Expand every placeholder against the whole current state
    pub fn render(&self, state: &State) -> String {
        PLACEHOLDER
            .replace_all(&self.source, |caps: &Captures<'_>| {
                state.get_ref(&caps[1]).map(|v| v.display()).unwrap_or_default()
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_placeholders() {
        let template = Template::parse("Hello, {{ name }}!");
        let state = State::new().with("name", "Ada");
        assert_eq!(template.render(&state), "Hello, Ada!");
        assert!(!template.has_markup());
    }

    #[test]
    fn test_missing_property_renders_empty() {
        let template = Template::parse("Hello, {{ missing }}!");
        assert_eq!(template.render(&State::new()), "Hello, !");
    }

    #[test]
    fn test_distinct_properties_in_order() {
        let template = Template::parse("{{b}} {{ a }} {{b}}{{  c\t}}");
        assert_eq!(template.properties().collect::<Vec<_>>(), vec!["b", "a", "c"]);

        let state = State::new().with("a", 1).with("b", "x");
        assert_eq!(template.render(&state), "x 1 x");
    }

    #[test]
    fn test_not_a_placeholder() {
        let template = Template::parse("{{ two words }} {name} {{}}");
        assert_eq!(template.properties().count(), 0);
        assert_eq!(template.render(&State::new()), "{{ two words }} {name} {{}}");
    }

    #[test]
    fn test_markup_detection() {
        assert!(Template::parse("<b>{{ name }}</b>").has_markup());
        assert!(!Template::parse("a &lt; b").has_markup());
    }
}

//! Inline style declarations
//!
//! `el.style.*` access backed by the element's `style` attribute.

/// Parsed `style` attribute: ordered `property: value` declarations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    /// Parse a `style` attribute. Declarations without a colon are dropped.
    pub fn parse(text: &str) -> Self {
        let declarations = text
            .split(';')
            .filter_map(|decl| {
                let (name, value) = decl.split_once(':')?;
                let name = name.trim().to_ascii_lowercase();
                let value = value.trim();
                if name.is_empty() || value.is_empty() {
                    return None;
                }
                Some((name, value.to_string()))
            })
            .collect();
        Self { declarations }
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, value)| value.as_str())
    }

    /// Set a property. An empty value removes it, like `el.style.x = ''`.
    pub fn set(&mut self, property: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            self.remove(property);
            return;
        }
        match self.declarations.iter_mut().find(|(name, _)| name.eq_ignore_ascii_case(property)) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.declarations.push((property.to_ascii_lowercase(), value.to_string())),
        }
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        let pos = self.declarations.iter().position(|(name, _)| name.eq_ignore_ascii_case(property))?;
        Some(self.declarations.remove(pos).1)
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Serialize back to attribute form
    pub fn to_css_text(&self) -> String {
        self.declarations
            .iter()
            .map(|(name, value)| format!("{name}: {value};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize() {
        let style = InlineStyle::parse("color: red;  margin-top:1rem ; bogus");
        assert_eq!(style.get("color"), Some("red"));
        assert_eq!(style.get("MARGIN-TOP"), Some("1rem"));
        assert_eq!(style.to_css_text(), "color: red; margin-top: 1rem;");
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut style = InlineStyle::parse("display: block; color: red");
        style.set("display", "none");
        assert_eq!(style.to_css_text(), "display: none; color: red;");
    }

    #[test]
    fn test_empty_value_removes() {
        let mut style = InlineStyle::parse("display: none");
        style.set("display", "");
        assert!(style.is_empty());
    }
}

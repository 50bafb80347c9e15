//! Element Query
//!
//! querySelectorAll / matches over the arena tree.
//!
//! Supported grammar: type and universal selectors, `#id`, `.class`,
//! `[attr]`, `[attr=value]` (bare or quoted value), the descendant and
//! child (`>`) combinators, and comma-separated selector lists.

use crate::{DomTree, NodeId};

/// Selector parse failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("invalid selector `{selector}` at offset {offset}: {reason}")]
    Invalid {
        selector: String,
        offset: usize,
        reason: &'static str,
    },
}

/// Simple selector for matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Universal,
    Tag(String),
    Id(String),
    Class(String),
    Attribute { name: String, value: Option<String> },
}

/// Relationship between two compounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
}

/// Sequence of simple selectors applying to one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    pub parts: Vec<SimpleSelector>,
}

/// Compounds joined by combinators; `combinators[i]` sits between
/// `compounds[i]` and `compounds[i + 1]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub compounds: Vec<CompoundSelector>,
    pub combinators: Vec<Combinator>,
}

/// Comma-separated selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub alternatives: Vec<ComplexSelector>,
}

impl Selector {
    /// Parse a selector list
    pub fn parse(text: &str) -> Result<Self, SelectorError> {
        if text.trim().is_empty() {
            return Err(SelectorError::Empty);
        }
        Parser::new(text).parse_list()
    }

    /// Check if an element matches any alternative
    pub fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        self.alternatives.iter().any(|complex| complex.matches(tree, id))
    }
}

impl ComplexSelector {
    pub fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        match self.compounds.len() {
            0 => false,
            n => self.matches_from(tree, id, n - 1),
        }
    }

    fn matches_from(&self, tree: &DomTree, id: NodeId, index: usize) -> bool {
        if !self.compounds[index].matches(tree, id) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => tree
                .parent(id)
                .is_some_and(|parent| self.matches_from(tree, parent, index - 1)),
            Combinator::Descendant => {
                let mut ancestor = tree.parent(id);
                while let Some(candidate) = ancestor {
                    if self.matches_from(tree, candidate, index - 1) {
                        return true;
                    }
                    ancestor = tree.parent(candidate);
                }
                false
            }
        }
    }
}

impl CompoundSelector {
    pub fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        let Some(elem) = tree.element(id) else {
            return false;
        };
        self.parts.iter().all(|part| match part {
            SimpleSelector::Universal => true,
            SimpleSelector::Tag(tag) => elem.tag.eq_ignore_ascii_case(tag),
            SimpleSelector::Id(id) => elem.id() == Some(id.as_str()),
            SimpleSelector::Class(class) => elem.has_class(class),
            SimpleSelector::Attribute { name, value } => match value {
                Some(expected) => elem.get_attr(name) == Some(expected.as_str()),
                None => elem.has_attr(name),
            },
        })
    }
}

impl DomTree {
    /// All elements under `root` (exclusive) matching `selector`, in
    /// document order
    pub fn select(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(root)
            .filter(|&id| selector.matches(self, id))
            .collect()
    }

    /// `root.querySelectorAll(selectors)`
    pub fn query_selector_all(&self, root: NodeId, selectors: &str) -> Result<Vec<NodeId>, SelectorError> {
        let selector = Selector::parse(selectors)?;
        Ok(self.select(root, &selector))
    }

    /// `root.querySelector(selectors)`
    pub fn query_selector(&self, root: NodeId, selectors: &str) -> Result<Option<NodeId>, SelectorError> {
        let selector = Selector::parse(selectors)?;
        Ok(self.descendants(root).find(|&id| selector.matches(self, id)))
    }

    /// `el.matches(selectors)`
    pub fn matches(&self, id: NodeId, selectors: &str) -> Result<bool, SelectorError> {
        Ok(Selector::parse(selectors)?.matches(self, id))
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, chars: source.chars().collect(), pos: 0 }
    }

    fn error(&self, reason: &'static str) -> SelectorError {
        SelectorError::Invalid {
            selector: self.source.to_string(),
            offset: self.pos,
            reason,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Skip whitespace, reporting whether any was consumed
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos != start
    }

    fn parse_list(&mut self) -> Result<Selector, SelectorError> {
        let mut alternatives = Vec::new();
        loop {
            self.skip_ws();
            alternatives.push(self.parse_complex()?);
            self.skip_ws();
            match self.bump() {
                None => break,
                Some(',') => continue,
                Some(_) => return Err(self.error("expected `,`")),
            }
        }
        Ok(Selector { alternatives })
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    Combinator::Child
                }
                Some(_) if had_ws => Combinator::Descendant,
                Some(_) => return Err(self.error("unexpected character")),
            };
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }
        Ok(ComplexSelector { compounds, combinators })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector, SelectorError> {
        let mut parts = Vec::new();
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                parts.push(SimpleSelector::Universal);
            }
            Some(c) if is_ident_char(c) => {
                parts.push(SimpleSelector::Tag(self.parse_ident()?.to_ascii_lowercase()));
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    parts.push(SimpleSelector::Id(self.parse_ident()?));
                }
                Some('.') => {
                    self.pos += 1;
                    parts.push(SimpleSelector::Class(self.parse_ident()?));
                }
                Some('[') => {
                    self.pos += 1;
                    parts.push(self.parse_attribute()?);
                }
                _ => break,
            }
        }
        if parts.is_empty() {
            return Err(self.error("expected selector"));
        }
        Ok(CompoundSelector { parts })
    }

    fn parse_attribute(&mut self) -> Result<SimpleSelector, SelectorError> {
        self.skip_ws();
        let name = self.parse_ident()?;
        self.skip_ws();
        let value = if self.peek() == Some('=') {
            self.pos += 1;
            self.skip_ws();
            let value = match self.peek() {
                Some(quote @ ('"' | '\'')) => {
                    self.pos += 1;
                    let mut value = String::new();
                    loop {
                        match self.bump() {
                            Some(c) if c == quote => break,
                            Some(c) => value.push(c),
                            None => return Err(self.error("unterminated string")),
                        }
                    }
                    value
                }
                _ => self.parse_ident()?,
            };
            self.skip_ws();
            Some(value)
        } else {
            None
        };
        if self.bump() != Some(']') {
            return Err(self.error("expected `]`"));
        }
        Ok(SimpleSelector::Attribute { name, value })
    }

    fn parse_ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected identifier"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

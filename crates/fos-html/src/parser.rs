//! HTML5 Parser implementation
//!
//! Uses html5ever's built-in RcDom and converts to our DOM format.
//! Fragments are parsed as the content of an explicit `<body>` so that
//! leading whitespace and head-only elements stay where they were written.

use fos_dom::{Document, DomTree, NodeId};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use crate::ParseError;

/// HTML5 parser
#[derive(Debug, Clone)]
pub struct HtmlParser {
    /// Keep text nodes that consist only of whitespace
    keep_whitespace: bool,
}

impl HtmlParser {
    /// Create a parser that keeps every text node
    pub fn new() -> Self {
        Self { keep_whitespace: true }
    }

    /// Create a parser that drops whitespace-only text nodes
    pub fn compact() -> Self {
        Self { keep_whitespace: false }
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Result<Document, ParseError> {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a base URL
    pub fn parse_with_url(&self, html: &str, url: &str) -> Result<Document, ParseError> {
        tracing::debug!("Parsing HTML document: {}", url);

        let dom = Self::read(html)?;

        let mut document = Document::empty(url);
        let root = document.tree.root();
        for child in dom.document.children.borrow().iter() {
            self.convert_node(child, &mut document.tree, root);
        }
        document.finalize();

        tracing::debug!("Parsed {} nodes", document.tree.len());
        Ok(document)
    }

    /// Parse a fragment and append its nodes under `parent`.
    /// Returns the new top-level nodes in order.
    pub fn parse_fragment_into(
        &self,
        html: &str,
        tree: &mut DomTree,
        parent: NodeId,
    ) -> Result<Vec<NodeId>, ParseError> {
        let wrapped = format!("<body>{html}");
        let dom = Self::read(&wrapped)?;

        let Some(body) = find_element(&dom.document, "body") else {
            return Ok(Vec::new());
        };
        let created = body
            .children
            .borrow()
            .iter()
            .filter_map(|child| self.convert_node(child, tree, parent))
            .collect();
        Ok(created)
    }

    fn read(html: &str) -> Result<RcDom, ParseError> {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())?;
        Ok(dom)
    }

    /// Convert an RcDom node (and its subtree) under `parent`
    fn convert_node(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) -> Option<NodeId> {
        let id = match &handle.data {
            RcNodeData::Document => {
                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, parent);
                }
                return None;
            }
            RcNodeData::Doctype { name, public_id, system_id } => {
                tree.create_doctype(&name.to_string(), &public_id.to_string(), &system_id.to_string())
            }
            RcNodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                if !self.keep_whitespace && text.trim().is_empty() {
                    return None;
                }
                tree.create_text(&text)
            }
            RcNodeData::Comment { contents } => tree.create_comment(&contents.to_string()),
            RcNodeData::Element { name, attrs, .. } => {
                let id = tree.create_element(&name.local);
                if let Some(elem) = tree.element_mut(id) {
                    for attr in attrs.borrow().iter() {
                        let value: &str = &attr.value;
                        elem.set_attr(&attr.name.local, value);
                    }
                }
                id
            }
            // Processing instructions only appear in XML documents
            RcNodeData::ProcessingInstruction { .. } => return None,
        };

        if let Err(err) = tree.append_child(parent, id) {
            tracing::warn!("Dropping parsed node: {}", err);
            tree.release(id);
            return None;
        }

        for child in handle.children.borrow().iter() {
            self.convert_node(child, tree, id);
        }
        Some(id)
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Depth-first search for the first element with the given local name
fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    if let RcNodeData::Element { name, .. } = &handle.data {
        if &*name.local == tag {
            return Some(handle.clone());
        }
    }
    handle
        .children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, tag))
}

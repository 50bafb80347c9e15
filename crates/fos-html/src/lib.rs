//! fOS HTML Parser
//!
//! HTML5 parsing built on html5ever, plus the serializer behind
//! `innerHTML` reads. Fragment parsing backs `innerHTML` writes.

mod parser;
mod serializer;

pub use parser::HtmlParser;
pub use serializer::{HtmlSerializer, inner_html, outer_html};

use fos_dom::{Document, DomTree, NodeId};

/// Parse an HTML string into a Document
pub fn parse(html: &str) -> Result<Document, ParseError> {
    HtmlParser::new().parse(html)
}

/// `node.innerHTML = html`: release the children of `node` and append
/// the parsed fragment in their place. Returns the new top-level children.
pub fn set_inner_html(tree: &mut DomTree, node: NodeId, html: &str) -> Result<Vec<NodeId>, ParseError> {
    tree.clear_children(node);
    HtmlParser::new().parse_fragment_into(html, tree, node)
}

/// Parse error
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("I/O error while reading markup: {0}")]
    Io(#[from] std::io::Error),
}

//! HTML Serialization (innerHTML/outerHTML)
//!
//! Output follows the HTML fragment serialization algorithm: void
//! elements have no end tag, script/style content is written raw and
//! attributes always carry a quoted value.

use fos_dom::{DomTree, NodeData, NodeId};

/// Void elements (no end tag)
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr",
];

/// Raw text elements (no escaping for content)
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript", "xmp", "iframe", "noembed", "noframes"];

/// HTML serializer
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSerializer;

impl HtmlSerializer {
    pub fn new() -> Self {
        Self
    }

    /// Serialize innerHTML of a node (children only)
    pub fn serialize_inner(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut output = String::new();
        let raw = tree.tag_name(node_id).is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag));
        if raw {
            Self::serialize_children_raw(tree, node_id, &mut output);
        } else {
            self.serialize_children(tree, node_id, &mut output);
        }
        output
    }

    /// Serialize outerHTML of a node (including the node itself)
    pub fn serialize_outer(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut output = String::new();
        self.serialize_node(tree, node_id, &mut output);
        output
    }

    fn serialize_node(&self, tree: &DomTree, node_id: NodeId, output: &mut String) {
        let Some(node) = tree.get(node_id) else {
            return;
        };

        match &node.data {
            NodeData::Document => self.serialize_children(tree, node_id, output),
            NodeData::Element(elem) => {
                let tag = elem.tag.as_str();

                output.push('<');
                output.push_str(tag);
                for attr in &elem.attrs {
                    output.push(' ');
                    output.push_str(&attr.name);
                    output.push_str("=\"");
                    escape_attribute(&attr.value, output);
                    output.push('"');
                }
                output.push('>');

                if VOID_ELEMENTS.contains(&tag) {
                    return;
                }
                if RAW_TEXT_ELEMENTS.contains(&tag) {
                    Self::serialize_children_raw(tree, node_id, output);
                } else {
                    self.serialize_children(tree, node_id, output);
                }
                output.push_str("</");
                output.push_str(tag);
                output.push('>');
            }
            NodeData::Text(text) => escape_text(text, output),
            NodeData::Comment(text) => {
                output.push_str("<!--");
                output.push_str(text);
                output.push_str("-->");
            }
            NodeData::Doctype { name, .. } => {
                output.push_str("<!DOCTYPE ");
                output.push_str(name);
                output.push('>');
            }
        }
    }

    fn serialize_children(&self, tree: &DomTree, parent_id: NodeId, output: &mut String) {
        for (child_id, _) in tree.children(parent_id) {
            self.serialize_node(tree, child_id, output);
        }
    }

    fn serialize_children_raw(tree: &DomTree, parent_id: NodeId, output: &mut String) {
        for (_, child) in tree.children(parent_id) {
            if let Some(text) = child.as_text() {
                output.push_str(text);
            }
        }
    }
}

/// `node.innerHTML`
pub fn inner_html(tree: &DomTree, node: NodeId) -> String {
    HtmlSerializer::new().serialize_inner(tree, node)
}

/// `node.outerHTML`
pub fn outer_html(tree: &DomTree, node: NodeId) -> String {
    HtmlSerializer::new().serialize_outer(tree, node)
}

/// Escape text content for HTML
fn escape_text(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(c),
        }
    }
}

/// Escape attribute value
fn escape_attribute(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            '"' => output.push_str("&quot;"),
            _ => output.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HtmlParser, set_inner_html};
    use fos_dom::Document;

    fn body_inner(html: &str) -> String {
        let doc = HtmlParser::new().parse(&format!("<body>{html}")).unwrap();
        inner_html(&doc.tree, doc.body())
    }

    #[test]
    fn test_void_and_attributes() {
        assert_eq!(
            body_inner(r#"<p class="a">x<br>y</p><input disabled>"#),
            r#"<p class="a">x<br>y</p><input disabled="">"#
        );
    }

    #[test]
    fn test_escaping() {
        assert_eq!(body_inner("<p title='a\"b'>1 &lt; 2 &amp;</p>"), r#"<p title="a&quot;b">1 &lt; 2 &amp;</p>"#);
    }

    #[test]
    fn test_raw_text_elements() {
        assert_eq!(body_inner("<script>if (a < b) {}</script>"), "<script>if (a < b) {}</script>");
    }

    #[test]
    fn test_outer_html() {
        let doc = HtmlParser::new().parse("<ul><li>one</li></ul>").unwrap();
        let ul = doc.tree.query_selector(doc.body(), "ul").unwrap().unwrap();
        assert_eq!(outer_html(&doc.tree, ul), "<ul><li>one</li></ul>");
    }

    #[test]
    fn test_inner_html_round_trip() {
        let mut doc = Document::default();
        let body = doc.body();
        let markup = r#"Hello <b>{{ name }}</b>, you have <span class="n">{{count}}</span> items"#;
        set_inner_html(&mut doc.tree, body, markup).unwrap();
        assert_eq!(inner_html(&doc.tree, body), markup);

        set_inner_html(&mut doc.tree, body, "plain").unwrap();
        assert_eq!(inner_html(&doc.tree, body), "plain");
        assert_eq!(doc.tree.children(body).count(), 1);
    }
}

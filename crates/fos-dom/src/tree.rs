//! DOM Tree (arena-based allocation)
//!
//! Removing a node only unlinks it, so it can be re-inserted later.
//! Replacing children (`textContent`, `innerHTML`) releases the old
//! subtrees instead: their slots go on a free list and come back with a
//! bumped generation, which makes every id issued for the old node stale.

use crate::{
    DOMTokenList, DomError, DomResult, ElementData, InlineStyle, Node, NodeData, NodeId,
};

/// Arena-based DOM tree for memory efficiency
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
    /// Current generation of each slot
    generations: Vec<u32>,
    /// Released slots, reused last-in first-out
    free_list: Vec<u32>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            generations: vec![0],
            free_list: Vec::new(),
        }
    }

    /// The document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if !self.is_live(id) {
            return None;
        }
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if !self.is_live(id) {
            return None;
        }
        self.nodes.get_mut(id.index())
    }

    /// True while `id` names a node that has not been released
    pub fn is_live(&self, id: NodeId) -> bool {
        id.is_valid() && self.generations.get(id.index()) == Some(&id.generation())
    }

    /// Number of live nodes, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    /// True when the tree holds nothing but the document node
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Allocated slots, released ones included
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    fn push(&mut self, node: Node) -> NodeId {
        if let Some(slot) = self.free_list.pop() {
            self.nodes[slot as usize] = node;
            return NodeId::with_generation(slot, self.generations[slot as usize]);
        }
        let slot = self.nodes.len() as u32;
        self.nodes.push(node);
        self.generations.push(0);
        NodeId::new(slot)
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(Node::text(text))
    }

    /// Create a detached comment
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(Node::comment(text))
    }

    /// Create a detached doctype
    pub fn create_doctype(&mut self, name: &str, public_id: &str, system_id: &str) -> NodeId {
        self.push(Node::doctype(name, public_id, system_id))
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Append `child` as the last child of `parent`, moving it if it is
    /// already attached elsewhere.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        let parent_node = self.get(parent).ok_or(DomError::NotFound(parent))?;
        if !matches!(parent_node.data, NodeData::Document | NodeData::Element(_)) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        let child_node = self.get(child).ok_or(DomError::NotFound(child))?;
        if matches!(child_node.data, NodeData::Document) || self.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }

        self.detach(child);

        let last = self.nodes[parent.index()].last_child;
        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = last;
            node.next_sibling = NodeId::NONE;
        }
        if last.is_valid() {
            self.nodes[last.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        self.nodes[parent.index()].last_child = child;
        Ok(child)
    }

    /// Remove `child` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        let node = self.get(child).ok_or(DomError::NotFound(child))?;
        if node.parent != parent {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child);
        Ok(child)
    }

    /// Unlink a node from its parent and siblings. No-op when detached.
    pub fn detach(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else {
            return;
        };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);
        if !parent.is_valid() {
            return;
        }

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }

        let node = &mut self.nodes[id.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }

    /// Detach `id` and release it with its whole subtree. Returns the
    /// number of slots freed. The document node is never released.
    pub fn release(&mut self, id: NodeId) -> usize {
        if id == NodeId::ROOT || !self.is_live(id) {
            return 0;
        }
        self.detach(id);
        let subtree: Vec<NodeId> = std::iter::once(id).chain(self.descendants(id)).collect();
        for &node in &subtree {
            let slot = node.index();
            self.nodes[slot] = Node::text(String::new());
            self.generations[slot] = self.generations[slot].wrapping_add(1);
            self.free_list.push(node.slot());
        }
        subtree.len()
    }

    /// Release every child of `id`
    pub fn clear_children(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.children(id).map(|(child, _)| child).collect();
        for child in children {
            self.release(child);
        }
    }

    /// Iterate direct children
    pub fn children(&self, id: NodeId) -> Children<'_> {
        let next = self.get(id).map_or(NodeId::NONE, |n| n.first_child);
        Children { tree: self, next }
    }

    /// Iterate all descendants in document order (pre-order), excluding `id`
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let next = self.get(id).map_or(NodeId::NONE, |n| n.first_child);
        Descendants { tree: self, root: id, next }
    }

    /// Parent of a node, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Inclusive ancestry check
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = node;
        while current.is_valid() {
            if current == ancestor {
                return true;
            }
            current = self.get(current).map_or(NodeId::NONE, |n| n.parent);
        }
        false
    }

    /// Next node after `id` in pre-order once its subtree is exhausted,
    /// without leaving `root`'s subtree
    fn following(&self, id: NodeId, root: NodeId) -> NodeId {
        let mut current = id;
        while current.is_valid() && current != root {
            let Some(node) = self.get(current) else {
                return NodeId::NONE;
            };
            if node.next_sibling.is_valid() {
                return node.next_sibling;
            }
            current = node.parent;
        }
        NodeId::NONE
    }

    // ------------------------------------------------------------------
    // Elements and attributes
    // ------------------------------------------------------------------

    /// Element data for an element node
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    /// Mutable element data for an element node
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(Node::as_element_mut)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Lowercase tag name
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.get_attr(name)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|e| e.has_attr(name))
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        let elem = self.element_mut(id).ok_or(DomError::InvalidNodeType(id))?;
        elem.set_attr(name, value);
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.element_mut(id)?.remove_attr(name)
    }

    /// Snapshot of the `class` attribute as a token list
    pub fn class_list(&self, id: NodeId) -> DOMTokenList {
        DOMTokenList::parse(self.get_attribute(id, "class").unwrap_or(""))
    }

    /// `classList.toggle`; returns whether the class is present afterwards
    pub fn toggle_class(&mut self, id: NodeId, class: &str, force: Option<bool>) -> DomResult<bool> {
        let mut list = self.class_list(id);
        let present = list.toggle(class, force);
        self.set_attribute(id, "class", &list.value())?;
        Ok(present)
    }

    /// Parsed inline style
    pub fn style(&self, id: NodeId) -> InlineStyle {
        InlineStyle::parse(self.get_attribute(id, "style").unwrap_or(""))
    }

    pub fn style_property(&self, id: NodeId, property: &str) -> Option<String> {
        self.style(id).get(property).map(str::to_string)
    }

    /// `el.style[property] = value`
    pub fn set_style_property(&mut self, id: NodeId, property: &str, value: &str) -> DomResult<()> {
        let mut style = self.style(id);
        style.set(property, value);
        self.write_style(id, &style)
    }

    pub fn remove_style_property(&mut self, id: NodeId, property: &str) -> DomResult<()> {
        let mut style = self.style(id);
        style.remove(property);
        self.write_style(id, &style)
    }

    fn write_style(&mut self, id: NodeId, style: &InlineStyle) -> DomResult<()> {
        if style.is_empty() {
            if self.is_element(id) {
                self.remove_attribute(id, "style");
                return Ok(());
            }
            return Err(DomError::InvalidNodeType(id));
        }
        self.set_attribute(id, "style", &style.to_css_text())
    }

    /// Elements under `root` (exclusive) carrying `name`, in document order
    pub fn elements_with_attribute(&self, root: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(root)
            .filter(|&id| self.has_attribute(id, name))
            .collect()
    }

    // ------------------------------------------------------------------
    // Text and form values
    // ------------------------------------------------------------------

    /// `textContent`: own text for text nodes, concatenated descendant
    /// text otherwise
    pub fn text_content(&self, id: NodeId) -> String {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Text(text)) | Some(NodeData::Comment(text)) => text.clone(),
            Some(NodeData::Element(_)) | Some(NodeData::Document) => self
                .descendants(id)
                .filter_map(|d| self.get(d).and_then(Node::as_text))
                .collect(),
            _ => String::new(),
        }
    }

    /// `textContent = text`: replaces all children with a single text
    /// node (or none for an empty string). A lone text child is
    /// rewritten in place.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        let node = self.get_mut(id).ok_or(DomError::NotFound(id))?;
        match &mut node.data {
            NodeData::Text(content) | NodeData::Comment(content) => {
                *content = text.to_string();
                return Ok(());
            }
            NodeData::Doctype { .. } => return Err(DomError::InvalidNodeType(id)),
            NodeData::Element(_) | NodeData::Document => {}
        }

        if let Some(only) = self.only_text_child(id) {
            if text.is_empty() {
                self.release(only);
            } else if let Some(NodeData::Text(content)) = self.get_mut(only).map(|n| &mut n.data) {
                content.clear();
                content.push_str(text);
            }
            return Ok(());
        }

        self.clear_children(id);
        if !text.is_empty() {
            let text_id = self.create_text(text);
            self.append_child(id, text_id)?;
        }
        Ok(())
    }

    fn only_text_child(&self, id: NodeId) -> Option<NodeId> {
        let node = self.get(id)?;
        let first = node.first_child;
        (first.is_valid() && first == node.last_child && self.get(first)?.is_text()).then_some(first)
    }

    /// input, textarea and select
    pub fn is_form_control(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(ElementData::is_form_control)
    }

    /// `el.value` of a form control. Falls back to the `value` attribute
    /// (input), the text content (textarea) or the selected option
    /// (select) until the value slot has been written.
    pub fn value(&self, id: NodeId) -> String {
        let Some(elem) = self.element(id) else {
            return String::new();
        };
        if let Some(value) = &elem.value {
            return value.clone();
        }
        match elem.tag.as_str() {
            "textarea" => self.text_content(id),
            "select" => self.selected_option_value(id),
            _ => elem.get_attr("value").unwrap_or("").to_string(),
        }
    }

    /// `el.value = value`
    pub fn set_value(&mut self, id: NodeId, value: &str) -> DomResult<()> {
        let elem = self.element_mut(id).ok_or(DomError::InvalidNodeType(id))?;
        elem.value = Some(value.to_string());
        Ok(())
    }

    fn selected_option_value(&self, select: NodeId) -> String {
        let options: Vec<NodeId> = self
            .descendants(select)
            .filter(|&id| self.tag_name(id) == Some("option"))
            .collect();
        let chosen = options
            .iter()
            .copied()
            .find(|&id| self.has_attribute(id, "selected"))
            .or_else(|| options.first().copied());
        match chosen {
            Some(option) => match self.get_attribute(option, "value") {
                Some(value) => value.to_string(),
                None => self.text_content(option).trim().to_string(),
            },
            None => String::new(),
        }
    }
}

/// Iterator over direct children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}

/// Pre-order iterator over a subtree
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    next: NodeId,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = if node.first_child.is_valid() {
            node.first_child
        } else {
            self.tree.following(id, self.root)
        };
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DomTree, NodeId, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let p = tree.create_element("p");
        let span = tree.create_element("span");
        tree.append_child(tree.root(), div).unwrap();
        tree.append_child(div, p).unwrap();
        tree.append_child(div, span).unwrap();
        (tree, div, p, span)
    }

    #[test]
    fn test_append_links_siblings() {
        let (tree, div, p, span) = sample();
        let node = tree.get(div).unwrap();
        assert_eq!(node.first_child, p);
        assert_eq!(node.last_child, span);
        assert_eq!(tree.get(p).unwrap().next_sibling, span);
        assert_eq!(tree.get(span).unwrap().prev_sibling, p);
    }

    #[test]
    fn test_append_rejects_cycle() {
        let (mut tree, div, p, _) = sample();
        assert_eq!(
            tree.append_child(p, div),
            Err(DomError::HierarchyRequest { parent: p, child: div })
        );
    }

    #[test]
    fn test_append_moves_node() {
        let (mut tree, div, p, span) = sample();
        tree.append_child(span, p).unwrap();
        assert_eq!(tree.get(div).unwrap().first_child, span);
        assert_eq!(tree.parent(p), Some(span));
    }

    #[test]
    fn test_remove_child_checks_parent() {
        let (mut tree, div, p, span) = sample();
        assert!(tree.remove_child(span, p).is_err());
        tree.remove_child(div, p).unwrap();
        assert_eq!(tree.children(div).count(), 1);
    }

    #[test]
    fn test_descendants_document_order() {
        let (mut tree, div, p, span) = sample();
        let text = tree.create_text("hi");
        tree.append_child(p, text).unwrap();
        let order: Vec<NodeId> = tree.descendants(tree.root()).collect();
        assert_eq!(order, vec![div, p, text, span]);
        let inner: Vec<NodeId> = tree.descendants(p).collect();
        assert_eq!(inner, vec![text]);
    }

    #[test]
    fn test_text_content_roundtrip() {
        let (mut tree, div, p, _) = sample();
        tree.set_text_content(p, "Hello").unwrap();
        assert_eq!(tree.text_content(div), "Hello");
        tree.set_text_content(p, "").unwrap();
        assert_eq!(tree.children(p).count(), 0);
    }

    #[test]
    fn test_text_content_reuses_lone_text_child() {
        let (mut tree, _, p, _) = sample();
        tree.set_text_content(p, "one").unwrap();
        let text = tree.get(p).unwrap().first_child;
        let before = tree.capacity();
        for n in 0..100 {
            tree.set_text_content(p, &n.to_string()).unwrap();
        }
        assert_eq!(tree.get(p).unwrap().first_child, text);
        assert_eq!(tree.text_content(p), "99");
        assert_eq!(tree.capacity(), before);
    }

    #[test]
    fn test_release_recycles_slots_with_new_generation() {
        let (mut tree, div, p, span) = sample();
        let inner = tree.create_text("x");
        tree.append_child(p, inner).unwrap();
        let live = tree.len();

        assert_eq!(tree.release(p), 2);
        assert_eq!(tree.len(), live - 2);
        assert!(!tree.is_live(p));
        assert!(tree.get(inner).is_none());
        assert_eq!(tree.children(div).map(|(id, _)| id).collect::<Vec<_>>(), vec![span]);

        let em = tree.create_element("em");
        assert_eq!(em.slot(), inner.slot());
        assert_ne!(em, inner);
        assert_eq!(em.generation(), 1);
        assert!(tree.tag_name(inner).is_none());
        assert_eq!(tree.tag_name(em), Some("em"));
        assert_eq!(tree.capacity(), live);
    }

    #[test]
    fn test_clear_children_keeps_arena_flat() {
        let (mut tree, div, _, _) = sample();
        let before = tree.capacity();
        for _ in 0..50 {
            tree.clear_children(div);
            let b = tree.create_element("b");
            let text = tree.create_text("x");
            tree.append_child(div, b).unwrap();
            tree.append_child(b, text).unwrap();
        }
        assert_eq!(tree.capacity(), before);
        assert_eq!(tree.release(tree.root()), 0);
    }

    #[test]
    fn test_value_fallbacks() {
        let mut tree = DomTree::new();
        let input = tree.create_element("input");
        tree.set_attribute(input, "value", "initial").unwrap();
        assert_eq!(tree.value(input), "initial");
        tree.set_value(input, "typed").unwrap();
        assert_eq!(tree.value(input), "typed");
        assert_eq!(tree.get_attribute(input, "value"), Some("initial"));

        let select = tree.create_element("select");
        for (value, selected) in [("a", false), ("b", true)] {
            let option = tree.create_element("option");
            tree.set_attribute(option, "value", value).unwrap();
            if selected {
                tree.set_attribute(option, "selected", "").unwrap();
            }
            tree.append_child(select, option).unwrap();
        }
        assert_eq!(tree.value(select), "b");
    }

    #[test]
    fn test_style_and_class_edits() {
        let (mut tree, div, _, _) = sample();
        tree.set_style_property(div, "display", "none").unwrap();
        assert_eq!(tree.style_property(div, "display").as_deref(), Some("none"));
        tree.remove_style_property(div, "display").unwrap();
        assert!(!tree.has_attribute(div, "style"));

        assert!(tree.toggle_class(div, "active", None).unwrap());
        assert_eq!(tree.get_attribute(div, "class"), Some("active"));
        assert!(!tree.toggle_class(div, "active", Some(false)).unwrap());
    }
}

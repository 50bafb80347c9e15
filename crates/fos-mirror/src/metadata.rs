//! Element Metadata Cache
//!
//! Per-element facts computed once and kept until teardown. Keyed by
//! `NodeId`, which never keeps a node alive.

use std::collections::HashMap;
use std::rc::Rc;

use fos_dom::{DomTree, ListenerId, NodeId};

use crate::Template;

/// Write-back listeners installed on a control for one property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBack {
    pub property: String,
    pub input: ListenerId,
    pub change: ListenerId,
}

/// Cached facts about one element
#[derive(Debug, Clone, Default)]
pub struct ElementMetadata {
    /// input, textarea or select
    pub is_form_control: Option<bool>,
    /// Content captured by the template scan
    pub template: Option<Rc<Template>>,
    /// Control-to-state listeners, one per bound property
    pub write_backs: Vec<WriteBack>,
}

/// Metadata for every element the engine has touched
#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: HashMap<NodeId, ElementMetadata>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: NodeId) -> Option<&ElementMetadata> {
        self.entries.get(&node)
    }

    pub fn entry(&mut self, node: NodeId) -> &mut ElementMetadata {
        self.entries.entry(node).or_default()
    }

    /// Memoized form-control check
    pub fn is_form_control(&mut self, tree: &DomTree, node: NodeId) -> bool {
        *self
            .entry(node)
            .is_form_control
            .get_or_insert_with(|| tree.is_form_control(node))
    }

    /// Record that `node` is a form control without asking the tree
    pub fn mark_form_control(&mut self, node: NodeId) {
        self.entry(node).is_form_control = Some(true);
    }

    pub fn template(&self, node: NodeId) -> Option<Rc<Template>> {
        self.entries.get(&node)?.template.clone()
    }

    /// Captured template for `node`, capturing with `capture` on first use
    pub fn template_or_capture(&mut self, node: NodeId, capture: impl FnOnce() -> Template) -> Rc<Template> {
        Rc::clone(self.entry(node).template.get_or_insert_with(|| Rc::new(capture())))
    }

    pub fn has_write_back(&self, node: NodeId, property: &str) -> bool {
        self.entries
            .get(&node)
            .is_some_and(|meta| meta.write_backs.iter().any(|wb| wb.property == property))
    }

    pub fn add_write_back(&mut self, node: NodeId, write_back: WriteBack) {
        self.entry(node).write_backs.push(write_back);
    }

    /// Remove and return every installed write-back
    pub fn take_write_backs(&mut self) -> Vec<(NodeId, WriteBack)> {
        let mut taken: Vec<(NodeId, WriteBack)> = self
            .entries
            .iter_mut()
            .flat_map(|(&node, meta)| meta.write_backs.drain(..).map(move |wb| (node, wb)))
            .collect();
        taken.sort_by_key(|(node, _)| *node);
        taken
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

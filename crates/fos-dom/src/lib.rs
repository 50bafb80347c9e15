//! fOS DOM - Document Object Model
//!
//! Arena-based DOM tree with element queries, form-control values,
//! inline styles and event listeners.

mod node;
mod tree;
mod document;
mod selector;
mod classlist;
mod style;
mod dom_events;
mod operations;

pub use node::{Node, NodeData, ElementData, Attribute};
pub use tree::{DomTree, Children, Descendants};
pub use document::{Document, SharedDocument};
pub use selector::{Selector, ComplexSelector, CompoundSelector, SimpleSelector, Combinator, SelectorError};
pub use classlist::DOMTokenList;
pub use style::InlineStyle;
pub use dom_events::{
    DomEvent, DomEventType, EventListener, EventListeners, ListenerId,
    dispatch_event, dispatch_input,
};
pub use operations::{DomError, DomResult};

/// Node identifier: arena slot plus the generation of that slot.
///
/// Slots are recycled once a subtree is released, so an id held past
/// its node's release never resolves to the node that reuses the slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId::new(0);

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId::new(u32::MAX);

    /// First-generation id for a slot
    pub const fn new(index: u32) -> Self {
        Self { index, generation: 0 }
    }

    pub(crate) const fn with_generation(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Check that this ID points at a node slot
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Arena slot
    #[inline]
    pub fn slot(self) -> u32 {
        self.index
    }

    /// Times the slot had been recycled when this id was issued
    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.index as usize
    }
}

impl std::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.generation == 0 {
            write!(f, "NodeId({})", self.index)
        } else {
            write!(f, "NodeId({}v{})", self.index, self.generation)
        }
    }
}

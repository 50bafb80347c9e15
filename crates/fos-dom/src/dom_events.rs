//! DOM Events
//!
//! Listener registration and dispatch for user-interaction events.
//!
//! Listeners are plain closures. Dispatch never holds a borrow of the
//! document while a listener runs, so a listener may read or mutate the
//! document (or anything that in turn writes to it).

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::{NodeId, SharedDocument};

/// DOM event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomEventType {
    Input,
    Change,
    Click,
    Submit,
    Focus,
    Blur,
}

impl DomEventType {
    /// Event name as used in `addEventListener`
    pub fn name(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Change => "change",
            Self::Click => "click",
            Self::Submit => "submit",
            Self::Focus => "focus",
            Self::Blur => "blur",
        }
    }

    /// Focus and blur do not bubble
    pub fn bubbles(self) -> bool {
        !matches!(self, Self::Focus | Self::Blur)
    }
}

/// DOM event
#[derive(Debug)]
pub struct DomEvent {
    pub event_type: DomEventType,
    pub target: NodeId,
    current_target: Cell<NodeId>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl DomEvent {
    pub fn new(event_type: DomEventType, target: NodeId) -> Self {
        Self {
            event_type,
            target,
            current_target: Cell::new(target),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    /// Node whose listener is currently running
    pub fn current_target(&self) -> NodeId {
        self.current_target.get()
    }

    /// Prevent default action
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    /// Check if default was prevented
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// Stop propagation to ancestors
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }
}

/// Listener callback
pub type EventListener = Rc<dyn Fn(&DomEvent)>;

/// Handle returned by [`EventListeners::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listener table keyed by target and event type
#[derive(Default)]
pub struct EventListeners {
    next_id: u64,
    table: HashMap<(NodeId, DomEventType), Vec<(ListenerId, EventListener)>>,
}

impl std::fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListeners")
            .field("targets", &self.table.len())
            .field("listeners", &self.len())
            .finish()
    }
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// `addEventListener`
    pub fn add(&mut self, target: NodeId, event_type: DomEventType, listener: EventListener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.table.entry((target, event_type)).or_default().push((id, listener));
        id
    }

    /// `removeEventListener`; returns false if the listener was not registered
    pub fn remove(&mut self, target: NodeId, event_type: DomEventType, id: ListenerId) -> bool {
        let key = (target, event_type);
        let Some(list) = self.table.get_mut(&key) else {
            return false;
        };
        let before = list.len();
        list.retain(|(listener_id, _)| *listener_id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.table.remove(&key);
        }
        removed
    }

    /// Snapshot of the listeners for one target, in registration order
    pub fn listeners_for(&self, target: NodeId, event_type: DomEventType) -> Vec<EventListener> {
        self.table
            .get(&(target, event_type))
            .map(|list| list.iter().map(|(_, l)| Rc::clone(l)).collect())
            .unwrap_or_default()
    }

    /// Number of listeners on one target
    pub fn count(&self, target: NodeId, event_type: DomEventType) -> usize {
        self.table.get(&(target, event_type)).map_or(0, Vec::len)
    }

    /// Total number of registered listeners
    pub fn len(&self) -> usize {
        self.table.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Dispatch `event` to its target, then bubble through ancestors.
///
/// Returns false if a listener called `prevent_default`.
pub fn dispatch_event(document: &SharedDocument, event: DomEvent) -> bool {
    let path: Vec<NodeId> = {
        let doc = document.borrow();
        let mut path = vec![event.target];
        if event.event_type.bubbles() {
            let mut current = doc.tree.parent(event.target);
            while let Some(id) = current {
                path.push(id);
                current = doc.tree.parent(id);
            }
        }
        path
    };

    for node in path {
        let listeners = document.borrow().listeners.listeners_for(node, event.event_type);
        event.current_target.set(node);
        for listener in listeners {
            listener(&event);
        }
        if event.propagation_stopped.get() {
            break;
        }
    }

    !event.is_default_prevented()
}

/// Simulate a user edit: write the control's value slot, then fire `input`
pub fn dispatch_input(document: &SharedDocument, target: NodeId, value: &str) -> bool {
    if let Err(err) = document.borrow_mut().tree.set_value(target, value) {
        tracing::warn!("Cannot set value on {:?}: {}", target, err);
        return false;
    }
    dispatch_event(document, DomEvent::new(DomEventType::Input, target))
}

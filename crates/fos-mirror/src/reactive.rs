//! Engine instance and reactive handle
//!
//! A [`Mirror`] owns every registry for one set of bindings; two engines
//! never share property names. [`Reactive`] is the handle applications
//! write through.
//!
//! No `RefCell` borrow is held while user code runs (watchers, extension
//! handlers, listeners), so that code may freely call back into the
//! engine.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use fos_dom::{NodeId, SharedDocument};

use crate::binder;
use crate::{
    Binding, BindingKind, BindingRegistry, BatchScheduler, ExtensionRegistry, FrameScheduler,
    MetadataCache, MirrorConfig, MirrorError, RootTarget, State, Template, Value, WatcherRegistry,
};

/// Counters describing engine activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineStats {
    /// Flush passes run
    pub flushes: u64,
    /// Binding updates applied by flushes
    pub dom_writes: u64,
    /// Property names waiting for the next flush
    pub pending: usize,
    /// Registered bindings
    pub bindings: usize,
    /// Registered watchers
    pub watchers: usize,
}

/// Shared engine state
pub(crate) struct Engine {
    pub(crate) document: SharedDocument,
    frames: Rc<dyn FrameScheduler>,
    pub(crate) state: RefCell<State>,
    pub(crate) bindings: RefCell<BindingRegistry>,
    pub(crate) watchers: RefCell<WatcherRegistry>,
    pub(crate) extensions: RefCell<ExtensionRegistry>,
    pub(crate) metadata: RefCell<MetadataCache>,
    scheduler: RefCell<BatchScheduler>,
    flushes: Cell<u64>,
    dom_writes: Cell<u64>,
}

impl Engine {
    /// Dirty-checked write
    pub(crate) fn set(self: &Rc<Self>, property: &str, value: Value) {
        let old = {
            let mut state = self.state.borrow_mut();
            let old = state.get(property);
            if old.is_same(&value) {
                return;
            }
            state.insert(property, value.clone());
            old
        };

        self.enqueue(property);

        let watchers = self.watchers.borrow().watchers_for(property);
        for watcher in watchers {
            watcher(&value, &old);
        }
    }

    fn enqueue(self: &Rc<Self>, property: &str) {
        let request = self.scheduler.borrow_mut().enqueue(property);
        if request {
            self.request_flush();
        }
    }

    fn request_flush(self: &Rc<Self>) {
        let engine = Rc::downgrade(self);
        let epoch = self.scheduler.borrow().epoch();
        self.frames.request_frame(Box::new(move || {
            if let Some(engine) = engine.upgrade() {
                engine.flush(epoch);
            }
        }));
    }

    /// One batched pass over the bindings of every queued property
    fn flush(self: &Rc<Self>, epoch: u64) {
        let batch = {
            let mut scheduler = self.scheduler.borrow_mut();
            if scheduler.epoch() != epoch {
                tracing::trace!("Skipping stale frame (epoch {} != {})", epoch, scheduler.epoch());
                return;
            }
            scheduler.begin_flush()
        };

        let mut writes = 0u64;
        for property in &batch {
            let bindings = self.bindings.borrow().bindings_for(property).to_vec();
            for binding in &bindings {
                self.apply(binding);
                writes += 1;
            }
        }
        self.flushes.set(self.flushes.get() + 1);
        self.dom_writes.set(self.dom_writes.get() + writes);
        tracing::trace!("Flushed {} properties, {} binding updates", batch.len(), writes);

        let again = {
            let mut scheduler = self.scheduler.borrow_mut();
            scheduler.epoch() == epoch && scheduler.finish_flush()
        };
        if again {
            self.request_flush();
        }
    }

    /// Write one binding's current value to the DOM
    pub(crate) fn apply(&self, binding: &Binding) {
        match binding.kind {
            BindingKind::Text => {
                let template = self.metadata.borrow().template(binding.element);
                match template {
                    Some(template) => self.render_template(binding.element, &template),
                    None => {
                        let text = self.state.borrow().get(&binding.property).display();
                        let result = self.document.borrow_mut().tree.set_text_content(binding.element, &text);
                        if let Err(err) = result {
                            tracing::warn!("Text binding for `{}` failed: {}", binding.property, err);
                        }
                    }
                }
            }
            BindingKind::Model => {
                let value = self.state.borrow().get(&binding.property).display();
                let result = self.document.borrow_mut().tree.set_value(binding.element, &value);
                if let Err(err) = result {
                    tracing::warn!("Model binding for `{}` failed: {}", binding.property, err);
                }
            }
        }
    }

    /// Expand a template against the full state and write it back
    pub(crate) fn render_template(&self, element: NodeId, template: &Template) {
        let content = template.render(&self.state.borrow());
        let mut doc = self.document.borrow_mut();
        if template.has_markup() {
            if let Err(err) = fos_html::set_inner_html(&mut doc.tree, element, &content) {
                tracing::warn!("Template markup for {:?} failed: {}", element, err);
            }
        } else if let Err(err) = doc.tree.set_text_content(element, &content) {
            tracing::warn!("Template text for {:?} failed: {}", element, err);
        }
    }

    fn resolve_root(&self, target: &RootTarget) -> Result<NodeId, MirrorError> {
        let doc = self.document.borrow();
        match target {
            RootTarget::Body => Ok(doc.body()),
            RootTarget::Node(node) => {
                if doc.tree.get(*node).is_some() {
                    Ok(*node)
                } else {
                    Err(MirrorError::InvalidRoot(*node))
                }
            }
            RootTarget::Selector(selector) => doc
                .tree
                .query_selector(doc.tree.root(), selector)?
                .ok_or_else(|| MirrorError::RootNotFound(selector.clone())),
        }
    }

    /// Remove write-back listeners, clear registries and reset the batch.
    /// Captured templates stay cached for a later `create`.
    fn destroy(&self) {
        let write_backs = self.metadata.borrow_mut().take_write_backs();
        {
            let mut doc = self.document.borrow_mut();
            for (node, write_back) in &write_backs {
                doc.listeners.remove(*node, fos_dom::DomEventType::Input, write_back.input);
                doc.listeners.remove(*node, fos_dom::DomEventType::Change, write_back.change);
            }
        }

        self.bindings.borrow_mut().clear();
        self.watchers.borrow_mut().clear();
        self.extensions.borrow_mut().reset_applied();
        self.scheduler.borrow_mut().reset();

        tracing::debug!("Destroyed engine: removed {} write-back listeners", write_backs.len());
    }

    fn stats(&self) -> EngineStats {
        EngineStats {
            flushes: self.flushes.get(),
            dom_writes: self.dom_writes.get(),
            pending: self.scheduler.borrow().pending(),
            bindings: self.bindings.borrow().len(),
            watchers: self.watchers.borrow().len(),
        }
    }
}

/// Reactive binding engine for one document
#[derive(Clone)]
pub struct Mirror {
    engine: Rc<Engine>,
}

impl std::fmt::Debug for Mirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mirror").field("stats", &self.engine.stats()).finish()
    }
}

impl Mirror {
    /// Create an engine bound to `document`, flushing on `frames`
    pub fn new(document: SharedDocument, frames: impl FrameScheduler + 'static) -> Self {
        Self::with_scheduler(document, Rc::new(frames))
    }

    /// Create an engine with a shared frame source
    pub fn with_scheduler(document: SharedDocument, frames: Rc<dyn FrameScheduler>) -> Self {
        Self {
            engine: Rc::new(Engine {
                document,
                frames,
                state: RefCell::new(State::new()),
                bindings: RefCell::new(BindingRegistry::new()),
                watchers: RefCell::new(WatcherRegistry::new()),
                extensions: RefCell::new(ExtensionRegistry::new()),
                metadata: RefCell::new(MetadataCache::new()),
                scheduler: RefCell::new(BatchScheduler::new()),
                flushes: Cell::new(0),
                dom_writes: Cell::new(0),
            }),
        }
    }

    /// Register (or replace) the handler for an attribute.
    ///
    /// Handlers run during `create`, once per element carrying the
    /// attribute, in document order.
    pub fn extend<F>(&self, attribute: &str, handler: F)
    where
        F: Fn(NodeId, &str, &Reactive) -> anyhow::Result<()> + 'static,
    {
        self.engine.extensions.borrow_mut().register(attribute, Rc::new(handler));
    }

    /// Register a change callback, called with `(new, old)` on every
    /// effective write
    pub fn watch<F>(&self, property: &str, callback: F)
    where
        F: Fn(&Value, &Value) + 'static,
    {
        self.engine.watchers.borrow_mut().add(property, Rc::new(callback));
    }

    /// Merge `initial` into the state and bind everything under the
    /// configured root.
    ///
    /// Calling this again re-scans without duplicating bindings,
    /// listeners or extension invocations.
    pub fn create(&self, initial: State, config: MirrorConfig) -> Result<Reactive, MirrorError> {
        let root = self.engine.resolve_root(&config.root)?;
        {
            let mut state = self.engine.state.borrow_mut();
            for (property, value) in initial {
                state.insert(&property, value);
            }
        }

        let handle = Reactive { engine: Rc::clone(&self.engine) };
        binder::scan(&self.engine, &handle, root, &config);
        Ok(handle)
    }

    /// Handle to the engine's state without scanning anything
    pub fn reactive(&self) -> Reactive {
        Reactive { engine: Rc::clone(&self.engine) }
    }

    pub fn document(&self) -> SharedDocument {
        Rc::clone(&self.engine.document)
    }

    pub fn stats(&self) -> EngineStats {
        self.engine.stats()
    }
}

/// Handle to an engine's state: explicit `get`/`set` accessors with
/// dirty checking, immediate watchers and batched DOM updates
#[derive(Clone)]
pub struct Reactive {
    engine: Rc<Engine>,
}

impl std::fmt::Debug for Reactive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reactive")
            .field("state", &*self.engine.state.borrow())
            .finish()
    }
}

impl Reactive {
    /// Current value; missing properties read as `Null`
    pub fn get(&self, property: &str) -> Value {
        self.engine.state.borrow().get(property)
    }

    /// Write a property. A write of the same value (see
    /// [`Value::is_same`]) does nothing.
    pub fn set(&self, property: &str, value: impl Into<Value>) {
        self.engine.set(property, value.into());
    }

    /// Read-modify-write
    pub fn update(&self, property: &str, f: impl FnOnce(&Value) -> Value) {
        let next = f(&self.get(property));
        self.set(property, next);
    }

    pub fn has(&self, property: &str) -> bool {
        self.engine.state.borrow().contains(property)
    }

    /// Copy of the whole state
    pub fn snapshot(&self) -> State {
        self.engine.state.borrow().clone()
    }

    /// Shorthand for [`Mirror::watch`]
    pub fn watch<F>(&self, property: &str, callback: F)
    where
        F: Fn(&Value, &Value) + 'static,
    {
        self.engine.watchers.borrow_mut().add(property, Rc::new(callback));
    }

    /// Whether `property` is waiting for the next flush
    pub fn is_pending(&self, property: &str) -> bool {
        self.engine.scheduler.borrow().is_pending(property)
    }

    pub fn document(&self) -> SharedDocument {
        Rc::clone(&self.engine.document)
    }

    pub fn stats(&self) -> EngineStats {
        self.engine.stats()
    }

    /// Non-owning handle, for listeners and watchers that must not keep
    /// the engine alive
    pub fn downgrade(&self) -> WeakReactive {
        WeakReactive { engine: Rc::downgrade(&self.engine) }
    }

    /// Tear down: remove write-back listeners, clear bindings and
    /// watchers, drop queued updates. State values are kept.
    pub fn destroy(&self) {
        self.engine.destroy();
    }
}

/// Weak counterpart of [`Reactive`]
#[derive(Clone, Debug)]
pub struct WeakReactive {
    engine: Weak<Engine>,
}

impl WeakReactive {
    pub fn upgrade(&self) -> Option<Reactive> {
        self.engine.upgrade().map(|engine| Reactive { engine })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FrameQueue;
    use fos_dom::Document;

    fn engine() -> (Mirror, FrameQueue) {
        let frames = FrameQueue::new();
        let mirror = Mirror::new(Document::default().shared(), frames.clone());
        (mirror, frames)
    }

    #[test]
    fn test_set_get() {
        let (mirror, _) = engine();
        let app = mirror.create(State::new().with("a", 1), MirrorConfig::default()).unwrap();
        assert_eq!(app.get("a"), Value::from(1));
        assert_eq!(app.get("b"), Value::Null);
        app.set("b", "x");
        assert!(app.has("b"));
        app.update("a", |v| Value::from(v.as_f64().unwrap_or(0.0) + 1.0));
        assert_eq!(app.get("a"), Value::from(2));
    }

    #[test]
    fn test_noop_write_does_not_enqueue() {
        let (mirror, frames) = engine();
        let app = mirror.create(State::new().with("x", 5), MirrorConfig::default()).unwrap();
        app.set("x", 5);
        assert_eq!(frames.pending(), 0);
        assert_eq!(app.stats().pending, 0);

        app.set("x", 6);
        assert!(app.is_pending("x"));
        assert_eq!(frames.pending(), 1);
    }

    #[test]
    fn test_one_frame_request_per_batch() {
        let (mirror, frames) = engine();
        let app = mirror.create(State::new(), MirrorConfig::default()).unwrap();
        app.set("a", 1);
        app.set("b", 2);
        app.set("a", 3);
        assert_eq!(frames.pending(), 1);
        assert_eq!(app.stats().pending, 2);

        frames.run_frame();
        assert_eq!(app.stats().pending, 0);
        assert_eq!(app.stats().flushes, 1);
    }

    #[test]
    fn test_stale_frame_after_destroy() {
        let (mirror, frames) = engine();
        let app = mirror.create(State::new(), MirrorConfig::default()).unwrap();
        app.set("a", 1);
        app.destroy();
        frames.run_frame();
        assert_eq!(app.stats().flushes, 0);
    }

    #[test]
    fn test_dropped_engine_frame_is_noop() {
        let (mirror, frames) = engine();
        let app = mirror.create(State::new(), MirrorConfig::default()).unwrap();
        app.set("a", 1);
        let weak = app.downgrade();
        drop(app);
        drop(mirror);
        assert!(weak.upgrade().is_none());
        assert_eq!(frames.run_frame(), 1);
    }

    #[test]
    fn test_invalid_roots() {
        let (mirror, _) = engine();
        let err = mirror
            .create(State::new(), MirrorConfig::new().root(NodeId::new(999)))
            .unwrap_err();
        assert!(matches!(err, MirrorError::InvalidRoot(id) if id == NodeId::new(999)));

        let err = mirror
            .create(State::new(), MirrorConfig::new().root_selector("#nope"))
            .unwrap_err();
        assert!(matches!(err, MirrorError::RootNotFound(_)));

        let err = mirror
            .create(State::new(), MirrorConfig::new().root_selector("[x"))
            .unwrap_err();
        assert!(matches!(err, MirrorError::Selector(_)));
    }
}

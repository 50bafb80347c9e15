//! Binder - setup scan
//!
//! Order matters: explicit bindings, then templates, then model
//! attributes, then extensions, so that extensions see a DOM that
//! already reflects the other bindings.
//!
//! Every step is idempotent per (property, element, kind), so scanning a
//! root twice leaves the registries as if it was scanned once.

use std::rc::Rc;

use fos_dom::{DomEvent, DomEventType, EventListener, NodeId};

use crate::reactive::Engine;
use crate::{Binding, BindingDecl, MirrorConfig, Reactive, Template, Value, WriteBack};

/// Scan `root` and wire everything found to `engine`
pub(crate) fn scan(engine: &Rc<Engine>, handle: &Reactive, root: NodeId, config: &MirrorConfig) {
    let before = engine.bindings.borrow().len();

    bind_explicit(engine, root, &config.bindings);
    bind_templates(engine, root, &config.bind_selector);
    bind_models(engine, root, &config.model_attribute);
    let invoked = run_extensions(engine, handle, root);

    tracing::debug!(
        "Scanned {:?}: {} new bindings, {} extension calls",
        root,
        engine.bindings.borrow().len().saturating_sub(before),
        invoked
    );
}

fn bind_explicit(engine: &Rc<Engine>, root: NodeId, decls: &[BindingDecl]) {
    for decl in decls {
        let found = engine.document.borrow().tree.query_selector_all(root, &decl.selector);
        let elements = match found {
            Ok(elements) => elements,
            Err(err) => {
                tracing::warn!("Skipping binding for `{}`: {}", decl.property, err);
                continue;
            }
        };

        for element in elements {
            let is_control = {
                let doc = engine.document.borrow();
                let is_control = engine.metadata.borrow_mut().is_form_control(&doc.tree, element);
                is_control
            };

            let binding = if is_control {
                write_initial_value(engine, element, &decl.property);
                attach_write_back(engine, element, &decl.property);
                Binding::model(&decl.property, element)
            } else {
                let text = engine.state.borrow().get(&decl.property).display();
                let result = engine.document.borrow_mut().tree.set_text_content(element, &text);
                if let Err(err) = result {
                    tracing::warn!("Initial text for `{}` failed: {}", decl.property, err);
                }
                Binding::text(&decl.property, element)
            };
            engine.bindings.borrow_mut().register(binding);
        }
    }
}

fn bind_templates(engine: &Rc<Engine>, root: NodeId, selector: &str) {
    let found = engine.document.borrow().tree.query_selector_all(root, selector);
    let elements = match found {
        Ok(elements) => elements,
        Err(err) => {
            tracing::warn!("Skipping template scan: {}", err);
            return;
        }
    };

    for element in elements {
        let template = {
            let doc = engine.document.borrow();
            let template = engine
                .metadata
                .borrow_mut()
                .template_or_capture(element, || Template::parse(fos_html::inner_html(&doc.tree, element)));
            template
        };

        {
            let mut bindings = engine.bindings.borrow_mut();
            for property in template.properties() {
                bindings.register(Binding::text(property, element));
            }
        }
        engine.render_template(element, &template);
    }
}

fn bind_models(engine: &Rc<Engine>, root: NodeId, attribute: &str) {
    let elements = engine.document.borrow().tree.elements_with_attribute(root, attribute);

    for element in elements {
        let property = engine
            .document
            .borrow()
            .tree
            .get_attribute(element, attribute)
            .unwrap_or_default()
            .trim()
            .to_string();
        if property.is_empty() {
            continue;
        }

        engine.metadata.borrow_mut().mark_form_control(element);
        write_initial_value(engine, element, &property);
        attach_write_back(engine, element, &property);
        engine.bindings.borrow_mut().register(Binding::model(&property, element));
    }
}

fn run_extensions(engine: &Rc<Engine>, handle: &Reactive, root: NodeId) -> usize {
    let entries = engine.extensions.borrow().entries();
    let mut invoked = 0;

    for (attribute, handler) in entries {
        let elements = engine.document.borrow().tree.elements_with_attribute(root, &attribute);
        for element in elements {
            if !engine.extensions.borrow_mut().mark_applied(&attribute, element) {
                continue;
            }
            let value = engine
                .document
                .borrow()
                .tree
                .get_attribute(element, &attribute)
                .unwrap_or_default()
                .to_string();

            if let Err(err) = handler(element, &value, handle) {
                tracing::warn!("Extension `{}` failed on {:?}: {:#}", attribute, element, err);
            }
            invoked += 1;
        }
    }
    invoked
}

fn write_initial_value(engine: &Engine, element: NodeId, property: &str) {
    let value = engine.state.borrow().get(property).display();
    let result = engine.document.borrow_mut().tree.set_value(element, &value);
    if let Err(err) = result {
        tracing::warn!("Initial value for `{}` failed: {}", property, err);
    }
}

/// Install the control -> state listeners for `property` on `element`,
/// once
fn attach_write_back(engine: &Rc<Engine>, element: NodeId, property: &str) {
    if engine.metadata.borrow().has_write_back(element, property) {
        return;
    }

    let weak = Rc::downgrade(engine);
    let target_property = property.to_string();
    let listener: EventListener = Rc::new(move |event: &DomEvent| {
        let Some(engine) = weak.upgrade() else {
            return;
        };
        let value = engine.document.borrow().tree.value(event.current_target());
        engine.set(&target_property, Value::String(value));
    });

    let (input, change) = {
        let mut doc = engine.document.borrow_mut();
        let input = doc.listeners.add(element, DomEventType::Input, Rc::clone(&listener));
        let change = doc.listeners.add(element, DomEventType::Change, listener);
        (input, change)
    };
    engine.metadata.borrow_mut().add_write_back(
        element,
        WriteBack { property: property.to_string(), input, change },
    );
}

//! Edge case tests for fos-mirror
//!
//! Teardown, repeated setup, extension failures and engine isolation.

use std::cell::RefCell;
use std::rc::Rc;

use fos_dom::{DomEventType, NodeId, SharedDocument, dispatch_input};
use fos_html::parse;
use fos_mirror::{FrameQueue, Mirror, MirrorConfig, Reactive, State, Value};

fn setup(html: &str) -> (Mirror, FrameQueue, SharedDocument) {
    let document = parse(html).unwrap().shared();
    let frames = FrameQueue::new();
    let mirror = Mirror::new(Rc::clone(&document), frames.clone());
    (mirror, frames, document)
}

fn find(document: &SharedDocument, selector: &str) -> NodeId {
    let doc = document.borrow();
    doc.tree.query_selector(doc.tree.root(), selector).unwrap().unwrap()
}

fn text(document: &SharedDocument, selector: &str) -> String {
    let node = find(document, selector);
    document.borrow().tree.text_content(node)
}

/// Extension that records every `(value)` it is called with
fn recording_extension(mirror: &Mirror, attribute: &str) -> Rc<RefCell<Vec<String>>> {
    let calls: Rc<RefCell<Vec<String>>> = Rc::default();
    let seen = Rc::clone(&calls);
    mirror.extend(attribute, move |_: NodeId, value: &str, _: &Reactive| -> anyhow::Result<()> {
        seen.borrow_mut().push(value.to_string());
        Ok(())
    });
    calls
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn test_input_after_destroy_is_ignored() {
    let (mirror, frames, doc) = setup(r#"<input id="n" m-model="name">"#);
    let app = mirror.create(State::new().with("name", "Ann"), MirrorConfig::default()).unwrap();
    let input = find(&doc, "#n");
    assert_eq!(doc.borrow().listeners.count(input, DomEventType::Input), 1);

    app.destroy();
    assert_eq!(doc.borrow().listeners.count(input, DomEventType::Input), 0);
    assert_eq!(doc.borrow().listeners.count(input, DomEventType::Change), 0);

    dispatch_input(&doc, input, "Bob");
    assert_eq!(app.get("name"), Value::from("Ann"));
    assert_eq!(frames.pending(), 0);
}

#[test]
fn test_pending_flush_after_destroy_does_nothing() {
    let (mirror, frames, doc) = setup(r#"<span class="bind" id="s">{{ x }}</span>"#);
    let app = mirror.create(State::new().with("x", 1), MirrorConfig::default()).unwrap();

    app.set("x", 2);
    app.destroy();
    frames.run_until_idle(4);

    assert_eq!(text(&doc, "#s"), "1");
    assert_eq!(app.stats().flushes, 0);
    // State survives teardown
    assert_eq!(app.get("x"), Value::from(2));
}

#[test]
fn test_destroy_clears_watchers_and_bindings() {
    let (mirror, frames, _) = setup(r#"<span class="bind">{{ x }}</span>"#);
    let app = mirror.create(State::new(), MirrorConfig::default()).unwrap();
    let calls = Rc::new(RefCell::new(0));
    let seen = Rc::clone(&calls);
    app.watch("x", move |_, _| *seen.borrow_mut() += 1);
    assert_eq!(app.stats().bindings, 1);
    assert_eq!(app.stats().watchers, 1);

    app.destroy();
    assert_eq!(app.stats().bindings, 0);
    assert_eq!(app.stats().watchers, 0);

    app.set("x", 1);
    assert_eq!(*calls.borrow(), 0);
    frames.run_frame();
    assert_eq!(app.stats().dom_writes, 0);
}

#[test]
fn test_create_after_destroy_binds_again() {
    let (mirror, frames, doc) =
        setup(r#"<span class="bind" id="s">{{ x }}</span><input id="i" m-model="x"><b m-log="ext"></b>"#);
    let calls = recording_extension(&mirror, "m-log");
    let app = mirror.create(State::new().with("x", "a"), MirrorConfig::default()).unwrap();
    app.destroy();

    // The span now shows "a"; the template captured first is reused
    let app = mirror.create(State::new(), MirrorConfig::default()).unwrap();
    dispatch_input(&doc, find(&doc, "#i"), "b");
    frames.run_frame();
    assert_eq!(text(&doc, "#s"), "b");
    assert_eq!(*calls.borrow(), vec!["ext", "ext"]);
    assert_eq!(app.stats().flushes, 1);
}

#[test]
fn test_dropped_engine_ignores_input() {
    let (mirror, frames, doc) = setup(r#"<input id="i" m-model="x">"#);
    let app = mirror.create(State::new(), MirrorConfig::default()).unwrap();
    drop(app);
    drop(mirror);

    // The listener only holds a weak reference
    assert!(dispatch_input(&doc, find(&doc, "#i"), "typed"));
    assert_eq!(frames.pending(), 0);
}

// ============================================================================
// Repeated setup
// ============================================================================

#[test]
fn test_rescan_is_idempotent() {
    let (mirror, frames, doc) = setup(
        r#"<span class="bind" id="s">{{ x }} {{ x }}</span><input id="i" m-model="x"><em id="e"></em><b m-log="one"></b>"#,
    );
    let calls = recording_extension(&mirror, "m-log");
    let config = MirrorConfig::new().bind("#e", "y");

    let app = mirror.create(State::new().with("x", 1), config.clone()).unwrap();
    let first = app.stats();
    let app = mirror.create(State::new(), config).unwrap();
    let second = app.stats();

    assert_eq!(first.bindings, 3);
    assert_eq!(second.bindings, 3);
    assert_eq!(*calls.borrow(), vec!["one"]);
    let input = find(&doc, "#i");
    assert_eq!(doc.borrow().listeners.count(input, DomEventType::Input), 1);

    app.set("x", 2);
    frames.run_frame();
    assert_eq!(app.stats().dom_writes, 2);
}

#[test]
fn test_rescan_keeps_original_template() {
    let (mirror, frames, doc) = setup(r#"<span class="bind" id="s">n={{ n }}</span>"#);
    let app = mirror.create(State::new().with("n", 1), MirrorConfig::default()).unwrap();
    assert_eq!(text(&doc, "#s"), "n=1");

    // Second scan sees rendered content but reuses the captured template
    mirror.create(State::new(), MirrorConfig::default()).unwrap();
    app.set("n", 2);
    frames.run_frame();
    assert_eq!(text(&doc, "#s"), "n=2");
}

#[test]
fn test_create_merges_initial_state() {
    let (mirror, _, _) = setup("");
    let app = mirror.create(State::new().with("a", 1).with("b", 1), MirrorConfig::default()).unwrap();
    mirror.create(State::new().with("b", 2), MirrorConfig::default()).unwrap();
    assert_eq!(app.get("a"), Value::from(1));
    assert_eq!(app.get("b"), Value::from(2));
}

// ============================================================================
// Extensions
// ============================================================================

#[test]
fn test_extensions_run_once_in_document_order() {
    let (mirror, _, _) = setup(r#"<i m-log="1"></i><div><i m-log="2"></i></div><i m-log="3"></i>"#);
    let calls = recording_extension(&mirror, "m-log");
    mirror.create(State::new(), MirrorConfig::default()).unwrap();
    mirror.create(State::new(), MirrorConfig::default()).unwrap();
    assert_eq!(*calls.borrow(), vec!["1", "2", "3"]);
}

#[test]
fn test_extension_replaced_by_later_registration() {
    let (mirror, _, _) = setup(r#"<i m-log="x"></i>"#);
    let old = recording_extension(&mirror, "m-log");
    let new = recording_extension(&mirror, "m-log");
    mirror.create(State::new(), MirrorConfig::default()).unwrap();
    assert!(old.borrow().is_empty());
    assert_eq!(*new.borrow(), vec!["x"]);
}

#[test]
fn test_failing_extension_does_not_stop_setup() {
    let (mirror, _, doc) = setup(r#"<i m-bad="a"></i><i m-bad="b"></i><span class="bind" id="s">{{ v }}</span>"#);
    let calls: Rc<RefCell<Vec<String>>> = Rc::default();
    let seen = Rc::clone(&calls);
    mirror.extend("m-bad", move |_: NodeId, value: &str, _: &Reactive| -> anyhow::Result<()> {
        seen.borrow_mut().push(value.to_string());
        anyhow::bail!("cannot handle {value}")
    });

    mirror.create(State::new().with("v", "ok"), MirrorConfig::default()).unwrap();
    assert_eq!(*calls.borrow(), vec!["a", "b"]);
    assert_eq!(text(&doc, "#s"), "ok");
}

#[test]
fn test_extension_sees_bound_dom() {
    let (mirror, _, doc) = setup(r#"<span class="bind" id="s" m-peek="">{{ v }}</span>"#);
    let seen: Rc<RefCell<Option<String>>> = Rc::default();
    let slot = Rc::clone(&seen);
    let peek_doc = Rc::clone(&doc);
    mirror.extend("m-peek", move |element: NodeId, _: &str, state: &Reactive| -> anyhow::Result<()> {
        *slot.borrow_mut() = Some(peek_doc.borrow().tree.text_content(element));
        state.set("touched", true);
        Ok(())
    });

    let app = mirror.create(State::new().with("v", "bound"), MirrorConfig::default()).unwrap();
    assert_eq!(seen.borrow().as_deref(), Some("bound"));
    assert_eq!(app.get("touched"), Value::Bool(true));
}

// ============================================================================
// Values
// ============================================================================

#[test]
fn test_shallow_reactivity() {
    let (mirror, frames, _) = setup(r#"<span class="bind">{{ items }}</span>"#);
    let app = mirror
        .create(State::new().with("items", Value::list([1, 2])), MirrorConfig::default())
        .unwrap();

    // Same list handle: not a change
    let same = app.get("items");
    app.set("items", same);
    assert_eq!(frames.pending(), 0);

    // Equal contents, new list: a change
    app.set("items", Value::list([1, 2]));
    assert_eq!(frames.pending(), 1);
}

#[test]
fn test_null_and_missing_render_empty() {
    let (mirror, frames, doc) = setup(r#"<span class="bind" id="s">{{ a }}</span><input id="i" m-model="a">"#);
    let app = mirror.create(State::new().with("a", "x"), MirrorConfig::default()).unwrap();
    app.set("a", Value::Null);
    frames.run_frame();
    assert_eq!(text(&doc, "#s"), "");
    let input = find(&doc, "#i");
    assert_eq!(doc.borrow().tree.value(input), "");
}

#[test]
fn test_number_display() {
    let (mirror, _, doc) = setup(r#"<span class="bind" id="s">{{ a }}|{{ b }}|{{ c }}</span>"#);
    mirror
        .create(
            State::new().with("a", 3.0).with("b", 0.5).with("c", f64::NAN),
            MirrorConfig::default(),
        )
        .unwrap();
    assert_eq!(text(&doc, "#s"), "3|0.5|NaN");
}

#[test]
fn test_nan_write_is_always_a_change() {
    let (mirror, frames, _) = setup("");
    let app = mirror.create(State::new().with("n", f64::NAN), MirrorConfig::default()).unwrap();
    let calls = Rc::new(RefCell::new(0));
    let seen = Rc::clone(&calls);
    app.watch("n", move |_, _| *seen.borrow_mut() += 1);
    app.set("n", f64::NAN);
    assert_eq!(*calls.borrow(), 1);
    assert_eq!(frames.pending(), 1);
}

// ============================================================================
// Isolation and selectors
// ============================================================================

#[test]
fn test_two_engines_do_not_share_registries() {
    let document = parse(r#"<section id="a"><b class="bind" id="x">{{ v }}</b></section><section id="b"><b class="bind" id="y">{{ v }}</b></section>"#)
        .unwrap()
        .shared();
    let frames = FrameQueue::new();
    let first = Mirror::new(Rc::clone(&document), frames.clone());
    let second = Mirror::new(Rc::clone(&document), frames.clone());

    let a = first.create(State::new().with("v", "A"), MirrorConfig::new().root_selector("#a")).unwrap();
    let b = second.create(State::new().with("v", "B"), MirrorConfig::new().root_selector("#b")).unwrap();

    a.set("v", "A2");
    frames.run_frame();
    assert_eq!(text(&document, "#x"), "A2");
    assert_eq!(text(&document, "#y"), "B");
    assert_eq!(b.get("v"), Value::from("B"));
    assert_eq!(b.stats().flushes, 0);
}

#[test]
fn test_invalid_binding_selector_is_skipped() {
    let (mirror, _, doc) = setup(r#"<p id="p">old</p>"#);
    mirror
        .create(
            State::new().with("t", "new"),
            MirrorConfig::new().bind("[broken", "t").bind("#p", "t"),
        )
        .unwrap();
    assert_eq!(text(&doc, "#p"), "new");
}

#[test]
fn test_empty_model_attribute_is_skipped() {
    let (mirror, _, doc) = setup(r#"<input id="i" m-model="  ">"#);
    let app = mirror.create(State::new(), MirrorConfig::default()).unwrap();
    let input = find(&doc, "#i");
    assert_eq!(doc.borrow().listeners.count(input, DomEventType::Input), 0);
    assert_eq!(app.stats().bindings, 0);
}

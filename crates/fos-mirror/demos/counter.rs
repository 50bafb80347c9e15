//! Example: counter and greeting bound to a parsed page
//!
//! Run with `RUST_LOG=fos_mirror=debug` to see the setup scan.

use std::rc::Rc;

use fos_dom::{DomEvent, DomEventType, dispatch_event, dispatch_input};
use fos_mirror::{FrameQueue, Mirror, MirrorConfig, State, Value, catalog};

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<body>
  <main id="app">
    <h1 class="bind">Hello, {{ name }}!</h1>
    <input id="name" m-model="name">
    <p class="bind">Clicked {{ count }} times</p>
    <p m-show="count">You found the button.</p>
    <button id="reset" m-reset="name">Reset name</button>
  </main>
</body>
</html>"#;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let document = fos_html::parse(PAGE)?.shared();
    let frames = FrameQueue::new();
    let mirror = Mirror::new(Rc::clone(&document), frames.clone());
    catalog::install(&mirror);

    mirror.watch("count", |new, old| {
        tracing::info!("count: {} -> {}", old, new);
    });

    let app = mirror.create(
        State::new().with("name", "world").with("count", 0),
        MirrorConfig::new().root_selector("#app"),
    )?;
    print_app(&document);

    for _ in 0..3 {
        app.update("count", |n| Value::from(n.as_f64().unwrap_or(0.0) + 1.0));
    }
    let (input, button) = {
        let doc = document.borrow();
        let root = doc.tree.root();
        (
            doc.tree.query_selector(root, "#name")?,
            doc.tree.query_selector(root, "#reset")?,
        )
    };
    if let Some(input) = input {
        dispatch_input(&document, input, "fOS");
    }
    frames.run_until_idle(8);
    print_app(&document);

    if let Some(button) = button {
        dispatch_event(&document, DomEvent::new(DomEventType::Click, button));
    }
    frames.run_until_idle(8);
    print_app(&document);

    println!("{:?}", app.stats());
    Ok(())
}

fn print_app(document: &fos_dom::SharedDocument) {
    let doc = document.borrow();
    if let Ok(Some(app)) = doc.tree.query_selector(doc.tree.root(), "#app") {
        println!("{}\n", fos_html::outer_html(&doc.tree, app));
    }
}

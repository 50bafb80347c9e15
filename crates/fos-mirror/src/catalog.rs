//! Ready-made extensions
//!
//! Each handler applies once at setup and subscribes a watcher so the
//! element keeps following its property. Register them all with
//! [`install`]; persistence needs a backend and is registered separately
//! through [`storage`].
//!
//! | attribute | value | effect |
//! |-----------|-------|--------|
//! | `m-show`  | `prop` | `display: block` when truthy, `none` otherwise |
//! | `m-hide`  | `prop` | the inverse of `m-show` |
//! | `m-if`    | `prop` | `hidden` attribute when falsy |
//! | `m-class` | `class:prop` | toggles `class` by truthiness |
//! | `m-count` | `prop` | list length, the value, or `0` |
//! | `m-each`  | `item in prop` | one `data-template` copy per list item |
//! | `m-empty` | `prop` | shown only while the list is empty |
//! | `m-style` | `cssProperty:prop` | inline style from the value |
//! | `m-progress` | `prop` | width `0..=100%` and `aria-valuenow` |
//! | `m-format` | `kind:prop` | formatted text (`currency`, `number`, case changes) |
//! | `m-toggle` | `class` | on click, toggles `class` |
//! | `m-reset` | `a, b` | on click, sets each property to `""` |
//! | `m-storage` | `key` | loads and persists the whole state |

use std::rc::Rc;

use anyhow::Context;
use fos_dom::{DomError, DomEvent, DomEventType, NodeId};

use crate::{Mirror, Reactive, StateStorage, StorageError, Value};

pub const SHOW: &str = "m-show";
pub const HIDE: &str = "m-hide";
pub const IF: &str = "m-if";
pub const CLASS: &str = "m-class";
pub const COUNT: &str = "m-count";
pub const EACH: &str = "m-each";
pub const EMPTY: &str = "m-empty";
pub const STYLE: &str = "m-style";
pub const PROGRESS: &str = "m-progress";
pub const FORMAT: &str = "m-format";
pub const TOGGLE: &str = "m-toggle";
pub const RESET: &str = "m-reset";
pub const STORAGE: &str = "m-storage";

/// Register every catalog extension except `m-storage`
pub fn install(mirror: &Mirror) {
    mirror.extend(SHOW, show);
    mirror.extend(HIDE, hide);
    mirror.extend(IF, when);
    mirror.extend(CLASS, class);
    mirror.extend(COUNT, count);
    mirror.extend(EACH, each);
    mirror.extend(EMPTY, empty);
    mirror.extend(STYLE, style);
    mirror.extend(PROGRESS, progress);
    mirror.extend(FORMAT, format);
    mirror.extend(TOGGLE, toggle);
    mirror.extend(RESET, reset);
}

/// `m-show="prop"`
pub fn show(element: NodeId, property: &str, state: &Reactive) -> anyhow::Result<()> {
    display_when(element, property.trim(), state, true)
}

/// `m-hide="prop"`
pub fn hide(element: NodeId, property: &str, state: &Reactive) -> anyhow::Result<()> {
    display_when(element, property.trim(), state, false)
}

fn display_when(element: NodeId, property: &str, state: &Reactive, shown_if: bool) -> anyhow::Result<()> {
    let document = state.document();
    follow(state, property, move |value| {
        let display = if value.truthy() == shown_if { "block" } else { "none" };
        document.borrow_mut().tree.set_style_property(element, "display", display)
    })
}

/// `m-if="prop"`: falsy sets `hidden`; truthy clears `hidden` and any
/// inline `display`
pub fn when(element: NodeId, property: &str, state: &Reactive) -> anyhow::Result<()> {
    let document = state.document();
    follow(state, property.trim(), move |value: &Value| -> Result<(), DomError> {
        let mut doc = document.borrow_mut();
        let tree = &mut doc.tree;
        if value.truthy() {
            if tree.style_property(element, "display").is_some() {
                tree.remove_style_property(element, "display")?;
            }
            tree.remove_attribute(element, "hidden");
            Ok(())
        } else {
            tree.set_attribute(element, "hidden", "")
        }
    })
}

/// `m-class="className:prop"`
pub fn class(element: NodeId, expr: &str, state: &Reactive) -> anyhow::Result<()> {
    let (class_name, property) = split_pair(expr)?;
    let document = state.document();
    follow(state, &property, move |value| {
        document
            .borrow_mut()
            .tree
            .toggle_class(element, &class_name, Some(value.truthy()))
            .map(|_| ())
    })
}

/// `m-count="prop"`
pub fn count(element: NodeId, property: &str, state: &Reactive) -> anyhow::Result<()> {
    let document = state.document();
    follow(state, property.trim(), move |value| {
        let text = match value {
            Value::List(items) => items.len().to_string(),
            other if other.truthy() => other.display(),
            _ => "0".to_string(),
        };
        document.borrow_mut().tree.set_text_content(element, &text)
    })
}

/// `m-each="item in prop"`: replaces the children with one copy of the
/// element's `data-template` per list item. `{{item}}` (or the declared
/// item name) takes the item, `{{index}}` its position. Lists and maps
/// are inserted as JSON. A missing or non-list value renders nothing.
pub fn each(element: NodeId, expr: &str, state: &Reactive) -> anyhow::Result<()> {
    let (item_name, property) = expr
        .split_once(" in ")
        .map(|(item, list)| (item.trim(), list.trim()))
        .filter(|(item, list)| !item.is_empty() && !list.is_empty())
        .with_context(|| format!("expected `item in property`, got `{expr}`"))?;

    let document = state.document();
    let template = document
        .borrow()
        .tree
        .get_attribute(element, "data-template")
        .map(str::to_string)
        .unwrap_or_else(|| format!("<div>{{{{{item_name}}}}}</div>"));
    let item_placeholder = format!("{{{{{item_name}}}}}");

    follow(state, property, move |value| {
        let items = value.as_list().unwrap_or_default();
        let markup: String = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let shown = match item {
                    Value::List(_) | Value::Map(_) | Value::Null => item.to_json().to_string(),
                    other => other.display(),
                };
                template
                    .replace("{{item}}", &shown)
                    .replace(&item_placeholder, &shown)
                    .replace("{{index}}", &index.to_string())
            })
            .collect();
        fos_html::set_inner_html(&mut document.borrow_mut().tree, element, &markup).map(|_| ())
    })
}

/// `m-empty="prop"`: `display: block` while the value is an empty list
/// or falsy, `none` otherwise
pub fn empty(element: NodeId, property: &str, state: &Reactive) -> anyhow::Result<()> {
    let document = state.document();
    follow(state, property.trim(), move |value| {
        let is_empty = match value {
            Value::List(items) => items.is_empty(),
            other => !other.truthy(),
        };
        let display = if is_empty { "block" } else { "none" };
        document.borrow_mut().tree.set_style_property(element, "display", display)
    })
}

/// `m-style="cssProperty:prop"`; a `Null` value leaves the style alone
pub fn style(element: NodeId, expr: &str, state: &Reactive) -> anyhow::Result<()> {
    let (css_property, property) = split_pair(expr)?;
    let document = state.document();
    follow(state, &property, move |value| {
        if value.is_null() {
            return Ok(());
        }
        document
            .borrow_mut()
            .tree
            .set_style_property(element, &css_property, &value.display())
    })
}

/// `m-progress="prop"`: the value clamped to `0..=100` becomes the
/// element's width in percent and its `aria-valuenow`. With
/// `data-show-text="true"` the rounded percentage is also its text.
pub fn progress(element: NodeId, property: &str, state: &Reactive) -> anyhow::Result<()> {
    let document = state.document();
    let show_text = document.borrow().tree.get_attribute(element, "data-show-text") == Some("true");
    follow(state, property.trim(), move |value: &Value| -> Result<(), DomError> {
        let number = value.to_number();
        let percent = if number.is_nan() { 0.0 } else { number.clamp(0.0, 100.0) };
        let shown = Value::from(percent).display();

        let mut doc = document.borrow_mut();
        let tree = &mut doc.tree;
        tree.set_style_property(element, "width", &format!("{shown}%"))?;
        tree.set_attribute(element, "aria-valuenow", &shown)?;
        if show_text {
            tree.set_text_content(element, &format!("{}%", percent.round()))?;
        }
        Ok(())
    })
}

/// `m-format="kind:prop"`
///
/// Kinds: `currency` (US dollars), `number` (grouped, up to three
/// decimals), `uppercase`, `lowercase`, `capitalize`. Any other kind
/// shows the value as is.
pub fn format(element: NodeId, expr: &str, state: &Reactive) -> anyhow::Result<()> {
    let (kind, property) = split_pair(expr)?;
    let kind = Format::parse(&kind);
    let document = state.document();
    follow(state, &property, move |value| {
        document.borrow_mut().tree.set_text_content(element, &kind.apply(value))
    })
}

/// Text conversions offered by `m-format`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Currency,
    Number,
    Uppercase,
    Lowercase,
    Capitalize,
    Plain,
}

impl Format {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "currency" => Format::Currency,
            "number" => Format::Number,
            "uppercase" => Format::Uppercase,
            "lowercase" => Format::Lowercase,
            "capitalize" => Format::Capitalize,
            _ => Format::Plain,
        }
    }

    /// Format a value. Falsy values count as 0 for the numeric kinds and
    /// as `""` for the rest.
    pub fn apply(self, value: &Value) -> String {
        let text = || if value.truthy() { value.display() } else { String::new() };
        match self {
            Format::Currency => format_currency(value.to_number()),
            Format::Number => format_grouped(value.to_number()),
            Format::Uppercase => text().to_uppercase(),
            Format::Lowercase => text().to_lowercase(),
            Format::Capitalize => {
                let text = text();
                let mut chars = text.chars();
                match chars.next() {
                    Some(first) => {
                        let rest = chars.as_str().to_lowercase();
                        first.to_uppercase().chain(rest.chars()).collect()
                    }
                    None => String::new(),
                }
            }
            Format::Plain => text(),
        }
    }
}

/// `$1,234.50`, `-$0.99`
fn format_currency(n: f64) -> String {
    if !n.is_finite() {
        return format!("${}", non_finite(n));
    }
    let fixed = format!("{:.2}", n.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if n < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}${}.{cents}", group_digits(whole))
}

/// `1,234.568`: at most three decimals, trailing zeros dropped
fn format_grouped(n: f64) -> String {
    if !n.is_finite() {
        return non_finite(n).to_string();
    }
    let fixed = format!("{:.3}", n.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');
    let sign = if n < 0.0 && (whole != "0" || !fraction.is_empty()) { "-" } else { "" };
    if fraction.is_empty() {
        format!("{sign}{}", group_digits(whole))
    } else {
        format!("{sign}{}.{fraction}", group_digits(whole))
    }
}

fn non_finite(n: f64) -> &'static str {
    if n.is_nan() {
        "NaN"
    } else if n > 0.0 {
        "∞"
    } else {
        "-∞"
    }
}

/// Comma every three digits from the right
fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// `m-toggle="className"`: each click flips the class
pub fn toggle(element: NodeId, class_name: &str, state: &Reactive) -> anyhow::Result<()> {
    let class_name = class_name.trim().to_string();
    if class_name.is_empty() {
        anyhow::bail!("m-toggle needs a class name");
    }

    let weak = state.downgrade();
    state.document().borrow_mut().listeners.add(
        element,
        DomEventType::Click,
        Rc::new(move |_: &DomEvent| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let result = state.document().borrow_mut().tree.toggle_class(element, &class_name, None);
            if let Err(err) = result {
                tracing::warn!("Toggling `{}` failed: {}", class_name, err);
            }
        }),
    );
    Ok(())
}

/// `m-reset="a, b"`
pub fn reset(element: NodeId, expr: &str, state: &Reactive) -> anyhow::Result<()> {
    let properties: Vec<String> = expr
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if properties.is_empty() {
        anyhow::bail!("m-reset needs at least one property");
    }

    let weak = state.downgrade();
    state.document().borrow_mut().listeners.add(
        element,
        DomEventType::Click,
        Rc::new(move |_: &DomEvent| {
            if let Some(state) = weak.upgrade() {
                for property in &properties {
                    state.set(property, "");
                }
            }
        }),
    );
    Ok(())
}

/// `m-storage="key"`: load the object stored under `key` into the state,
/// then save the whole state whenever a property present at that point
/// changes. Storage failures are logged, never raised into the write path.
pub fn storage(
    backend: Rc<dyn StateStorage>,
) -> impl Fn(NodeId, &str, &Reactive) -> anyhow::Result<()> + 'static {
    move |_element: NodeId, key: &str, state: &Reactive| -> anyhow::Result<()> {
        let key = key.trim().to_string();
        if let Err(err) = load_into(backend.as_ref(), &key, state) {
            tracing::warn!("Failed to load state from `{}`: {}", key, err);
        }

        let properties: Vec<String> = state.snapshot().keys().map(str::to_string).collect();
        for property in properties {
            let backend = Rc::clone(&backend);
            let key = key.clone();
            let weak = state.downgrade();
            state.watch(&property, move |_, _| {
                let Some(state) = weak.upgrade() else {
                    return;
                };
                if let Err(err) = save_from(backend.as_ref(), &key, &state) {
                    tracing::warn!("Failed to save state to `{}`: {}", key, err);
                }
            });
        }
        Ok(())
    }
}

fn load_into(backend: &dyn StateStorage, key: &str, state: &Reactive) -> Result<(), StorageError> {
    let Some(text) = backend.load(key)? else {
        return Ok(());
    };
    let json: serde_json::Value = serde_json::from_str(&text)?;
    let serde_json::Value::Object(entries) = json else {
        return Err(StorageError::NotAnObject(key.to_string()));
    };
    for (property, value) in &entries {
        state.set(property, Value::from(value));
    }
    Ok(())
}

fn save_from(backend: &dyn StateStorage, key: &str, state: &Reactive) -> Result<(), StorageError> {
    let text = serde_json::to_string(&state.snapshot().to_json())?;
    backend.save(key, &text)
}

/// Apply `update` with the current value now and on every later change
fn follow<F, E>(state: &Reactive, property: &str, update: F) -> anyhow::Result<()>
where
    F: Fn(&Value) -> Result<(), E> + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    update(&state.get(property)).with_context(|| format!("initial update for `{property}`"))?;

    let name = property.to_string();
    state.watch(property, move |value, _| {
        if let Err(err) = update(value) {
            tracing::warn!("Update for `{}` failed: {}", name, err);
        }
    });
    Ok(())
}

/// `left:right`, both sides trimmed and non-empty
fn split_pair(expr: &str) -> anyhow::Result<(String, String)> {
    let (left, right) = expr
        .split_once(':')
        .with_context(|| format!("expected `name:property`, got `{expr}`"))?;
    let (left, right) = (left.trim(), right.trim());
    if left.is_empty() || right.is_empty() {
        anyhow::bail!("expected `name:property`, got `{expr}`");
    }
    Ok((left.to_string(), right.to_string()))
}

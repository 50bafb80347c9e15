//! State values
//!
//! Scalars compare by value, lists and maps by reference. Replacing a
//! list with a new `Rc` is a change; mutating a shared one in place is
//! not something the engine can observe.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// A state property value
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Absent or explicitly empty. Missing properties read as `Null`.
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Rc<Vec<Value>>),
    Map(Rc<IndexMap<String, Value>>),
}

impl Value {
    /// Build a list value
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::List(Rc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Build a map value
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(Rc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        ))
    }

    /// Strict identity: the dirty check behind every write.
    ///
    /// `NaN` is never the same as itself; containers compare by pointer.
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Truthiness: `Null`, `false`, `0`, `NaN` and `""` are falsy
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::List(_) | Value::Map(_) => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric coercion: `Null` and `""` give 0, booleans 0/1, numeric
    /// strings their value, everything else `NaN`
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => match s.trim() {
                "" => 0.0,
                "Infinity" | "+Infinity" => f64::INFINITY,
                "-Infinity" => f64::NEG_INFINITY,
                text if text.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
                text => text.parse().unwrap_or(f64::NAN),
            },
            Value::List(_) | Value::Map(_) => f64::NAN,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Display form used when writing into text, markup and control values.
    /// `Null` renders as the empty string.
    pub fn display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::display)
                .collect::<Vec<_>>()
                .join(","),
            Value::Map(_) => "[object Object]".to_string(),
        }
    }

    /// Convert to JSON. Non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => serde_json::Value::Object(
                entries.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == 0.0 {
        // covers -0
        "0".to_string()
    } else if !(1e-6..1e21).contains(&n.abs()) {
        exponent_form(n)
    } else if n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

/// `1e-7`, `1.5e+21`: shortest mantissa, signed exponent
fn exponent_form(n: f64) -> String {
    let formatted = format!("{:e}", n);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{mantissa}e+{exponent}"),
        _ => formatted,
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() <= i64::MAX as f64 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Value::Number(n as f64)
            }
        })*
    };
}

from_integer!(i32, i64, u32, u64, usize);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(Rc::new(items))
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Value::Map(Rc::new(entries))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::list(items.iter().map(Value::from)),
            serde_json::Value::Object(entries) => {
                Value::map(entries.iter().map(|(k, v)| (k.clone(), Value::from(v))))
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        assert!(Value::from(3).is_same(&Value::from(3.0)));
        assert!(Value::from("a").is_same(&Value::from("a")));
        assert!(!Value::from(f64::NAN).is_same(&Value::from(f64::NAN)));
        assert!(!Value::from("1").is_same(&Value::from(1)));

        let list = Value::list([1, 2]);
        assert!(list.is_same(&list.clone()));
        assert!(!list.is_same(&Value::list([1, 2])));
        // structurally equal all the same
        assert_eq!(list, Value::list([1, 2]));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.display(), "");
        assert_eq!(Value::from(30).display(), "30");
        assert_eq!(Value::from(-0.0).display(), "0");
        assert_eq!(Value::from(2.5).display(), "2.5");
        assert_eq!(Value::from(f64::INFINITY).display(), "Infinity");
        assert_eq!(Value::from(f64::NAN).display(), "NaN");
        assert_eq!(Value::from(true).display(), "true");
        assert_eq!(Value::list(["a", "b"]).display(), "a,b");
        assert_eq!(Value::map([("k", 1)]).display(), "[object Object]");
    }

    #[test]
    fn test_number_display() {
        assert_eq!(Value::from(0.000001).display(), "0.000001");
        assert_eq!(Value::from(1e-7).display(), "1e-7");
        assert_eq!(Value::from(-2.5e-9).display(), "-2.5e-9");
        assert_eq!(Value::from(1e20).display(), "100000000000000000000");
        assert_eq!(Value::from(1e21).display(), "1e+21");
        assert_eq!(Value::from(-1.5e300).display(), "-1.5e+300");
        assert_eq!(Value::from(0.1 + 0.2).display(), "0.30000000000000004");
        assert_eq!(Value::from(123.456).display(), "123.456");
    }

    #[test]
    fn test_to_number() {
        assert_eq!(Value::Null.to_number(), 0.0);
        assert_eq!(Value::from(true).to_number(), 1.0);
        assert_eq!(Value::from(" 42.5 ").to_number(), 42.5);
        assert_eq!(Value::from("").to_number(), 0.0);
        assert_eq!(Value::from("1e3").to_number(), 1000.0);
        assert!(Value::from("abc").to_number().is_nan());
        assert!(Value::from("inf").to_number().is_nan());
        assert!(Value::list([1]).to_number().is_nan());
    }

    #[test]
    fn test_truthy() {
        for falsy in [Value::Null, false.into(), 0.into(), f64::NAN.into(), "".into()] {
            assert!(!falsy.truthy(), "{falsy:?} should be falsy");
        }
        for truthy in [true.into(), 1.into(), "0".into(), Value::list(Vec::<Value>::new())] {
            assert!(truthy.truthy(), "{truthy:?} should be truthy");
        }
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({"name": "Ada", "age": 36, "tags": ["x"], "ratio": 0.5});
        let value = Value::from(&json);
        assert_eq!(value.to_json(), json);
        assert_eq!(Value::from(f64::NAN).to_json(), serde_json::Value::Null);
    }
}

//! State - ordered property map

use indexmap::IndexMap;

use crate::{MirrorError, Value};

/// The application's property map.
///
/// Insertion order is kept so that JSON export and key iteration are
/// stable across runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    props: IndexMap<String, Value>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.props.insert(property.to_string(), value.into());
        self
    }

    /// Current value; missing properties read as `Null`
    pub fn get(&self, property: &str) -> Value {
        self.props.get(property).cloned().unwrap_or_default()
    }

    /// Borrow a value without cloning
    pub fn get_ref(&self, property: &str) -> Option<&Value> {
        self.props.get(property)
    }

    /// Store a value, returning the previous one
    pub fn insert(&mut self, property: &str, value: Value) -> Option<Value> {
        self.props.insert(property.to_string(), value)
    }

    pub fn contains(&self, property: &str) -> bool {
        self.props.contains_key(property)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.props.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Build from a JSON object
    pub fn from_json(json: &serde_json::Value) -> Result<Self, MirrorError> {
        let serde_json::Value::Object(entries) = json else {
            return Err(MirrorError::Config("state must be a JSON object".to_string()));
        };
        Ok(entries.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect())
    }

    /// Parse a JSON object from text
    pub fn from_json_str(text: &str) -> Result<Self, MirrorError> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        Self::from_json(&json)
    }

    /// Export as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.props.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
        )
    }
}

impl FromIterator<(String, Value)> for State {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self { props: iter.into_iter().collect() }
    }
}

impl IntoIterator for State {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.props.into_iter()
    }
}

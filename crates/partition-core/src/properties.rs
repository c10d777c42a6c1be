//! Schemaless property bag attached to tenants, partitions and roles.
//!
//! The bag doubles as application metadata and as the landing area for
//! fields returned by the identity provider, so values arrive in whatever
//! shape the writer used. Everything is coerced into [`PropertyValue`] at
//! the two boundaries (API map and registry JSON) and list-valued registry
//! keys are always held as [`PropertyValue::List`].

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Registry fields that must always be stored as a list of strings.
pub const LIST_KEYS: &[&str] = &[
    "redirect_uris",
    "audience",
    "grant_types",
    "response_types",
    "contacts",
    "allowed_cors_origins",
    "post_logout_redirect_uris",
];

/// A single property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    List(Vec<String>),
    Number(Number),
    Bool(bool),
}

impl PropertyValue {
    /// Coerce an arbitrary JSON value. `null` has no representation and
    /// yields `None`.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(PropertyValue::Text(s)),
            Value::Bool(b) => Some(PropertyValue::Bool(b)),
            Value::Number(n) => Some(PropertyValue::Number(n)),
            Value::Array(items) => Some(PropertyValue::List(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Null => None,
                        Value::String(s) => Some(s),
                        other => Some(other.to_string()),
                    })
                    .collect(),
            )),
            obj @ Value::Object(_) => Some(PropertyValue::Text(obj.to_string())),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            PropertyValue::Text(s) => Value::String(s.clone()),
            PropertyValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            PropertyValue::Number(n) => Value::Number(n.clone()),
            PropertyValue::Bool(b) => Value::Bool(*b),
        }
    }

    /// Returns the string if this is a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Flat string form used by the API map. Lists are comma-joined so a
    /// value read back out can be written back in unchanged.
    pub fn to_api_string(&self) -> String {
        match self {
            PropertyValue::Text(s) => s.clone(),
            PropertyValue::List(items) => items.join(","),
            PropertyValue::Number(n) => n.to_string(),
            PropertyValue::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        PropertyValue::List(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

/// Split a list that was written as a single string.
///
/// Accepts `a,b`, `[a, b]` and `["a","b"]`. Entries are trimmed and
/// empty entries dropped.
pub fn split_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);

    inner
        .split(',')
        .map(|part| part.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_list_key(key: &str) -> bool {
    LIST_KEYS.contains(&key)
}

fn normalize(key: &str, value: PropertyValue) -> PropertyValue {
    match value {
        PropertyValue::Text(raw) if is_list_key(key) => PropertyValue::List(split_list(&raw)),
        other => other,
    }
}

/// Ordered string-keyed map of [`PropertyValue`]s.
///
/// Serializes as a plain JSON object so the bag can be stored in a
/// flexible object column and carried inside queue messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct PropertyBag {
    entries: BTreeMap<String, PropertyValue>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.get(key)
    }

    /// Text value for `key`; `None` when absent or not a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(PropertyValue::as_str)
    }

    /// List value for `key`, splitting a comma-joined string if the key
    /// was written before normalization existed.
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        match self.entries.get(key)? {
            PropertyValue::List(items) => Some(items.clone()),
            PropertyValue::Text(raw) => Some(split_list(raw)),
            other => Some(vec![other.to_api_string()]),
        }
    }

    /// Insert a value, normalizing list-valued registry keys.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        let key = key.into();
        let value = normalize(&key, value.into());
        self.entries.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.entries.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.entries.iter()
    }

    /// Overwrite entries with every key from `other`.
    pub fn merge(&mut self, other: PropertyBag) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    /// Overwrite entries with every key of a registry JSON object. A
    /// `null` clears the key.
    pub fn merge_json(&mut self, object: Map<String, Value>) {
        for (key, value) in object {
            match PropertyValue::from_json(value) {
                Some(v) => self.insert(key, v),
                None => {
                    self.entries.remove(&key);
                }
            }
        }
    }

    pub fn from_json_map(object: Map<String, Value>) -> Self {
        let mut bag = Self::new();
        bag.merge_json(object);
        bag
    }

    /// Coerce a stored JSON value. Anything but an object yields an
    /// empty bag.
    pub fn from_json_value(value: Value) -> Self {
        match value {
            Value::Object(object) => Self::from_json_map(object),
            _ => Self::new(),
        }
    }

    pub fn to_json_map(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }

    pub fn to_json_value(&self) -> Value {
        Value::Object(self.to_json_map())
    }

    /// Decode the string map used at the API boundary.
    pub fn from_api_map(map: HashMap<String, String>) -> Self {
        let mut bag = Self::new();
        for (key, value) in map {
            bag.insert(key, PropertyValue::Text(value));
        }
        bag
    }

    /// Encode into the string map used at the API boundary.
    pub fn to_api_map(&self) -> HashMap<String, String> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_api_string()))
            .collect()
    }
}

impl From<Map<String, Value>> for PropertyBag {
    fn from(object: Map<String, Value>) -> Self {
        Self::from_json_map(object)
    }
}

impl From<PropertyBag> for Map<String, Value> {
    fn from(bag: PropertyBag) -> Self {
        bag.to_json_map()
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = Self::new();
        for (k, v) in iter {
            bag.insert(k, v);
        }
        bag
    }
}

//! Predicate - example documents used to select a subset of a collection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Document;
use crate::error::StoreError;

/// A partial document. A document matches when every attribute path in the
/// example holds the same value in the document (a missing attribute
/// compares equal to `null`).
///
/// Nested objects and dotted keys both address nested attributes:
/// `{"a": {"b": 1}}` and `{"a.b": 1}` select the same documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Predicate(Map<String, Value>);

impl Predicate {
    /// The empty example; matches every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Build from a JSON value. Only objects are examples.
    pub fn example(value: Value) -> Result<Self, StoreError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::all()),
            other => Err(StoreError::Validation(format!(
                "example must be an object, got {}",
                other
            ))),
        }
    }

    /// Add an attribute to the example.
    pub fn with(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(path.into(), value.into());
        self
    }

    pub fn is_all(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Flatten into `(attribute path, expected value)` pairs.
    pub fn leaves(&self) -> Vec<(Vec<String>, &Value)> {
        let mut out = Vec::new();
        collect_leaves(&self.0, &mut Vec::new(), &mut out);
        out
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.leaves()
            .into_iter()
            .all(|(path, expected)| leaf_matches(doc, &path, expected))
    }
}

impl From<Map<String, Value>> for Predicate {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn collect_leaves<'a>(
    map: &'a Map<String, Value>,
    prefix: &mut Vec<String>,
    out: &mut Vec<(Vec<String>, &'a Value)>,
) {
    for (name, value) in map {
        let depth = prefix.len();
        prefix.extend(name.split('.').map(str::to_string));
        match value {
            Value::Object(nested) if !nested.is_empty() => collect_leaves(nested, prefix, out),
            _ => out.push((prefix.clone(), value)),
        }
        prefix.truncate(depth);
    }
}

fn leaf_matches(doc: &Document, path: &[String], expected: &Value) -> bool {
    if let [single] = path {
        let meta = doc.meta();
        let identity = match single.as_str() {
            super::ID_FIELD => Some(&meta.id),
            super::KEY_FIELD => Some(&meta.key),
            super::REV_FIELD => Some(&meta.rev),
            _ => None,
        };
        if let Some(actual) = identity {
            return expected.as_str() == Some(actual.as_str());
        }
    }

    let mut current = match path.first().and_then(|head| doc.fields().get(head)) {
        Some(value) => value,
        None => return expected.is_null(),
    };
    for segment in &path[1..] {
        current = match current.get(segment) {
            Some(value) => value,
            None => return expected.is_null(),
        };
    }
    current == expected
}

//! Documents - typed entities with store-assigned identity.
//!
//! Every document returned by a driver carries the identity triple
//! `_id` / `_key` / `_rev`. The adapter never fabricates these; they are
//! read out of the store's response at the driver boundary.
//!
//! ## Example
//!
//! ```ignore
//! use docstore_adapter::{Document, Predicate};
//! use serde_json::json;
//!
//! let doc: Document = serde_json::from_value(json!({
//!     "_id": "markets/1", "_key": "1", "_rev": "_a1", "name": "A"
//! }))?;
//! assert_eq!(doc.key(), "1");
//! assert!(Predicate::example(json!({ "name": "A" }))?.matches(&doc));
//! ```

mod cursor;
mod handle;
mod predicate;
mod result;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

pub use cursor::Cursor;
pub use handle::{is_valid_key, DocumentHandle};
pub use predicate::Predicate;
pub use result::{BulkResult, RemoveSummary, WriteResult};

/// Field names the store reserves for identity.
pub const ID_FIELD: &str = "_id";
pub const KEY_FIELD: &str = "_key";
pub const REV_FIELD: &str = "_rev";

/// Store-assigned identity of a persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentMeta {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_rev")]
    pub rev: String,
}

impl DocumentMeta {
    pub fn new(collection: &str, key: impl Into<String>, rev: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            id: format!("{}/{}", collection, key),
            key,
            rev: rev.into(),
        }
    }
}

/// A persisted document: identity plus user fields.
///
/// Serializes to a flat JSON object (`{"_id", "_key", "_rev", ...fields}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Document {
    meta: DocumentMeta,
    fields: Map<String, Value>,
}

impl Document {
    /// Build a document from identity and user fields. Identity fields
    /// present in `fields` are dropped.
    pub fn new(meta: DocumentMeta, mut fields: Map<String, Value>) -> Self {
        strip_identity(&mut fields);
        Self { meta, fields }
    }

    pub fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    pub fn id(&self) -> &str {
        &self.meta.id
    }

    pub fn key(&self) -> &str {
        &self.meta.key
    }

    pub fn rev(&self) -> &str {
        &self.meta.rev
    }

    /// User fields, without identity.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    /// Get a user field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Deserialize the whole document (identity included) into a typed struct.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(Value::Object(self.clone().into()))?)
    }

    /// Consume into a flat JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.into())
    }

    pub(crate) fn set_rev(&mut self, rev: impl Into<String>) {
        self.meta.rev = rev.into();
    }
}

impl TryFrom<Map<String, Value>> for Document {
    type Error = StoreError;

    fn try_from(mut map: Map<String, Value>) -> Result<Self, Self::Error> {
        let id = take_string(&mut map, ID_FIELD)?;
        let key = take_string(&mut map, KEY_FIELD)?;
        let rev = take_string(&mut map, REV_FIELD)?;
        Ok(Self {
            meta: DocumentMeta { id, key, rev },
            fields: map,
        })
    }
}

impl From<Document> for Map<String, Value> {
    fn from(doc: Document) -> Self {
        let mut map = Map::with_capacity(doc.fields.len() + 3);
        map.insert(ID_FIELD.into(), Value::String(doc.meta.id));
        map.insert(KEY_FIELD.into(), Value::String(doc.meta.key));
        map.insert(REV_FIELD.into(), Value::String(doc.meta.rev));
        map.extend(doc.fields);
        map
    }
}

/// Remove `_id`, `_key` and `_rev` from a body.
pub(crate) fn strip_identity(fields: &mut Map<String, Value>) {
    fields.remove(ID_FIELD);
    fields.remove(KEY_FIELD);
    fields.remove(REV_FIELD);
}

fn take_string(map: &mut Map<String, Value>, field: &str) -> Result<String, StoreError> {
    match map.remove(field) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(StoreError::Serde(format!(
            "document field {} must be a string, got {}",
            field, other
        ))),
        None => Err(StoreError::Serde(format!("document is missing {}", field))),
    }
}

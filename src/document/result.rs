//! Result shapes returned by write operations.

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::json;

use super::{Document, DocumentMeta};
use crate::error::StoreError;

/// Acknowledgment of a single-document write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteResult {
    #[serde(flatten)]
    pub meta: DocumentMeta,
    /// Revision the document had before this write, if it existed.
    #[serde(rename = "_oldRev", default, skip_serializing_if = "Option::is_none")]
    pub old_rev: Option<String>,
    /// Document after the write, when `returnNew` was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<Document>,
    /// Document before the write, when `returnOld` was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<Document>,
}

/// Element-wise outcome of a bulk write. Failures are reported in place;
/// nothing is rolled back.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BulkResult {
    items: Vec<Result<WriteResult, StoreError>>,
}

impl BulkResult {
    pub fn new(items: Vec<Result<WriteResult, StoreError>>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Result<WriteResult, StoreError>> {
        self.items.iter()
    }

    /// Successful writes, in request order.
    pub fn succeeded(&self) -> impl Iterator<Item = &WriteResult> {
        self.items.iter().filter_map(|item| item.as_ref().ok())
    }

    /// Failed elements with their request index.
    pub fn failed(&self) -> impl Iterator<Item = (usize, &StoreError)> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| item.as_ref().err().map(|e| (index, e)))
    }

    pub fn into_items(self) -> Vec<Result<WriteResult, StoreError>> {
        self.items
    }
}

impl Serialize for BulkResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.items.len()))?;
        for item in &self.items {
            match item {
                Ok(write) => seq.serialize_element(write)?,
                Err(e) => seq.serialize_element(&json!({
                    "error": true,
                    "kind": e.kind().to_string(),
                    "errorMessage": e.to_string(),
                }))?,
            }
        }
        seq.end()
    }
}

/// Outcome of removing by example.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoveSummary {
    pub deleted: u64,
}

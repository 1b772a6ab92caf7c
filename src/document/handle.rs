//! DocumentHandle - a key or a full `collection/key` id.

use crate::error::StoreError;

/// Longest key the store accepts.
const MAX_KEY_LEN: usize = 254;

/// A parsed document address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentHandle<'a> {
    collection: Option<&'a str>,
    key: &'a str,
}

impl<'a> DocumentHandle<'a> {
    /// Parse `"key"` or `"collection/key"`.
    pub fn parse(handle: &'a str) -> Result<Self, StoreError> {
        match handle.split_once('/') {
            None if !handle.is_empty() => Ok(Self {
                collection: None,
                key: handle,
            }),
            Some((collection, key)) if !collection.is_empty() && !key.is_empty() => Ok(Self {
                collection: Some(collection),
                key,
            }),
            _ => Err(StoreError::Validation(format!(
                "illegal document handle: {:?}",
                handle
            ))),
        }
    }

    pub fn collection(&self) -> Option<&'a str> {
        self.collection
    }

    pub fn key(&self) -> &'a str {
        self.key
    }

    /// Resolve the key against a target collection. A full id naming a
    /// different collection is rejected.
    pub fn key_in(&self, collection: &str) -> Result<&'a str, StoreError> {
        match self.collection {
            Some(own) if own != collection => Err(StoreError::Validation(format!(
                "document handle {}/{} does not belong to collection {}",
                own, self.key, collection
            ))),
            _ => Ok(self.key),
        }
    }
}

/// Whether `key` is a legal document key.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key.chars().all(|c| {
            c.is_ascii_alphanumeric() || "_-:.@()+,=;$!*'%".contains(c)
        })
}

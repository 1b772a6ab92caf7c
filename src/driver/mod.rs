//! Drivers - the upstream capability set the adapter depends on.
//!
//! A [`DocumentClient`] opens sessions; a [`DocumentSession`] performs
//! per-collection reads and writes. The adapter issues exactly one session
//! call per operation and never looks past these traits, so any document
//! store can be plugged in.
//!
//! Two drivers ship with the crate:
//!
//! - [`InMemoryClient`] - in-process store for development and tests.
//! - `ArangoClient` - ArangoDB over HTTP (requires the `arangodb` feature).

mod in_memory;

#[cfg(feature = "arangodb")]
mod arango;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::config::AdapterConfig;
use crate::document::{BulkResult, Cursor, Document, Predicate, RemoveSummary, WriteResult};
use crate::error::StoreError;
use crate::options::{BulkRemoveOptions, FindOptions, InsertOptions, RemoveOptions, UpdateOptions};

pub use in_memory::InMemoryClient;
pub use in_memory::InMemorySession;

#[cfg(feature = "arangodb")]
pub use arango::{ArangoClient, ArangoSession};

/// A JSON object body.
pub type Body = Map<String, Value>;

/// Opens sessions against a document store.
#[async_trait]
pub trait DocumentClient: Send + Sync {
    type Session: DocumentSession;

    /// Select `config.database_name` and authenticate when credentials are
    /// complete. Fails with `StoreError::Connection` when the store is
    /// unreachable, the database is unknown, or credentials are rejected.
    async fn connect(&self, config: &AdapterConfig) -> Result<Self::Session, StoreError>;
}

/// A live session bound to one database.
#[async_trait]
pub trait DocumentSession: Send + Sync {
    /// Store one document. The store assigns `_id`, `_key` (unless the body
    /// carries one) and `_rev`.
    async fn save(
        &self,
        collection: &str,
        body: Body,
        options: &InsertOptions,
    ) -> Result<WriteResult, StoreError>;

    /// Store many documents in one call. Element failures are reported in
    /// place.
    async fn save_many(
        &self,
        collection: &str,
        bodies: Vec<Body>,
        options: &InsertOptions,
    ) -> Result<BulkResult, StoreError>;

    /// Read one document by key. `None` when absent.
    async fn document(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError>;

    /// Read documents by key, in request order, skipping absent keys.
    async fn lookup_by_keys(
        &self,
        collection: &str,
        keys: &[&str],
    ) -> Result<Vec<Document>, StoreError>;

    /// Query by example.
    ///
    /// A collection that does not exist is driver-defined: `InMemoryClient`
    /// reads it as empty, ArangoDB fails with `StoreError::Validation`.
    async fn by_example(
        &self,
        collection: &str,
        example: &Predicate,
        options: &FindOptions,
    ) -> Result<Cursor, StoreError>;

    /// First document matching the example.
    async fn first_example(
        &self,
        collection: &str,
        example: &Predicate,
    ) -> Result<Option<Document>, StoreError> {
        let mut cursor = self
            .by_example(collection, example, &FindOptions::default().limit(1))
            .await?;
        Ok(cursor.next())
    }

    /// Number of documents matching the example.
    async fn count_by_example(
        &self,
        collection: &str,
        example: &Predicate,
    ) -> Result<u64, StoreError> {
        let cursor = self
            .by_example(collection, example, &FindOptions::default())
            .await?;
        Ok(cursor.count() as u64)
    }

    /// Partially update one document.
    async fn update(
        &self,
        collection: &str,
        key: &str,
        patch: Body,
        options: &UpdateOptions,
    ) -> Result<WriteResult, StoreError>;

    /// Partially update many documents; each body carries `_key` or `_id`.
    async fn bulk_update(
        &self,
        collection: &str,
        patches: Vec<Body>,
        options: &UpdateOptions,
    ) -> Result<BulkResult, StoreError>;

    /// Remove one document by key.
    async fn remove(
        &self,
        collection: &str,
        key: &str,
        options: &RemoveOptions,
    ) -> Result<WriteResult, StoreError>;

    /// Remove every document matching the example.
    async fn remove_by_example(
        &self,
        collection: &str,
        example: &Predicate,
        options: &BulkRemoveOptions,
    ) -> Result<RemoveSummary, StoreError>;

    /// Release the session.
    async fn close(&self) -> Result<(), StoreError>;
}

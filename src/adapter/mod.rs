//! DocumentStoreAdapter - the CRUD contract over a document store driver.
//!
//! Each operation resolves its target collection (the `collection` option,
//! else the adapter's default), issues exactly one driver call, and returns
//! what the store returned. Store failures are wrapped in [`AdapterError`]
//! with the operation and collection attached.
//!
//! ## Example
//!
//! ```ignore
//! use docstore_adapter::{AdapterConfig, DocumentStoreAdapter, InMemoryClient, Predicate};
//! use docstore_adapter::options::{FindOptions, InsertOptions, ReadOptions};
//! use serde_json::json;
//!
//! let client = InMemoryClient::new().with_database("meta-query");
//! let mut adapter = DocumentStoreAdapter::new(
//!     client,
//!     AdapterConfig::new("meta-query").with_collection("markets"),
//! );
//! adapter.connect().await?;
//!
//! let doc = adapter.insert(&json!({ "name": "A" }), &InsertOptions::default()).await?;
//! let same = adapter.find_by_id(doc.key(), &ReadOptions::default()).await?;
//! assert_eq!(doc, same);
//!
//! let named_a = adapter
//!     .find(&Predicate::all().with("name", "A"), &FindOptions::default())
//!     .await?;
//! ```

mod host;
mod operation;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::AdapterConfig;
use crate::document::{BulkResult, Document, DocumentHandle, Predicate, RemoveSummary, WriteResult};
use crate::driver::{Body, DocumentClient, DocumentSession};
use crate::error::{AdapterError, StoreError};
use crate::options::{
    BulkRemoveOptions, FindOptions, InsertOptions, OperationOptions, ReadOptions, RemoveOptions,
    UpdateOptions,
};

pub use host::HostContext;
pub use operation::Operation;

/// Uniform CRUD adapter over a [`DocumentClient`].
///
/// Starts disconnected. Every CRUD operation requires a live session and
/// fails with `AdapterError::NotConnected` otherwise. Operations take `&self`
/// and may run concurrently; `connect`/`disconnect` take `&mut self`.
pub struct DocumentStoreAdapter<C: DocumentClient> {
    config: AdapterConfig,
    client: C,
    host: Option<HostContext>,
    session: Option<C::Session>,
}

impl<C: DocumentClient> DocumentStoreAdapter<C> {
    pub fn new(client: C, config: AdapterConfig) -> Self {
        Self {
            config,
            client,
            host: None,
            session: None,
        }
    }

    /// Bind the adapter to its owning service. Used for log context only.
    pub fn init(&mut self, host: HostContext) {
        debug!(
            service = %host.service,
            node_id = %host.node_id,
            database = %self.config.database_name,
            "adapter initialized"
        );
        self.host = Some(host);
    }

    pub fn host(&self) -> Option<&HostContext> {
        self.host.as_ref()
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// The live session, if connected.
    pub fn session(&self) -> Option<&C::Session> {
        self.session.as_ref()
    }

    /// Open a session against the configured database and return it.
    ///
    /// Calling `connect` while connected returns the existing session.
    pub async fn connect(&mut self) -> Result<&C::Session, AdapterError> {
        if self.session.is_none() {
            let session = match self.client.connect(&self.config).await {
                Ok(session) => session,
                Err(source) => {
                    warn!(
                        database = %self.config.database_name,
                        service = self.service_name(),
                        error = %source,
                        "connect failed"
                    );
                    return Err(AdapterError::Connection {
                        database: self.config.database_name.clone(),
                        source,
                    });
                }
            };
            info!(
                database = %self.config.database_name,
                url = %self.config.url,
                service = self.service_name(),
                "connected"
            );
            self.session = Some(session);
        }

        self.session.as_ref().ok_or(AdapterError::NotConnected {
            operation: Operation::Connect,
        })
    }

    /// Release the session. Fails with `NotConnected` when there is none.
    ///
    /// The session is dropped even if the driver reports an error while
    /// closing it; that error is logged.
    pub async fn disconnect(&mut self) -> Result<(), AdapterError> {
        let session = self.session.take().ok_or(AdapterError::NotConnected {
            operation: Operation::Disconnect,
        })?;

        if let Err(e) = session.close().await {
            warn!(
                database = %self.config.database_name,
                service = self.service_name(),
                error = %e,
                "session close failed"
            );
        }
        info!(
            database = %self.config.database_name,
            service = self.service_name(),
            "disconnected"
        );
        Ok(())
    }

    // ========================================================================
    // Inserts
    // ========================================================================

    /// Store one entity and return it as persisted.
    pub async fn insert<T: Serialize + ?Sized>(
        &self,
        entity: &T,
        options: &InsertOptions,
    ) -> Result<Document, AdapterError> {
        let op = Operation::Insert;
        let (session, collection) = self.prepare(op, options)?;
        let body = to_body(entity).map_err(|e| self.fail(op, collection, e))?;
        let options = InsertOptions {
            return_new: true,
            ..options.clone()
        };

        session
            .save(collection, body, &options)
            .await
            .and_then(returned_document)
            .map_err(|e| self.fail(op, collection, e))
    }

    /// Store many entities in one call.
    ///
    /// The store may persist some elements and reject others; the first
    /// rejected element is returned as the error. Nothing is rolled back.
    pub async fn insert_many<T: Serialize>(
        &self,
        entities: &[T],
        options: &InsertOptions,
    ) -> Result<Vec<Document>, AdapterError> {
        let op = Operation::InsertMany;
        let (session, collection) = self.prepare(op, options)?;
        let bodies = entities
            .iter()
            .map(to_body)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.fail(op, collection, e))?;
        let options = InsertOptions {
            return_new: true,
            ..options.clone()
        };

        let bulk = session
            .save_many(collection, bodies, &options)
            .await
            .map_err(|e| self.fail(op, collection, e))?;

        bulk.into_items()
            .into_iter()
            .map(|item| item.and_then(returned_document))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.fail(op, collection, e))
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Read one document by key or full id.
    pub async fn find_by_id(&self, id: &str, options: &ReadOptions) -> Result<Document, AdapterError> {
        let op = Operation::FindById;
        let (session, collection) = self.prepare(op, options)?;
        let key = resolve_key(id, collection).map_err(|e| self.fail(op, collection, e))?;

        match session.document(collection, key).await {
            Ok(Some(doc)) => Ok(doc),
            Ok(None) => Err(self.fail(
                op,
                collection,
                StoreError::NotFound {
                    collection: collection.to_string(),
                    key: key.to_string(),
                },
            )),
            Err(e) => Err(self.fail(op, collection, e)),
        }
    }

    /// Read documents by key or full id. Absent keys are omitted.
    pub async fn find_by_ids<S: AsRef<str>>(
        &self,
        ids: &[S],
        options: &ReadOptions,
    ) -> Result<Vec<Document>, AdapterError> {
        let op = Operation::FindByIds;
        let (session, collection) = self.prepare(op, options)?;
        let keys = ids
            .iter()
            .map(|id| resolve_key(id.as_ref(), collection))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.fail(op, collection, e))?;

        session
            .lookup_by_keys(collection, &keys)
            .await
            .map_err(|e| self.fail(op, collection, e))
    }

    /// All documents matching the example. Empty when nothing matches.
    pub async fn find(
        &self,
        predicate: &Predicate,
        options: &FindOptions,
    ) -> Result<Vec<Document>, AdapterError> {
        let op = Operation::Find;
        let (session, collection) = self.prepare(op, options)?;

        session
            .by_example(collection, predicate, options)
            .await
            .map(|cursor| cursor.all())
            .map_err(|e| self.fail(op, collection, e))
    }

    /// The first document matching the example.
    pub async fn find_one(
        &self,
        predicate: &Predicate,
        options: &ReadOptions,
    ) -> Result<Document, AdapterError> {
        let op = Operation::FindOne;
        let (session, collection) = self.prepare(op, options)?;

        match session.first_example(collection, predicate).await {
            Ok(Some(doc)) => Ok(doc),
            Ok(None) => Err(self.fail(
                op,
                collection,
                StoreError::NoMatch {
                    collection: collection.to_string(),
                },
            )),
            Err(e) => Err(self.fail(op, collection, e)),
        }
    }

    /// Number of documents matching the example.
    pub async fn count(&self, predicate: &Predicate, options: &ReadOptions) -> Result<u64, AdapterError> {
        let op = Operation::Count;
        let (session, collection) = self.prepare(op, options)?;

        session
            .count_by_example(collection, predicate)
            .await
            .map_err(|e| self.fail(op, collection, e))
    }

    // ========================================================================
    // Updates
    // ========================================================================

    /// Partially update one document and return it with its new revision.
    pub async fn update_by_id<T: Serialize + ?Sized>(
        &self,
        id: &str,
        entity: &T,
        options: &UpdateOptions,
    ) -> Result<Document, AdapterError> {
        let op = Operation::UpdateById;
        let (session, collection) = self.prepare(op, options)?;
        let key = resolve_key(id, collection).map_err(|e| self.fail(op, collection, e))?;
        let patch = to_body(entity).map_err(|e| self.fail(op, collection, e))?;
        let options = UpdateOptions {
            return_new: true,
            ..options.clone()
        };

        session
            .update(collection, key, patch, &options)
            .await
            .and_then(returned_document)
            .map_err(|e| self.fail(op, collection, e))
    }

    /// Partially update many documents, each identified by its own `_key`
    /// or `_id`. Element failures are reported in the returned
    /// [`BulkResult`], not as an error.
    pub async fn update_many<T: Serialize>(
        &self,
        entities: &[T],
        options: &UpdateOptions,
    ) -> Result<BulkResult, AdapterError> {
        let op = Operation::UpdateMany;
        let (session, collection) = self.prepare(op, options)?;
        if options.rev.is_some() {
            return Err(AdapterError::InvalidOptions {
                operation: op,
                message: "rev applies to a single document; send _rev in each body with ignoreRevs: false".into(),
            });
        }
        let patches = entities
            .iter()
            .map(to_body)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.fail(op, collection, e))?;
        let options = UpdateOptions {
            return_new: true,
            ..options.clone()
        };

        let bulk = session
            .bulk_update(collection, patches, &options)
            .await
            .map_err(|e| self.fail(op, collection, e))?;
        for (index, error) in bulk.failed() {
            debug!(operation = %op, collection, index, error = %error, "element rejected");
        }
        Ok(bulk)
    }

    // ========================================================================
    // Removes
    // ========================================================================

    /// Remove one document by key or full id.
    pub async fn remove_by_id(
        &self,
        id: &str,
        options: &RemoveOptions,
    ) -> Result<WriteResult, AdapterError> {
        let op = Operation::RemoveById;
        let (session, collection) = self.prepare(op, options)?;
        let key = resolve_key(id, collection).map_err(|e| self.fail(op, collection, e))?;

        session
            .remove(collection, key, options)
            .await
            .map_err(|e| self.fail(op, collection, e))
    }

    /// Remove every document matching the example. No match is not an error.
    pub async fn remove_many(
        &self,
        predicate: &Predicate,
        options: &BulkRemoveOptions,
    ) -> Result<RemoveSummary, AdapterError> {
        self.remove_matching(Operation::RemoveMany, predicate, options)
            .await
    }

    /// Remove every document in the target collection.
    pub async fn clear(&self, options: &BulkRemoveOptions) -> Result<RemoveSummary, AdapterError> {
        self.remove_matching(Operation::Clear, &Predicate::all(), options)
            .await
    }

    async fn remove_matching(
        &self,
        op: Operation,
        predicate: &Predicate,
        options: &BulkRemoveOptions,
    ) -> Result<RemoveSummary, AdapterError> {
        let (session, collection) = self.prepare(op, options)?;

        let summary = session
            .remove_by_example(collection, predicate, options)
            .await
            .map_err(|e| self.fail(op, collection, e))?;
        debug!(operation = %op, collection, deleted = summary.deleted, "removed");
        Ok(summary)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn service_name(&self) -> &str {
        self.host.as_ref().map_or("", |host| host.service.as_str())
    }

    /// Connection guard, option validation and collection resolution, in
    /// that order.
    fn prepare<'a, O: OperationOptions>(
        &'a self,
        op: Operation,
        options: &'a O,
    ) -> Result<(&'a C::Session, &'a str), AdapterError> {
        let session = self
            .session
            .as_ref()
            .ok_or(AdapterError::NotConnected { operation: op })?;

        options
            .validate()
            .map_err(|e| AdapterError::InvalidOptions {
                operation: op,
                message: e.to_string(),
            })?;

        let collection = options
            .collection()
            .or(self.config.collection.as_deref())
            .ok_or(AdapterError::NoCollection { operation: op })?;

        debug!(
            operation = %op,
            collection,
            service = self.service_name(),
            "dispatching to store"
        );
        Ok((session, collection))
    }

    fn fail(&self, op: Operation, collection: &str, source: StoreError) -> AdapterError {
        warn!(
            operation = %op,
            collection,
            service = self.service_name(),
            kind = %source.kind(),
            error = %source,
            "store call failed"
        );
        AdapterError::Store {
            operation: op,
            collection: collection.to_string(),
            source,
        }
    }
}

fn to_body<T: Serialize + ?Sized>(entity: &T) -> Result<Body, StoreError> {
    match serde_json::to_value(entity)? {
        Value::Object(body) => Ok(body),
        other => Err(StoreError::Validation(format!(
            "document must be a JSON object, got {}",
            other
        ))),
    }
}

fn resolve_key<'a>(id: &'a str, collection: &str) -> Result<&'a str, StoreError> {
    DocumentHandle::parse(id)?.key_in(collection)
}

/// The store's copy of a written document, requested via `returnNew`.
fn returned_document(result: WriteResult) -> Result<Document, StoreError> {
    match result.new {
        Some(doc) => Ok(doc),
        None => Err(StoreError::Storage(format!(
            "store did not return the written document {}",
            result.meta.id
        ))),
    }
}

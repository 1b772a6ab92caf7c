//! InMemoryClient - HashMap-backed document store for testing and development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Body, DocumentClient, DocumentSession};
use crate::config::{AdapterConfig, SYSTEM_DATABASE};
use crate::document::{
    is_valid_key, strip_identity, BulkResult, Cursor, Document, DocumentHandle, DocumentMeta,
    Predicate, RemoveSummary, WriteResult, ID_FIELD, KEY_FIELD, REV_FIELD,
};
use crate::error::StoreError;
use crate::options::{BulkRemoveOptions, FindOptions, InsertOptions, RemoveOptions, UpdateOptions};

/// Longest collection name accepted.
const MAX_COLLECTION_NAME_LEN: usize = 256;

#[derive(Debug)]
struct ServerState {
    reachable: bool,
    /// Registered users. Empty means authentication is disabled.
    users: HashMap<String, String>,
    databases: HashMap<String, Database>,
    rev_seq: u64,
}

#[derive(Debug, Default)]
struct Database {
    collections: HashMap<String, Collection>,
}

/// Documents keyed by `_key`, iterated in insertion order.
#[derive(Debug, Default)]
struct Collection {
    documents: HashMap<String, Document>,
    order: Vec<String>,
    next_key: u64,
}

/// In-memory document server.
///
/// Clone-friendly via Arc; clones share storage. Collections are created on
/// first write; reading a collection that was never written yields nothing.
///
/// ```ignore
/// let client = InMemoryClient::new()
///     .with_database("meta-query")
///     .with_user("root", "secret");
/// ```
#[derive(Clone)]
pub struct InMemoryClient {
    state: Arc<RwLock<ServerState>>,
}

impl Default for InMemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryClient {
    /// A reachable server with only the `_system` database and no users.
    pub fn new() -> Self {
        let mut databases = HashMap::new();
        databases.insert(SYSTEM_DATABASE.to_string(), Database::default());
        Self {
            state: Arc::new(RwLock::new(ServerState {
                reachable: true,
                users: HashMap::new(),
                databases,
                rev_seq: 0,
            })),
        }
    }

    /// Create a database.
    pub fn with_database(self, name: impl Into<String>) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.databases.entry(name.into()).or_default();
        }
        self
    }

    /// Register a user. Once any user exists, sessions must authenticate.
    pub fn with_user(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.users.insert(username.into(), password.into());
        }
        self
    }

    /// Simulate the server going away (or coming back).
    pub fn set_reachable(&self, reachable: bool) {
        if let Ok(mut state) = self.state.write() {
            state.reachable = reachable;
        }
    }
}

#[async_trait]
impl DocumentClient for InMemoryClient {
    type Session = InMemorySession;

    async fn connect(&self, config: &AdapterConfig) -> Result<InMemorySession, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        if !state.reachable {
            return Err(StoreError::Connection(format!(
                "server at {} is unreachable",
                config.url
            )));
        }

        if !state.users.is_empty() {
            let (username, password) = config
                .credentials()
                .ok_or_else(|| StoreError::Connection("authentication required".into()))?;
            if state.users.get(username).map(String::as_str) != Some(password) {
                return Err(StoreError::Connection(format!(
                    "authentication rejected for user {}",
                    username
                )));
            }
        }

        if !state.databases.contains_key(&config.database_name) {
            return Err(StoreError::Connection(format!(
                "database not found: {}",
                config.database_name
            )));
        }

        Ok(InMemorySession {
            state: Arc::clone(&self.state),
            database: config.database_name.clone(),
            closed: AtomicBool::new(false),
        })
    }
}

/// Session on an [`InMemoryClient`] database.
#[derive(Debug)]
pub struct InMemorySession {
    state: Arc<RwLock<ServerState>>,
    database: String,
    closed: AtomicBool,
}

impl InMemorySession {
    fn check_open(&self, state: &ServerState) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Storage("session is closed".into()));
        }
        if !state.reachable {
            return Err(StoreError::Connection("server is unreachable".into()));
        }
        Ok(())
    }

    fn read<T>(
        &self,
        collection: &str,
        f: impl FnOnce(Option<&Collection>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;
        self.check_open(&state)?;
        let database = state
            .databases
            .get(&self.database)
            .ok_or_else(|| StoreError::Storage(format!("database gone: {}", self.database)))?;
        f(database.collections.get(collection))
    }

    fn write<T>(
        &self,
        collection: &str,
        f: impl FnOnce(&mut Collection, &mut u64) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;
        self.check_open(&guard)?;
        if !is_valid_collection_name(collection) {
            return Err(StoreError::Validation(format!(
                "illegal collection name: {:?}",
                collection
            )));
        }

        let state = &mut *guard;
        let database = state
            .databases
            .get_mut(&self.database)
            .ok_or_else(|| StoreError::Storage(format!("database gone: {}", self.database)))?;
        let target = database
            .collections
            .entry(collection.to_string())
            .or_default();
        f(target, &mut state.rev_seq)
    }
}

#[async_trait]
impl DocumentSession for InMemorySession {
    async fn save(
        &self,
        collection: &str,
        body: Body,
        options: &InsertOptions,
    ) -> Result<WriteResult, StoreError> {
        self.write(collection, |target, revs| {
            target.insert(collection, body, options, revs)
        })
    }

    async fn save_many(
        &self,
        collection: &str,
        bodies: Vec<Body>,
        options: &InsertOptions,
    ) -> Result<BulkResult, StoreError> {
        self.write(collection, |target, revs| {
            let items = bodies
                .into_iter()
                .map(|body| target.insert(collection, body, options, revs))
                .collect();
            Ok(BulkResult::new(items))
        })
    }

    async fn document(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        self.read(collection, |target| {
            Ok(target.and_then(|c| c.documents.get(key)).cloned())
        })
    }

    async fn lookup_by_keys(
        &self,
        collection: &str,
        keys: &[&str],
    ) -> Result<Vec<Document>, StoreError> {
        self.read(collection, |target| {
            let Some(target) = target else {
                return Ok(Vec::new());
            };
            Ok(keys
                .iter()
                .filter_map(|key| target.documents.get(*key))
                .cloned()
                .collect())
        })
    }

    async fn by_example(
        &self,
        collection: &str,
        example: &Predicate,
        options: &FindOptions,
    ) -> Result<Cursor, StoreError> {
        self.read(collection, |target| {
            let Some(target) = target else {
                return Ok(Cursor::default());
            };
            let skip = options.skip.unwrap_or(0) as usize;
            let limit = options.limit.map_or(usize::MAX, |l| l as usize);
            let matches = target
                .iter()
                .filter(|doc| example.matches(doc))
                .skip(skip)
                .take(limit)
                .cloned()
                .collect();
            Ok(Cursor::new(matches))
        })
    }

    async fn update(
        &self,
        collection: &str,
        key: &str,
        patch: Body,
        options: &UpdateOptions,
    ) -> Result<WriteResult, StoreError> {
        self.write(collection, |target, revs| {
            target.update(collection, key, patch, options, options.enforced_rev(), revs)
        })
    }

    async fn bulk_update(
        &self,
        collection: &str,
        patches: Vec<Body>,
        options: &UpdateOptions,
    ) -> Result<BulkResult, StoreError> {
        self.write(collection, |target, revs| {
            let items = patches
                .into_iter()
                .map(|patch| {
                    let key = patch_key(collection, &patch)?;
                    target.update(collection, &key, patch, options, None, revs)
                })
                .collect();
            Ok(BulkResult::new(items))
        })
    }

    async fn remove(
        &self,
        collection: &str,
        key: &str,
        options: &RemoveOptions,
    ) -> Result<WriteResult, StoreError> {
        self.write(collection, |target, _| target.remove(collection, key, options))
    }

    async fn remove_by_example(
        &self,
        collection: &str,
        example: &Predicate,
        _options: &BulkRemoveOptions,
    ) -> Result<RemoveSummary, StoreError> {
        self.write(collection, |target, _| {
            let doomed: Vec<String> = target
                .iter()
                .filter(|doc| example.matches(doc))
                .map(|doc| doc.key().to_string())
                .collect();
            for key in &doomed {
                target.documents.remove(key);
            }
            let documents = &target.documents;
            target.order.retain(|key| documents.contains_key(key));
            Ok(RemoveSummary {
                deleted: doomed.len() as u64,
            })
        })
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

impl Collection {
    fn iter(&self) -> impl Iterator<Item = &Document> {
        self.order.iter().filter_map(|key| self.documents.get(key))
    }

    fn generate_key(&mut self) -> String {
        loop {
            self.next_key += 1;
            let key = self.next_key.to_string();
            if !self.documents.contains_key(&key) {
                return key;
            }
        }
    }

    fn insert(
        &mut self,
        collection: &str,
        mut body: Body,
        options: &InsertOptions,
        revs: &mut u64,
    ) -> Result<WriteResult, StoreError> {
        let key = match body.remove(KEY_FIELD) {
            Some(Value::String(key)) if is_valid_key(&key) => key,
            Some(other) => {
                return Err(StoreError::Validation(format!(
                    "illegal document key: {}",
                    other
                )))
            }
            None => self.generate_key(),
        };
        strip_identity(&mut body);

        let replaced = if self.documents.contains_key(&key) {
            if !options.overwrite {
                return Err(StoreError::Validation(format!(
                    "unique constraint violated: {}/{} already exists",
                    collection, key
                )));
            }
            self.documents.remove(&key)
        } else {
            self.order.push(key.clone());
            None
        };

        let doc = Document::new(DocumentMeta::new(collection, key.clone(), next_rev(revs)), body);
        self.documents.insert(key, doc.clone());

        Ok(WriteResult {
            meta: doc.meta().clone(),
            old_rev: replaced.as_ref().map(|old| old.rev().to_string()),
            new: options.return_new.then_some(doc),
            old: replaced.filter(|_| options.return_old),
        })
    }

    fn update(
        &mut self,
        collection: &str,
        key: &str,
        mut patch: Body,
        options: &UpdateOptions,
        enforced_rev: Option<&str>,
        revs: &mut u64,
    ) -> Result<WriteResult, StoreError> {
        let current = self
            .documents
            .get_mut(key)
            .ok_or_else(|| not_found(collection, key))?;

        check_rev(collection, key, current.rev(), enforced_rev)?;
        if !options.ignore_revs {
            if let Some(Value::String(rev)) = patch.get(REV_FIELD) {
                check_rev(collection, key, current.rev(), Some(rev.as_str()))?;
            }
        }

        strip_identity(&mut patch);
        let old = current.clone();
        merge_object(
            current.fields_mut(),
            patch,
            options.keep_null,
            options.merge_objects,
        );
        current.set_rev(next_rev(revs));

        Ok(WriteResult {
            meta: current.meta().clone(),
            old_rev: Some(old.rev().to_string()),
            new: options.return_new.then(|| current.clone()),
            old: options.return_old.then_some(old),
        })
    }

    fn remove(
        &mut self,
        collection: &str,
        key: &str,
        options: &RemoveOptions,
    ) -> Result<WriteResult, StoreError> {
        match self.documents.get(key) {
            Some(doc) => check_rev(collection, key, doc.rev(), options.enforced_rev())?,
            None => return Err(not_found(collection, key)),
        }
        let old = self
            .documents
            .remove(key)
            .ok_or_else(|| not_found(collection, key))?;
        self.order.retain(|k| k != key);

        Ok(WriteResult {
            meta: old.meta().clone(),
            old_rev: None,
            new: None,
            old: options.return_old.then_some(old),
        })
    }
}

fn next_rev(seq: &mut u64) -> String {
    *seq += 1;
    format!("_{:010x}", *seq)
}

fn not_found(collection: &str, key: &str) -> StoreError {
    StoreError::NotFound {
        collection: collection.to_string(),
        key: key.to_string(),
    }
}

fn check_rev(
    collection: &str,
    key: &str,
    actual: &str,
    expected: Option<&str>,
) -> Result<(), StoreError> {
    match expected {
        Some(expected) if expected != actual => Err(StoreError::Conflict {
            collection: collection.to_string(),
            key: key.to_string(),
            actual: actual.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Key addressed by a bulk-update body.
fn patch_key(collection: &str, patch: &Body) -> Result<String, StoreError> {
    if let Some(Value::String(key)) = patch.get(KEY_FIELD) {
        return Ok(key.clone());
    }
    if let Some(Value::String(id)) = patch.get(ID_FIELD) {
        return DocumentHandle::parse(id)?
            .key_in(collection)
            .map(str::to_string);
    }
    Err(StoreError::Validation(
        "document handle missing: body needs _key or _id".into(),
    ))
}

/// Apply a patch: nulls delete when `keep_null` is false, nested objects
/// merge when `merge_objects` is true, anything else replaces.
fn merge_object(target: &mut Map<String, Value>, patch: Body, keep_null: bool, merge_objects: bool) {
    for (name, value) in patch {
        match value {
            Value::Null if !keep_null => {
                target.remove(&name);
            }
            Value::Object(nested) if merge_objects => match target.get_mut(&name) {
                Some(Value::Object(existing)) => {
                    merge_object(existing, nested, keep_null, merge_objects)
                }
                _ => {
                    let mut fresh = Map::new();
                    merge_object(&mut fresh, nested, keep_null, merge_objects);
                    target.insert(name, Value::Object(fresh));
                }
            },
            value => {
                target.insert(name, value);
            }
        }
    }
}

fn is_valid_collection_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && name.len() <= MAX_COLLECTION_NAME_LEN
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

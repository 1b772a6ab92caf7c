//! ArangoClient - ArangoDB over its HTTP API.
//!
//! Single-document calls go to the document API
//! (`/_db/{db}/_api/document/{collection}[/{key}]`); example queries, key
//! lookups and remove-by-example run as AQL cursors (`/_db/{db}/_api/cursor`).
//! Requires the `arangodb` feature.

use async_trait::async_trait;
use reqwest::header::IF_MATCH;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, trace};

use super::{Body, DocumentClient, DocumentSession};
use crate::config::AdapterConfig;
use crate::document::{
    BulkResult, Cursor, Document, Predicate, RemoveSummary, WriteResult, KEY_FIELD, REV_FIELD,
};
use crate::error::StoreError;
use crate::options::{BulkRemoveOptions, FindOptions, InsertOptions, RemoveOptions, UpdateOptions};

const ERROR_HTTP_BAD_PARAMETER: u64 = 400;
const ERROR_HTTP_CORRUPTED_JSON: u64 = 600;
const ERROR_ARANGO_CONFLICT: u64 = 1200;
const ERROR_ARANGO_DOCUMENT_NOT_FOUND: u64 = 1202;
const ERROR_ARANGO_DATA_SOURCE_NOT_FOUND: u64 = 1203;
const ERROR_ARANGO_UNIQUE_CONSTRAINT_VIOLATED: u64 = 1210;
const ERROR_ARANGO_DOCUMENT_KEY_BAD: u64 = 1221;

/// Largest integer AQL represents exactly; used as an open-ended LIMIT count.
const UNBOUNDED: u64 = (1 << 53) - 1;

/// Client for an ArangoDB server.
#[derive(Debug, Clone, Default)]
pub struct ArangoClient {
    http: Client,
}

impl ArangoClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured HTTP client (timeouts, TLS, proxies).
    pub fn with_http_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl DocumentClient for ArangoClient {
    type Session = ArangoSession;

    async fn connect(&self, config: &AdapterConfig) -> Result<ArangoSession, StoreError> {
        let base = Url::parse(&config.url)
            .map_err(|e| StoreError::Connection(format!("invalid url {}: {}", config.url, e)))?;
        let session = ArangoSession {
            http: self.http.clone(),
            base,
            database: config.database_name.clone(),
            credentials: config
                .credentials()
                .map(|(user, pass)| (user.to_string(), pass.to_string())),
        };

        let url = session.endpoint(&["_api", "version"])?;
        let response = session
            .request(Method::GET, url)
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                debug!(database = %session.database, "arangodb session ready");
                Ok(session)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::Connection(
                format!("authentication rejected for database {}", session.database),
            )),
            StatusCode::NOT_FOUND => Err(StoreError::Connection(format!(
                "database not found: {}",
                session.database
            ))),
            status => Err(StoreError::Connection(format!(
                "unexpected status {} from {}",
                status, config.url
            ))),
        }
    }
}

/// Session bound to one ArangoDB database.
#[derive(Debug, Clone)]
pub struct ArangoSession {
    http: Client,
    base: Url,
    database: String,
    credentials: Option<(String, String)>,
}

/// One batch of an AQL cursor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CursorBatch {
    #[serde(default)]
    result: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    extra: Value,
}

impl ArangoSession {
    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        endpoint(&self.base, &self.database, segments)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.credentials {
            Some((user, pass)) => builder.basic_auth(user, Some(pass)),
            None => builder,
        }
    }

    fn document_url(&self, collection: &str, key: Option<&str>) -> Result<Url, StoreError> {
        match key {
            Some(key) => self.endpoint(&["_api", "document", collection, key]),
            None => self.endpoint(&["_api", "document", collection]),
        }
    }

    /// Run an AQL query and drain every batch.
    async fn query(&self, aql: &str, bind_vars: Map<String, Value>) -> Result<CursorBatch, StoreError> {
        trace!(query = aql, "aql");
        let url = self.endpoint(&["_api", "cursor"])?;
        let (status, body) = send(
            self.request(Method::POST, url)
                .json(&json!({ "query": aql, "bindVars": bind_vars })),
        )
        .await?;
        if !status.is_success() {
            return Err(error_from(status.as_u16(), &body, "", None));
        }

        let mut batch: CursorBatch = serde_json::from_value(body)?;
        while batch.has_more {
            let Some(id) = batch.id.clone() else { break };
            let url = self.endpoint(&["_api", "cursor", &id])?;
            let (status, body) = send(self.request(Method::PUT, url)).await?;
            if !status.is_success() {
                return Err(error_from(status.as_u16(), &body, "", None));
            }
            let next: CursorBatch = serde_json::from_value(body)?;
            batch.result.extend(next.result);
            batch.has_more = next.has_more;
            batch.id = next.id;
            batch.extra = next.extra;
        }
        Ok(batch)
    }
}

#[async_trait]
impl DocumentSession for ArangoSession {
    async fn save(
        &self,
        collection: &str,
        body: Body,
        options: &InsertOptions,
    ) -> Result<WriteResult, StoreError> {
        let key = body.get(KEY_FIELD).and_then(Value::as_str).map(str::to_string);
        let url = self.document_url(collection, None)?;
        let (status, response) = send(
            self.request(Method::POST, url)
                .query(&insert_params(options))
                .json(&body),
        )
        .await?;
        if !status.is_success() {
            return Err(error_from(status.as_u16(), &response, collection, key.as_deref()));
        }
        Ok(serde_json::from_value(response)?)
    }

    async fn save_many(
        &self,
        collection: &str,
        bodies: Vec<Body>,
        options: &InsertOptions,
    ) -> Result<BulkResult, StoreError> {
        let keys: Vec<Option<String>> = bodies
            .iter()
            .map(|b| b.get(KEY_FIELD).and_then(Value::as_str).map(str::to_string))
            .collect();
        let url = self.document_url(collection, None)?;
        let (status, response) = send(
            self.request(Method::POST, url)
                .query(&insert_params(options))
                .json(&bodies),
        )
        .await?;
        if !status.is_success() {
            return Err(error_from(status.as_u16(), &response, collection, None));
        }
        bulk_result(response, collection, &keys)
    }

    async fn document(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        let url = self.document_url(collection, Some(key))?;
        let (status, body) = send(self.request(Method::GET, url)).await?;
        if status.is_success() {
            return Ok(Some(serde_json::from_value(body)?));
        }
        match error_from(status.as_u16(), &body, collection, Some(key)) {
            StoreError::NotFound { .. } => Ok(None),
            other => Err(other),
        }
    }

    async fn lookup_by_keys(
        &self,
        collection: &str,
        keys: &[&str],
    ) -> Result<Vec<Document>, StoreError> {
        let mut bind_vars = Map::new();
        bind_vars.insert("collection".into(), Value::String(collection.to_string()));
        bind_vars.insert("keys".into(), json!(keys));
        let batch = self
            .query(
                "FOR key IN @keys LET d = DOCUMENT(@collection, key) FILTER d != null RETURN d",
                bind_vars,
            )
            .await
            .map_err(|e| in_collection(e, collection))?;
        decode_documents(batch.result)
    }

    async fn by_example(
        &self,
        collection: &str,
        example: &Predicate,
        options: &FindOptions,
    ) -> Result<Cursor, StoreError> {
        let mut bind_vars = collection_bind(collection);
        let filter = example_filter(example, &mut bind_vars);
        let limit = match (options.skip, options.limit) {
            (None, None) => String::new(),
            (skip, limit) => {
                bind_vars.insert("offset".into(), json!(skip.unwrap_or(0)));
                bind_vars.insert("count".into(), json!(limit.unwrap_or(UNBOUNDED)));
                " LIMIT @offset, @count".to_string()
            }
        };
        let aql = format!("FOR d IN @@collection{}{} RETURN d", filter, limit);
        let batch = self
            .query(&aql, bind_vars)
            .await
            .map_err(|e| in_collection(e, collection))?;
        Ok(Cursor::new(decode_documents(batch.result)?))
    }

    async fn count_by_example(
        &self,
        collection: &str,
        example: &Predicate,
    ) -> Result<u64, StoreError> {
        let mut bind_vars = collection_bind(collection);
        let filter = example_filter(example, &mut bind_vars);
        let aql = format!(
            "RETURN LENGTH(FOR d IN @@collection{} RETURN 1)",
            filter
        );
        let batch = self
            .query(&aql, bind_vars)
            .await
            .map_err(|e| in_collection(e, collection))?;
        batch
            .result
            .first()
            .and_then(Value::as_u64)
            .ok_or_else(|| StoreError::Serde("count query returned no number".into()))
    }

    async fn update(
        &self,
        collection: &str,
        key: &str,
        patch: Body,
        options: &UpdateOptions,
    ) -> Result<WriteResult, StoreError> {
        let url = self.document_url(collection, Some(key))?;
        let mut request = self
            .request(Method::PATCH, url)
            .query(&update_params(options))
            .json(&patch);
        if let Some(rev) = options.enforced_rev() {
            request = request.header(IF_MATCH, rev);
        }
        let (status, body) = send(request).await?;
        if !status.is_success() {
            return Err(error_from(status.as_u16(), &body, collection, Some(key)));
        }
        Ok(serde_json::from_value(body)?)
    }

    async fn bulk_update(
        &self,
        collection: &str,
        patches: Vec<Body>,
        options: &UpdateOptions,
    ) -> Result<BulkResult, StoreError> {
        let keys: Vec<Option<String>> = patches
            .iter()
            .map(|b| b.get(KEY_FIELD).and_then(Value::as_str).map(str::to_string))
            .collect();
        let url = self.document_url(collection, None)?;
        let (status, body) = send(
            self.request(Method::PATCH, url)
                .query(&update_params(options))
                .json(&patches),
        )
        .await?;
        if !status.is_success() {
            return Err(error_from(status.as_u16(), &body, collection, None));
        }
        bulk_result(body, collection, &keys)
    }

    async fn remove(
        &self,
        collection: &str,
        key: &str,
        options: &RemoveOptions,
    ) -> Result<WriteResult, StoreError> {
        let url = self.document_url(collection, Some(key))?;
        let mut request = self
            .request(Method::DELETE, url)
            .query(&remove_params(options));
        if let Some(rev) = options.enforced_rev() {
            request = request.header(IF_MATCH, rev);
        }
        let (status, body) = send(request).await?;
        if !status.is_success() {
            return Err(error_from(status.as_u16(), &body, collection, Some(key)));
        }
        Ok(serde_json::from_value(body)?)
    }

    async fn remove_by_example(
        &self,
        collection: &str,
        example: &Predicate,
        options: &BulkRemoveOptions,
    ) -> Result<RemoveSummary, StoreError> {
        let mut bind_vars = collection_bind(collection);
        let filter = example_filter(example, &mut bind_vars);
        let aql = format!(
            "FOR d IN @@collection{} REMOVE d IN @@collection OPTIONS {{ waitForSync: {} }}",
            filter, options.wait_for_sync
        );
        let batch = self
            .query(&aql, bind_vars)
            .await
            .map_err(|e| in_collection(e, collection))?;
        let deleted = batch
            .extra
            .pointer("/stats/writesExecuted")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        Ok(RemoveSummary { deleted })
    }

    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// `{base}/_db/{database}/{segments...}`, each segment percent-encoded.
fn endpoint(base: &Url, database: &str, segments: &[&str]) -> Result<Url, StoreError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| StoreError::Connection(format!("url cannot hold a path: {}", base)))?
        .pop_if_empty()
        .extend(["_db", database])
        .extend(segments);
    Ok(url)
}

async fn send(request: RequestBuilder) -> Result<(StatusCode, Value), StoreError> {
    let response = request
        .send()
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))?;
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

fn collection_bind(collection: &str) -> Map<String, Value> {
    let mut bind_vars = Map::new();
    bind_vars.insert("@collection".into(), Value::String(collection.to_string()));
    bind_vars
}

/// Translate an example into an AQL `FILTER` over `d`. Attribute names and
/// values travel as bind parameters.
fn example_filter(example: &Predicate, bind_vars: &mut Map<String, Value>) -> String {
    let mut clauses = Vec::new();
    for (i, (path, value)) in example.leaves().into_iter().enumerate() {
        let mut access = String::from("d");
        for (j, segment) in path.into_iter().enumerate() {
            let name = format!("p{}_{}", i, j);
            access.push_str(&format!("[@{}]", name));
            bind_vars.insert(name, Value::String(segment));
        }
        let name = format!("v{}", i);
        clauses.push(format!("{} == @{}", access, name));
        bind_vars.insert(name, value.clone());
    }

    if clauses.is_empty() {
        String::new()
    } else {
        format!(" FILTER {}", clauses.join(" AND "))
    }
}

fn insert_params(options: &InsertOptions) -> Vec<(&'static str, bool)> {
    vec![
        ("waitForSync", options.wait_for_sync),
        ("returnNew", options.return_new),
        ("returnOld", options.return_old),
        ("overwrite", options.overwrite),
    ]
}

fn update_params(options: &UpdateOptions) -> Vec<(&'static str, bool)> {
    vec![
        ("waitForSync", options.wait_for_sync),
        ("keepNull", options.keep_null),
        ("mergeObjects", options.merge_objects),
        ("returnNew", options.return_new),
        ("returnOld", options.return_old),
        ("ignoreRevs", options.ignore_revs),
    ]
}

fn remove_params(options: &RemoveOptions) -> Vec<(&'static str, bool)> {
    vec![
        ("waitForSync", options.wait_for_sync),
        ("returnOld", options.return_old),
    ]
}

fn decode_documents(values: Vec<Value>) -> Result<Vec<Document>, StoreError> {
    values
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(StoreError::from))
        .collect()
}

/// Split a bulk response into per-element outcomes.
fn bulk_result(
    response: Value,
    collection: &str,
    keys: &[Option<String>],
) -> Result<BulkResult, StoreError> {
    let Value::Array(items) = response else {
        return Err(StoreError::Serde("bulk response is not an array".into()));
    };
    let items = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if item.get("error").and_then(Value::as_bool) == Some(true) {
                let key = keys.get(index).and_then(|k| k.as_deref());
                Err(error_from(0, &item, collection, key))
            } else {
                serde_json::from_value(item).map_err(StoreError::from)
            }
        })
        .collect();
    Ok(BulkResult::new(items))
}

/// Map an error response (HTTP status plus `errorNum` body) to a [`StoreError`].
/// Bulk elements carry no status of their own and pass `0`.
fn error_from(status: u16, body: &Value, collection: &str, key: Option<&str>) -> StoreError {
    let error_num = body.get("errorNum").and_then(Value::as_u64);
    let message = body
        .get("errorMessage")
        .and_then(Value::as_str)
        .unwrap_or("no error message")
        .to_string();

    match (status, error_num) {
        (_, Some(ERROR_ARANGO_DATA_SOURCE_NOT_FOUND)) => {
            StoreError::Validation(format!("collection or view not found: {}", message))
        }
        (_, Some(ERROR_ARANGO_DOCUMENT_NOT_FOUND)) | (404, None) => StoreError::NotFound {
            collection: collection.to_string(),
            key: key.unwrap_or_default().to_string(),
        },
        (412, _) | (_, Some(ERROR_ARANGO_CONFLICT)) => StoreError::Conflict {
            collection: collection.to_string(),
            key: key
                .or_else(|| body.get(KEY_FIELD).and_then(Value::as_str))
                .unwrap_or_default()
                .to_string(),
            actual: body
                .get(REV_FIELD)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        (
            _,
            Some(
                ERROR_ARANGO_UNIQUE_CONSTRAINT_VIOLATED
                | ERROR_ARANGO_DOCUMENT_KEY_BAD
                | ERROR_HTTP_CORRUPTED_JSON
                | ERROR_HTTP_BAD_PARAMETER,
            ),
        )
        | (400, _) => StoreError::Validation(message),
        (401 | 403, _) => StoreError::Connection(message),
        (status, num) => StoreError::Storage(format!(
            "status {} errorNum {}: {}",
            status,
            num.map_or_else(|| "-".to_string(), |n| n.to_string()),
            message
        )),
    }
}

/// Attach the collection to errors raised by collection-agnostic AQL calls.
fn in_collection(err: StoreError, collection: &str) -> StoreError {
    match err {
        StoreError::NotFound { key, .. } => StoreError::NotFound {
            collection: collection.to_string(),
            key,
        },
        other => other,
    }
}

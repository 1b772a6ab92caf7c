//! Per-operation options.
//!
//! Every option the adapter recognizes is a typed field with an explicit
//! default. Options arriving as JSON (from a hosting service) are parsed with
//! [`parse_options`], which applies an [`UnknownKeys`] policy instead of
//! forwarding stray keys to the store.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What to do with option keys the operation does not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKeys {
    /// Fail the call.
    #[default]
    Reject,
    /// Drop the key and continue.
    Ignore,
}

/// How an explicit `rev` option is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionPolicy {
    /// A mismatching `rev` fails the write.
    #[default]
    Error,
    /// Last write wins; `rev` is not checked.
    Last,
}

/// Shared behaviour of option structs.
pub trait OperationOptions: DeserializeOwned + Default {
    /// Recognized keys, in wire (camelCase) form.
    const FIELDS: &'static [&'static str];

    /// Collection override.
    fn collection(&self) -> Option<&str>;

    /// Call-time validation of field values.
    fn validate(&self) -> Result<(), OptionsError> {
        match self.collection() {
            Some(name) if name.trim().is_empty() => {
                Err(OptionsError::Invalid("collection override is empty".into()))
            }
            _ => Ok(()),
        }
    }
}

/// Error raised while parsing or validating options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    /// Options were not a JSON object.
    NotAnObject,
    /// A key the operation does not recognize.
    UnknownKey(String),
    /// A recognized key with an unacceptable value.
    Invalid(String),
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionsError::NotAnObject => write!(f, "options must be an object"),
            OptionsError::UnknownKey(key) => write!(f, "unknown option: {}", key),
            OptionsError::Invalid(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for OptionsError {}

/// Parse JSON options for an operation. `null` yields the defaults.
pub fn parse_options<O: OperationOptions>(
    value: &Value,
    policy: UnknownKeys,
) -> Result<O, OptionsError> {
    let map = match value {
        Value::Null => return Ok(O::default()),
        Value::Object(map) => map,
        _ => return Err(OptionsError::NotAnObject),
    };

    let mut known = Map::with_capacity(map.len());
    for (key, value) in map {
        if O::FIELDS.contains(&key.as_str()) {
            known.insert(key.clone(), value.clone());
        } else if policy == UnknownKeys::Reject {
            return Err(OptionsError::UnknownKey(key.clone()));
        }
    }

    let options: O = serde_json::from_value(Value::Object(known))
        .map_err(|e| OptionsError::Invalid(e.to_string()))?;
    options.validate()?;
    Ok(options)
}

fn validate_rev(rev: Option<&str>) -> Result<(), OptionsError> {
    match rev {
        Some(rev) if rev.is_empty() => Err(OptionsError::Invalid("rev is empty".into())),
        _ => Ok(()),
    }
}

// ============================================================================
// Reads
// ============================================================================

/// Options for `find_by_id`, `find_by_ids`, `find_one` and `count`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadOptions {
    pub collection: Option<String>,
}

impl ReadOptions {
    pub fn in_collection(name: impl Into<String>) -> Self {
        Self {
            collection: Some(name.into()),
        }
    }
}

impl OperationOptions for ReadOptions {
    const FIELDS: &'static [&'static str] = &["collection"];

    fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }
}

/// Options for `find`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FindOptions {
    pub collection: Option<String>,
    /// Number of matches to skip.
    pub skip: Option<u64>,
    /// Maximum number of matches to return.
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn in_collection(name: impl Into<String>) -> Self {
        Self {
            collection: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl OperationOptions for FindOptions {
    const FIELDS: &'static [&'static str] = &["collection", "skip", "limit"];

    fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }
}

// ============================================================================
// Writes
// ============================================================================

/// Options for `insert` and `insert_many`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InsertOptions {
    pub collection: Option<String>,
    /// Wait until the write is durable.
    pub wait_for_sync: bool,
    pub return_new: bool,
    /// With `overwrite`, return the replaced document.
    pub return_old: bool,
    /// Replace a document with the same `_key` instead of failing.
    pub overwrite: bool,
}

impl InsertOptions {
    pub fn in_collection(name: impl Into<String>) -> Self {
        Self {
            collection: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn wait_for_sync(mut self, wait: bool) -> Self {
        self.wait_for_sync = wait;
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

impl OperationOptions for InsertOptions {
    const FIELDS: &'static [&'static str] = &[
        "collection",
        "waitForSync",
        "returnNew",
        "returnOld",
        "overwrite",
    ];

    fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }
}

/// Options for `update_by_id` and `update_many`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateOptions {
    pub collection: Option<String>,
    pub wait_for_sync: bool,
    /// Keep null-valued patch fields; when false they delete the stored field.
    pub keep_null: bool,
    /// Merge nested objects instead of replacing them.
    pub merge_objects: bool,
    pub return_new: bool,
    pub return_old: bool,
    /// Skip the check of a `_rev` carried in the body.
    pub ignore_revs: bool,
    /// Revision the stored document must have (single-document updates only).
    pub rev: Option<String>,
    pub policy: RevisionPolicy,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            collection: None,
            wait_for_sync: false,
            keep_null: true,
            merge_objects: true,
            return_new: false,
            return_old: false,
            ignore_revs: true,
            rev: None,
            policy: RevisionPolicy::Error,
        }
    }
}

impl UpdateOptions {
    pub fn in_collection(name: impl Into<String>) -> Self {
        Self {
            collection: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn keep_null(mut self, keep: bool) -> Self {
        self.keep_null = keep;
        self
    }

    pub fn merge_objects(mut self, merge: bool) -> Self {
        self.merge_objects = merge;
        self
    }

    pub fn ignore_revs(mut self, ignore: bool) -> Self {
        self.ignore_revs = ignore;
        self
    }

    pub fn return_old(mut self, return_old: bool) -> Self {
        self.return_old = return_old;
        self
    }

    pub fn rev(mut self, rev: impl Into<String>) -> Self {
        self.rev = Some(rev.into());
        self
    }

    pub fn policy(mut self, policy: RevisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The revision that must match, if any is enforced.
    pub fn enforced_rev(&self) -> Option<&str> {
        match self.policy {
            RevisionPolicy::Error => self.rev.as_deref(),
            RevisionPolicy::Last => None,
        }
    }
}

impl OperationOptions for UpdateOptions {
    const FIELDS: &'static [&'static str] = &[
        "collection",
        "waitForSync",
        "keepNull",
        "mergeObjects",
        "returnNew",
        "returnOld",
        "ignoreRevs",
        "rev",
        "policy",
    ];

    fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    fn validate(&self) -> Result<(), OptionsError> {
        if matches!(self.collection.as_deref(), Some(c) if c.trim().is_empty()) {
            return Err(OptionsError::Invalid("collection override is empty".into()));
        }
        validate_rev(self.rev.as_deref())
    }
}

/// Options for `remove_by_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoveOptions {
    pub collection: Option<String>,
    pub wait_for_sync: bool,
    pub return_old: bool,
    pub rev: Option<String>,
    pub policy: RevisionPolicy,
}

impl RemoveOptions {
    pub fn in_collection(name: impl Into<String>) -> Self {
        Self {
            collection: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn rev(mut self, rev: impl Into<String>) -> Self {
        self.rev = Some(rev.into());
        self
    }

    pub fn return_old(mut self, return_old: bool) -> Self {
        self.return_old = return_old;
        self
    }

    pub fn enforced_rev(&self) -> Option<&str> {
        match self.policy {
            RevisionPolicy::Error => self.rev.as_deref(),
            RevisionPolicy::Last => None,
        }
    }
}

impl OperationOptions for RemoveOptions {
    const FIELDS: &'static [&'static str] =
        &["collection", "waitForSync", "returnOld", "rev", "policy"];

    fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    fn validate(&self) -> Result<(), OptionsError> {
        if matches!(self.collection.as_deref(), Some(c) if c.trim().is_empty()) {
            return Err(OptionsError::Invalid("collection override is empty".into()));
        }
        validate_rev(self.rev.as_deref())
    }
}

/// Options for `remove_many` and `clear`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkRemoveOptions {
    pub collection: Option<String>,
    pub wait_for_sync: bool,
}

impl BulkRemoveOptions {
    pub fn in_collection(name: impl Into<String>) -> Self {
        Self {
            collection: Some(name.into()),
            ..Self::default()
        }
    }
}

impl OperationOptions for BulkRemoveOptions {
    const FIELDS: &'static [&'static str] = &["collection", "waitForSync"];

    fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }
}

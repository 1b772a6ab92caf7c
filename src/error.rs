use std::error::Error;
use std::fmt;

use crate::adapter::Operation;

/// Coarse classification of a failure, stable across drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Session could not be established (unreachable, unknown database, bad credentials).
    Connection,
    /// An operation was attempted without a live session.
    NotConnected,
    /// An id-addressed lookup missed, or no document matched an example.
    NotFound,
    /// Optimistic concurrency check failed.
    Conflict,
    /// The store rejected the document (illegal key, duplicate key, bad body).
    Validation,
    /// The caller supplied options the adapter does not accept.
    InvalidOptions,
    /// Any other store or transport failure.
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Connection => "connection",
            ErrorKind::NotConnected => "not connected",
            ErrorKind::NotFound => "not found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Validation => "validation",
            ErrorKind::InvalidOptions => "invalid options",
            ErrorKind::Storage => "storage",
        };
        f.write_str(name)
    }
}

/// Error reported by a driver, without adapter context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Session establishment or authentication failure.
    Connection(String),
    /// No document with this key in the collection.
    NotFound { collection: String, key: String },
    /// No document in the collection matched the example.
    NoMatch { collection: String },
    /// Revision mismatch. `actual` is the revision currently stored.
    Conflict {
        collection: String,
        key: String,
        actual: String,
    },
    /// Document rejected by store-side constraints.
    Validation(String),
    /// Response or payload could not be (de)serialized.
    Serde(String),
    /// Storage-level error.
    Storage(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Connection(_) => ErrorKind::Connection,
            StoreError::NotFound { .. } | StoreError::NoMatch { .. } => ErrorKind::NotFound,
            StoreError::Conflict { .. } => ErrorKind::Conflict,
            StoreError::Validation(_) => ErrorKind::Validation,
            StoreError::Serde(_) | StoreError::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Connection(msg) => write!(f, "connection failed: {}", msg),
            StoreError::NotFound { collection, key } => {
                write!(f, "document not found: {}/{}", collection, key)
            }
            StoreError::NoMatch { collection } => {
                write!(f, "no document in {} matches the example", collection)
            }
            StoreError::Conflict {
                collection,
                key,
                actual,
            } => write!(
                f,
                "revision conflict on {}/{} (stored revision {})",
                collection, key, actual
            ),
            StoreError::Validation(msg) => write!(f, "document rejected: {}", msg),
            StoreError::Serde(msg) => write!(f, "serialization error: {}", msg),
            StoreError::Storage(msg) => write!(f, "storage error: {}", msg),
        }
    }
}

impl Error for StoreError {}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err.to_string())
    }
}

/// Error returned by `DocumentStoreAdapter` operations.
///
/// Store failures carry the operation name and the collection they targeted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The adapter has no live session.
    NotConnected { operation: Operation },
    /// `connect()` failed.
    Connection { database: String, source: StoreError },
    /// Neither the options nor the adapter name a collection.
    NoCollection { operation: Operation },
    /// Options were rejected before any store call.
    InvalidOptions { operation: Operation, message: String },
    /// The store call failed.
    Store {
        operation: Operation,
        collection: String,
        source: StoreError,
    },
}

impl AdapterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::NotConnected { .. } => ErrorKind::NotConnected,
            AdapterError::Connection { .. } => ErrorKind::Connection,
            AdapterError::NoCollection { .. } => ErrorKind::Validation,
            AdapterError::InvalidOptions { .. } => ErrorKind::InvalidOptions,
            AdapterError::Store { source, .. } => source.kind(),
        }
    }

    /// The operation that failed.
    pub fn operation(&self) -> Operation {
        match self {
            AdapterError::NotConnected { operation }
            | AdapterError::NoCollection { operation }
            | AdapterError::InvalidOptions { operation, .. }
            | AdapterError::Store { operation, .. } => *operation,
            AdapterError::Connection { .. } => Operation::Connect,
        }
    }

    /// The collection the failed call targeted, if it got that far.
    pub fn collection(&self) -> Option<&str> {
        match self {
            AdapterError::Store { collection, .. } => Some(collection),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterError::NotConnected { operation } => {
                write!(f, "{} failed: adapter is not connected", operation)
            }
            AdapterError::Connection { database, source } => {
                write!(f, "connect to database {} failed: {}", database, source)
            }
            AdapterError::NoCollection { operation } => write!(
                f,
                "{} failed: no collection configured and none given in options",
                operation
            ),
            AdapterError::InvalidOptions { operation, message } => {
                write!(f, "{} failed: invalid options: {}", operation, message)
            }
            AdapterError::Store {
                operation,
                collection,
                source,
            } => write!(f, "{} on {} failed: {}", operation, collection, source),
        }
    }
}

impl Error for AdapterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AdapterError::Connection { source, .. } | AdapterError::Store { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

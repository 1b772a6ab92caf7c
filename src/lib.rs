mod adapter;
mod config;
mod document;
mod error;

pub mod driver;
pub mod microsvc;
pub mod options;

pub use adapter::{DocumentStoreAdapter, HostContext, Operation};
pub use config::{AdapterConfig, DEFAULT_URL, ENV_PREFIX, SYSTEM_DATABASE};
pub use document::{
    is_valid_key, BulkResult, Cursor, Document, DocumentHandle, DocumentMeta, Predicate,
    RemoveSummary, WriteResult, ID_FIELD, KEY_FIELD, REV_FIELD,
};
pub use error::{AdapterError, ErrorKind, StoreError};

pub use driver::{DocumentClient, DocumentSession, InMemoryClient};

#[cfg(feature = "arangodb")]
pub use driver::ArangoClient;

//! microsvc - hosts a `DocumentStoreAdapter` as a microservice.
//!
//! A `Service` owns one adapter, drives its lifecycle (`init` on
//! construction, `connect` on `start`, `disconnect` on `stop`) and exposes
//! the CRUD contract as actions named `"<service>.<action>"`.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use docstore_adapter::{microsvc, AdapterConfig, DocumentStoreAdapter, InMemoryClient};
//! use serde_json::json;
//!
//! let adapter = DocumentStoreAdapter::new(
//!     InMemoryClient::new().with_database("meta-query"),
//!     AdapterConfig::new("meta-query").with_collection("markets"),
//! );
//! let mut service = microsvc::Service::new("markets", adapter);
//! service.start().await?;
//!
//! // Direct dispatch
//! let markets = service
//!     .dispatch("markets.find", json!({ "query": { "name": "A" } }), microsvc::Session::new())
//!     .await?;
//!
//! // HTTP transport (requires "http" feature)
//! // microsvc::serve(Arc::new(service), "0.0.0.0:3000").await?;
//! ```
//!
//! ## Actions
//!
//! | Action | Input |
//! |---|---|
//! | `insert` | `entity` |
//! | `insertMany` | `entities` |
//! | `findById` (`get`) | `id` |
//! | `findByIds` | `ids` |
//! | `find`, `findOne`, `count` | `query` (optional) |
//! | `updateById` (`update`) | `id`, `entity` |
//! | `updateMany` | `entities` |
//! | `removeById` (`remove`) | `id` |
//! | `removeMany` | `query` |
//! | `clear` | |
//!
//! Every action also accepts `options`.

mod actions;
mod context;
mod error;
mod service;
mod session;

pub use context::Context;
pub use error::HandlerError;
pub use service::{CommandRequest, CommandResponse, Service};
pub use session::Session;

// HTTP transport (requires "http" feature)
#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::{router, serve};

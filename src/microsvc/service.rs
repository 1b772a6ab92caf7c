//! Service - owns the adapter and routes actions to it.
//!
//! `Service<C>` holds a service name and one `DocumentStoreAdapter<C>`.
//! Commands are named `"<service>.<action>"`; each action maps to one
//! adapter operation.
//!
//! ## Example
//!
//! ```ignore
//! use docstore_adapter::microsvc::{Service, Session};
//! use serde_json::json;
//!
//! let mut service = Service::new("markets", adapter);
//! service.start().await?;
//!
//! let doc = service
//!     .dispatch("markets.insert", json!({ "entity": { "name": "A" } }), Session::new())
//!     .await?;
//! ```

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, info};

use super::actions;
use super::context::Context;
use super::error::HandlerError;
use super::session::Session;
use crate::adapter::{DocumentStoreAdapter, HostContext, Operation};
use crate::driver::DocumentClient;

/// A microservice exposing the CRUD contract of one adapter as actions.
pub struct Service<C: DocumentClient> {
    name: String,
    adapter: DocumentStoreAdapter<C>,
}

impl<C: DocumentClient> Service<C> {
    /// Take ownership of the adapter and bind it to this service. The node
    /// id defaults to `<name>-<pid>`.
    pub fn new(name: impl Into<String>, adapter: DocumentStoreAdapter<C>) -> Self {
        let name = name.into();
        let node_id = format!("{}-{}", name, std::process::id());
        Self::on_node(name, node_id, adapter)
    }

    /// Like [`Service::new`] with an explicit node id.
    pub fn on_node(
        name: impl Into<String>,
        node_id: impl Into<String>,
        mut adapter: DocumentStoreAdapter<C>,
    ) -> Self {
        let name = name.into();
        adapter.init(HostContext::new(name.clone(), node_id));
        Self { name, adapter }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Connect the adapter.
    pub async fn start(&mut self) -> Result<(), HandlerError> {
        self.adapter.connect().await?;
        info!(service = %self.name, "service started");
        Ok(())
    }

    /// Disconnect the adapter.
    pub async fn stop(&mut self) -> Result<(), HandlerError> {
        self.adapter.disconnect().await?;
        info!(service = %self.name, "service stopped");
        Ok(())
    }

    /// Dispatch a command by name.
    ///
    /// Resolves `"<service>.<action>"` to an operation, builds a `Context`
    /// from the input and session, then runs the action.
    pub async fn dispatch(
        &self,
        command: &str,
        input: Value,
        session: Session,
    ) -> Result<Value, HandlerError> {
        let operation = self
            .resolve(command)
            .ok_or_else(|| HandlerError::UnknownCommand(command.to_string()))?;

        debug!(
            service = %self.name,
            command,
            request_id = session.request_id().unwrap_or("-"),
            caller = session.caller().unwrap_or("-"),
            "dispatching"
        );
        let ctx = Context::new(command.to_string(), operation, input, session, &self.adapter);
        actions::run(&ctx).await
    }

    /// Dispatch a `CommandRequest`, returning a `CommandResponse`.
    pub async fn dispatch_request(&self, request: &CommandRequest) -> CommandResponse {
        let session = Session::from_map(request.session_variables.clone());
        match self
            .dispatch(&request.command, request.input.clone(), session)
            .await
        {
            Ok(value) => CommandResponse {
                status: 200,
                body: value,
            },
            Err(e) => CommandResponse {
                status: e.status_code(),
                body: error_body(&e),
            },
        }
    }

    /// Command names this service answers, aliases excluded.
    pub fn commands(&self) -> Vec<String> {
        Operation::ACTIONS
            .iter()
            .map(|op| format!("{}.{}", self.name, op))
            .collect()
    }

    pub fn adapter(&self) -> &DocumentStoreAdapter<C> {
        &self.adapter
    }

    fn resolve(&self, command: &str) -> Option<Operation> {
        command
            .strip_prefix(self.name.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .and_then(Operation::from_action)
    }
}

/// JSON body describing a failed dispatch.
pub(crate) fn error_body(err: &HandlerError) -> Value {
    let mut body = serde_json::json!({ "error": err.to_string() });
    if let Some(kind) = err.kind() {
        body["kind"] = Value::String(kind.to_string());
    }
    body
}

// =============================================================================
// Request / Response types
// =============================================================================

/// An inbound command request.
///
/// ```json
/// {
///   "command": "markets.findById",
///   "input": { "id": "42" },
///   "session_variables": { "x-request-id": "req-1" }
/// }
/// ```
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CommandRequest {
    /// Command name (`"<service>.<action>"`).
    pub command: String,
    /// JSON input payload.
    pub input: Value,
    #[serde(default)]
    pub session_variables: HashMap<String, String>,
}

/// Response from dispatching a command.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CommandResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// Action result, or `{ "error", "kind" }`.
    pub body: Value,
}

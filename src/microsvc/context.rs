//! Context passed to action handlers.
//!
//! Carries the parsed input, session variables, and a reference to the
//! adapter. Handlers access everything they need through the context.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::HandlerError;
use super::session::Session;
use crate::adapter::{DocumentStoreAdapter, Operation};
use crate::document::Predicate;
use crate::driver::DocumentClient;
use crate::options::{parse_options, OperationOptions};

/// Input field holding per-call options.
const OPTIONS_FIELD: &str = "options";

/// The context passed to every action handler.
///
/// ```ignore
/// let id: String = ctx.field("id")?;
/// let options = ctx.options::<ReadOptions>()?;
/// let doc = ctx.adapter().find_by_id(&id, &options).await?;
/// ```
pub struct Context<'a, C: DocumentClient> {
    command_name: String,
    operation: Operation,
    input: Value,
    session: Session,
    adapter: &'a DocumentStoreAdapter<C>,
}

impl<'a, C: DocumentClient> Context<'a, C> {
    pub(crate) fn new(
        command_name: String,
        operation: Operation,
        input: Value,
        session: Session,
        adapter: &'a DocumentStoreAdapter<C>,
    ) -> Self {
        Self {
            command_name,
            operation,
            input,
            session,
            adapter,
        }
    }

    /// Deserialize the whole input payload into a typed struct.
    pub fn input<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_json::from_value(self.input.clone())
            .map_err(|e| HandlerError::DecodeFailed(e.to_string()))
    }

    /// Deserialize one input field. Absent and `null` fields are missing.
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> Result<T, HandlerError> {
        match self.input.get(name) {
            None | Some(Value::Null) => Err(HandlerError::MissingInput(name.to_string())),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| HandlerError::DecodeFailed(format!("{}: {}", name, e))),
        }
    }

    /// The `query` example. Absent means every document.
    pub fn predicate(&self) -> Result<Predicate, HandlerError> {
        let query = self.input.get("query").cloned().unwrap_or(Value::Null);
        Predicate::example(query).map_err(|e| HandlerError::DecodeFailed(format!("query: {}", e)))
    }

    /// Parse `options` under the adapter's unknown-key policy.
    pub fn options<O: OperationOptions>(&self) -> Result<O, HandlerError> {
        let raw = self.input.get(OPTIONS_FIELD).unwrap_or(&Value::Null);
        parse_options(raw, self.adapter.config().unknown_options)
            .map_err(|e| HandlerError::InvalidOptions(e.to_string()))
    }

    pub fn raw_input(&self) -> &Value {
        &self.input
    }

    pub fn command_name(&self) -> &str {
        &self.command_name
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn adapter(&self) -> &'a DocumentStoreAdapter<C> {
        self.adapter
    }

    /// Whether a field is present. `null` counts as absent, as in [`Context::field`].
    pub fn has_field(&self, field: &str) -> bool {
        !matches!(self.input.get(field), None | Some(Value::Null))
    }
}

//! Call metadata forwarded with an action (request headers, bus metadata).

use std::collections::HashMap;

const REQUEST_ID: &str = "x-request-id";
const CALLER: &str = "x-caller";

/// Variables describing who sent a call. Keys are lowercase header names.
///
/// The adapter never reads them; they end up in dispatch logs.
#[derive(Debug, Clone, Default)]
pub struct Session {
    variables: HashMap<String, String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(variables: HashMap<String, String>) -> Self {
        Self { variables }
    }

    /// Correlation id (`x-request-id`).
    pub fn request_id(&self) -> Option<&str> {
        self.get(REQUEST_ID)
    }

    /// Name of the calling service (`x-caller`).
    pub fn caller(&self) -> Option<&str> {
        self.get(CALLER)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(|v| v.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    pub fn has(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }

    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }
}

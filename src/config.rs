//! Connection options for the adapter.

use std::fmt;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::options::UnknownKeys;

/// Default server endpoint.
pub const DEFAULT_URL: &str = "http://127.0.0.1:8529";
/// Database every server has.
pub const SYSTEM_DATABASE: &str = "_system";
/// Prefix of environment variables read by [`AdapterConfig::load`].
pub const ENV_PREFIX: &str = "DOCSTORE";

/// Connection parameters: database, credentials, default collection.
///
/// Deserializes from camelCase keys (`databaseName`, `username`, ...) so it
/// can sit inside a host service's settings; snake_case is also accepted.
/// The `config` crate lowercases file keys, hence the all-lowercase aliases.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdapterConfig {
    pub url: String,
    #[serde(alias = "database_name", alias = "databasename")]
    pub database_name: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Collection used when an operation does not override it.
    pub collection: Option<String>,
    /// Policy for unrecognized option keys in JSON options.
    #[serde(alias = "unknown_options", alias = "unknownoptions")]
    pub unknown_options: UnknownKeys,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            database_name: SYSTEM_DATABASE.to_string(),
            username: None,
            password: None,
            collection: None,
            unknown_options: UnknownKeys::Reject,
        }
    }
}

impl AdapterConfig {
    pub fn new(database_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            ..Self::default()
        }
    }

    /// Load from an optional settings file (any format the `config` crate
    /// understands, extension inferred) overlaid with `DOCSTORE_*`
    /// environment variables, e.g. `DOCSTORE_DATABASE_NAME`.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }
        builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn with_unknown_options(mut self, policy: UnknownKeys) -> Self {
        self.unknown_options = policy;
        self
    }

    /// Username and password, when both are set. Authentication is only
    /// attempted with a complete pair.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) => Some((user, pass)),
            _ => None,
        }
    }
}

impl fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("url", &self.url)
            .field("database_name", &self.database_name)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("collection", &self.collection)
            .field("unknown_options", &self.unknown_options)
            .finish()
    }
}

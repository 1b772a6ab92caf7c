//! Error types for microsvc actions.

use std::error::Error;
use std::fmt;

use crate::error::{AdapterError, ErrorKind};

/// Error type for action dispatch.
#[derive(Debug)]
pub enum HandlerError {
    /// No action with this command name.
    UnknownCommand(String),
    /// Payload decode / deserialization failed.
    DecodeFailed(String),
    /// A required input field is absent or null.
    MissingInput(String),
    /// The `options` object was rejected.
    InvalidOptions(String),
    /// The adapter call failed.
    Adapter(AdapterError),
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::UnknownCommand(name) => write!(f, "unknown command: {}", name),
            HandlerError::DecodeFailed(msg) => write!(f, "decode failed: {}", msg),
            HandlerError::MissingInput(field) => write!(f, "missing input field: {}", field),
            HandlerError::InvalidOptions(msg) => write!(f, "invalid options: {}", msg),
            HandlerError::Adapter(e) => write!(f, "{}", e),
        }
    }
}

impl Error for HandlerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            HandlerError::Adapter(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AdapterError> for HandlerError {
    fn from(err: AdapterError) -> Self {
        HandlerError::Adapter(err)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::DecodeFailed(err.to_string())
    }
}

impl HandlerError {
    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::UnknownCommand(_) => 404,
            HandlerError::DecodeFailed(_) => 400,
            HandlerError::MissingInput(_) => 400,
            HandlerError::InvalidOptions(_) => 400,
            HandlerError::Adapter(e) => match e.kind() {
                ErrorKind::NotFound => 404,
                ErrorKind::Conflict => 409,
                ErrorKind::Validation => 422,
                ErrorKind::InvalidOptions => 400,
                ErrorKind::NotConnected | ErrorKind::Connection => 503,
                ErrorKind::Storage => 500,
            },
        }
    }

    /// Error kind of the underlying adapter failure, if any.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            HandlerError::Adapter(e) => Some(e.kind()),
            _ => None,
        }
    }
}

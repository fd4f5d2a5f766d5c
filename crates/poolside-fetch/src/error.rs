//! Request failure taxonomy

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Why an operation did not produce a payload
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    /// No response was received: network failure or timeout
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// A response arrived with a status the caller classifies as an error
    #[error("server failure ({status}): {message}")]
    Server {
        status: u16,
        message: String,
        body: Value,
    },

    /// A successful response whose payload did not have the expected shape
    #[error("could not decode response ({status}): {message}")]
    Decode { status: u16, message: String },

    /// Superseded by a newer request or torn down; never surfaced as state
    #[error("request cancelled")]
    Cancelled,
}

impl RequestError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Server { status, .. } | RequestError::Decode { status, .. } => {
                Some(*status)
            }
            RequestError::Transport { .. } | RequestError::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RequestError::Cancelled)
    }

    /// Transport failures and 5xx responses, the usual retry candidates
    pub fn is_transient(&self) -> bool {
        match self {
            RequestError::Transport { .. } => true,
            RequestError::Server { status, .. } => *status >= 500,
            RequestError::Decode { .. } | RequestError::Cancelled => false,
        }
    }

    /// The detail published in controller state
    pub fn info(&self) -> ErrorInfo {
        let (message, body) = match self {
            RequestError::Transport { message } => (message.clone(), None),
            RequestError::Server { message, body, .. } => (message.clone(), Some(body.clone())),
            RequestError::Decode { message, .. } => (message.clone(), None),
            RequestError::Cancelled => ("request cancelled".to_string(), None),
        };

        ErrorInfo {
            message,
            status_code: self.status(),
            body,
        }
    }
}

/// Last failure detail as exposed to the UI layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInfo {
    pub message: String,
    pub status_code: Option<u16>,
    pub body: Option<Value>,
}

/// Pull a human-readable message out of an error body
///
/// Looks for the usual `message`, `error` and `detail` keys before falling
/// back to a generic description of the status.
pub(crate) fn server_message(status: u16, body: &Value) -> String {
    ["message", "error", "detail"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .or_else(|| body.as_str().filter(|s| !s.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| format!("request failed with status {}", status))
}

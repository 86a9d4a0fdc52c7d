//! crates/studybank_core/src/ports.rs
//!
//! Defines the service contracts (traits) the client core depends on.
//! These traits form the boundary of the hexagonal architecture: the core
//! never touches a socket or a file, it talks to an `HttpTransport` and a
//! `KeyValueStore`, and the `client` service plugs in the real adapters.

use async_trait::async_trait;
use bytes::Bytes;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type for every port operation and every store action.
///
/// HTTP failures are classified by status so callers match on a variant
/// instead of inspecting response payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// 4xx responses other than 401, 404 and 409.
    #[error("{message}")]
    Validation { status: u16, message: String },
    /// 401; the session has already been cleared when this is returned.
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => PortError::Unauthorized(message),
            404 => PortError::NotFound(message),
            409 => PortError::Conflict(message),
            400..=499 => PortError::Validation { status, message },
            _ => PortError::Server { status, message },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, PortError::Unauthorized(_))
    }

    /// The HTTP status behind this error, if there was a response at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            PortError::Validation { status, .. } | PortError::Server { status, .. } => {
                Some(*status)
            }
            PortError::Unauthorized(_) => Some(401),
            PortError::NotFound(_) => Some(404),
            PortError::Conflict(_) => Some(409),
            PortError::Transport(_) | PortError::Storage(_) | PortError::Unexpected(_) => None,
        }
    }

    /// Message a store shows for this error: what the server said, or the
    /// action's generic fallback when there was no usable response.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            PortError::Validation { message, .. }
            | PortError::Server { message, .. }
            | PortError::Unauthorized(message)
            | PortError::NotFound(message)
            | PortError::Conflict(message) => message.clone(),
            PortError::Transport(_) | PortError::Storage(_) | PortError::Unexpected(_) => {
                fallback.to_string()
            }
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// HTTP Transport Port
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    /// A single file part.
    Multipart {
        field: String,
        file_name: String,
        data: Bytes,
    },
}

/// One outbound request, path relative to the configured API base.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    /// Ordered pairs; a key may repeat.
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            bearer: None,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Value of the first query pair with this key.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A raw response: status plus undecoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Dispatches one request. Only transport failures are errors here;
    /// any HTTP status, including 4xx/5xx, is an `Ok` response.
    async fn send(&self, request: ApiRequest) -> PortResult<ApiResponse>;
}

//=========================================================================================
// Durable Client Storage Port
//=========================================================================================

/// String key-value storage that survives process restarts.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> PortResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> PortResult<()>;
    fn remove(&self, key: &str) -> PortResult<()>;
}

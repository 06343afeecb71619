use reqwest::StatusCode;
use thiserror::Error;

use crate::models::ValidationError;

/// Failure of a single API operation.
///
/// HTTP-status failures display as the raw response body, byte for byte, so
/// callers can present the server's message verbatim. The status and kind
/// remain available for branching.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request could not be sent or the response could not be received.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 4xx response.
    #[error("{body}")]
    Client { status: StatusCode, body: String },

    /// 5xx response.
    #[error("{body}")]
    Server { status: StatusCode, body: String },

    /// Any other status outside 200-299.
    #[error("{body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    /// Success status, but the body did not match the expected shape.
    #[error("Invalid response: {source}")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// Rejected locally before any request was sent.
    #[error("{0}")]
    InvalidInput(#[from] ValidationError),
}

/// Maximum length for response bodies written to the log
const MAX_LOGGED_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_for_log(body: &str) -> String {
        if body.len() <= MAX_LOGGED_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_LOGGED_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Classify a non-success status. The body is kept intact.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        if status.is_client_error() {
            ApiError::Client { status, body }
        } else if status.is_server_error() {
            ApiError::Server { status, body }
        } else {
            ApiError::UnexpectedStatus { status, body }
        }
    }

    /// HTTP status, when the failure came from a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Client { status, .. }
            | ApiError::Server { status, .. }
            | ApiError::UnexpectedStatus { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            ApiError::Decode { .. } | ApiError::InvalidInput(_) => None,
        }
    }

    /// Server-supplied body for status failures.
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Client { body, .. }
            | ApiError::Server { body, .. }
            | ApiError::UnexpectedStatus { body, .. }
            | ApiError::Decode { body, .. } => Some(body),
            ApiError::Transport(_) | ApiError::InvalidInput(_) => None,
        }
    }

    /// Message to show the user.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

/*
[INPUT]:  Error sources (HTTP transport, engine API, serialization, auth)
[OUTPUT]: Structured error types with status context and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the execution engine adapter
#[derive(Error, Debug)]
pub enum EngineError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Engine answered with a non-success status
    #[error("engine error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Credentials missing, expired and not refreshable, or rejected
    #[error("not authenticated with the execution engine")]
    Unauthorized,

    /// Requested resource does not exist
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Response did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Transport failures and server-side faults may succeed when repeated.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Http(_) | EngineError::InvalidResponse(_) => true,
            EngineError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// HTTP status attached to the error, when the engine produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            EngineError::Api { status, .. } => Some(*status),
            EngineError::Unauthorized => Some(StatusCode::UNAUTHORIZED.as_u16()),
            EngineError::NotFound { .. } => Some(StatusCode::NOT_FOUND.as_u16()),
            EngineError::Http(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Message suitable for showing to an operator.
    pub fn detail(&self) -> String {
        match self {
            EngineError::Api { message, .. } | EngineError::NotFound { message } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }

    /// Create an error from a response status and decoded detail message
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            StatusCode::UNAUTHORIZED => EngineError::Unauthorized,
            StatusCode::NOT_FOUND => EngineError::NotFound { message },
            _ => EngineError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        let server_err = EngineError::from_status(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(server_err.is_retryable());

        let rejected = EngineError::from_status(StatusCode::BAD_REQUEST, "bad target");
        assert!(!rejected.is_retryable());
        assert!(!EngineError::Unauthorized.is_retryable());
    }

    #[test]
    fn test_from_status_variants() {
        assert!(matches!(
            EngineError::from_status(StatusCode::UNAUTHORIZED, "expired"),
            EngineError::Unauthorized
        ));

        let err = EngineError::from_status(StatusCode::NOT_FOUND, "Task not found");
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.detail(), "Task not found");

        match EngineError::from_status(StatusCode::CONFLICT, "engine at capacity") {
            EngineError::Api { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "engine at capacity");
            }
            _ => panic!("Expected Api error variant"),
        }
    }
}

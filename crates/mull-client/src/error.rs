//! Error types for generation service calls.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the generation service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered with a non-success status.
    #[error("API error: {status}: {body}")]
    Api { status: u16, body: String },

    /// Server is not running or not reachable.
    #[error("Generation service not reachable at {0}")]
    ServerNotRunning(String),

    /// The request did not finish in time.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The response carried no generated text.
    #[error("Response contained no generated text")]
    EmptyResponse,

    /// The configured endpoint is not a valid URL.
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),
}

impl ClientError {
    /// Classify a transport error from reqwest.
    pub(crate) fn from_transport(err: reqwest::Error, endpoint: &str, timeout: Duration) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(timeout)
        } else if err.is_connect() {
            ClientError::ServerNotRunning(endpoint.to_string())
        } else {
            ClientError::Http(err)
        }
    }
}

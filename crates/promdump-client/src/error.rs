//! Error types for the Prometheus query client

use thiserror::Error;

/// Errors that can occur while querying Prometheus
#[derive(Debug, Error)]
pub enum ClientError {
    /// Base URL could not be turned into an API endpoint
    #[error("Invalid Prometheus URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Connection, timeout or body transfer failure
    #[error("Request to Prometheus failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Prometheus answered with `"status": "error"`
    #[error("Prometheus returned {error_type} error: {message}")]
    Api { error_type: String, message: String },

    /// Non-success HTTP status without a decodable API error
    #[error("Prometheus responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not a valid query response
    #[error("Failed to decode Prometheus response: {0}")]
    Decode(String),
}

/// Result type alias for ClientError
pub type Result<T> = std::result::Result<T, ClientError>;

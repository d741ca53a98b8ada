//! Gateway error types

use stockdesk_core::CoreError;
use thiserror::Error;

/// Gateway error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or transport failure below the HTTP layer
    #[error("Request failed: {0}")]
    Request(reqwest::Error),

    /// Call exceeded the configured deadline
    #[error("Request timed out")]
    Timeout,

    /// Server returned a non-success status
    #[error("Server error {status}: {body}")]
    Http { status: u16, body: String },

    /// Login rejected or the login response was malformed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A 401 was encountered mid-session; the local session has been
    /// cleared and the caller must re-authenticate
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Durable storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] CoreError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Create error from a non-success HTTP status code
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 => Self::AuthenticationRequired,
            _ => Self::Http {
                status: status.as_u16(),
                body,
            },
        }
    }

    /// Failures below the HTTP layer, the candidates for offline
    /// diversion. Decode failures mean the server answered, so they do
    /// not count.
    pub fn is_network_failure(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::Request(err) => !err.is_decode(),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(err)
        }
    }
}

//! Error types for the portal HTTP client.

use portal_core::error::ApiError;

/// All errors that can occur inside the HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Missing or malformed configuration.
    #[error("portal client config error: {0}")]
    Config(String),

    /// The API answered with an error status and no usable body.
    #[error("portal API error {status_code}: {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Error message from the API, or the bare status.
        message: String,
    },

    /// Request timed out.
    #[error("portal request timed out")]
    Timeout,

    /// Network or HTTP client error.
    #[error("portal network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("portal json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Timeout => Self::Timeout,
            ClientError::Network(e) if e.is_timeout() => Self::Timeout,
            ClientError::Network(e) if e.is_decode() => Self::Decode {
                reason: e.to_string(),
            },
            ClientError::Api {
                status_code,
                message,
            } => Self::Status {
                status_code,
                message,
            },
            ClientError::Json(e) => Self::Decode {
                reason: e.to_string(),
            },
            other @ (ClientError::Network(_) | ClientError::Config(_)) => Self::Transport {
                reason: other.to_string(),
            },
        }
    }
}

//! Store error types.

use thiserror::Error;

/// Errors that can occur during document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A collection or document address is malformed.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The addressed document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The store could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// The store rejected the request.
    #[error("store returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// A store response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The store credential is missing or unusable.
    #[error("credentials error: {0}")]
    Credentials(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

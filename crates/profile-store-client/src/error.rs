//! Error types for profile store operations.

use thiserror::Error;

/// Errors from the profile store client.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store rejected the request. The summary describes the response
    /// body without reproducing it.
    #[error("Store error ({status}): {summary}")]
    Store { status: u16, summary: String },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using StoreError.
pub type StoreResult<T> = Result<T, StoreError>;

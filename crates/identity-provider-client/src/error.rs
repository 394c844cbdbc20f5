//! Error types for identity provider operations.

use thiserror::Error;

/// Errors from the identity provider client.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the request. The message is the provider's own
    /// description and is suitable for showing to the user verbatim.
    #[error("Provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// An operation required a stored session but none is held.
    #[error("No session stored")]
    NoSession,

    /// Invalid client configuration (bad URL, bad key header).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AuthError {
    /// The user-facing message for this error.
    ///
    /// Provider rejections surface the provider's own text; everything else
    /// falls back to the Display impl.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Provider { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

//! Error types for the coordination engine.

use identity_provider_client::AuthError;
use profile_store_client::StoreError;
use thiserror::Error;

/// Errors surfaced by coordinator operations.
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// Identity provider failure.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Profile store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CoordinatorError {
    /// Short message suitable for display to the user.
    pub fn user_message(&self) -> String {
        match self {
            CoordinatorError::Auth(err) => err.user_message(),
            CoordinatorError::Store(_) => "No se pudo guardar el perfil".to_string(),
        }
    }
}

/// Result type alias using CoordinatorError.
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

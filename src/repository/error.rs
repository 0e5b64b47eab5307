use thiserror::Error;

use crate::models::ValidationError;
use crate::services::StoreError;

/// Failures surfaced by the collection and list repositories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("You need to sign in first")]
    NotAuthenticated,

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Request failed: {0}")]
    RemoteRequestFailed(String),

    #[error(transparent)]
    ValidationFailed(#[from] ValidationError),
}

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unauthorized => Self::NotAuthenticated,
            StoreError::PolicyViolation(msg) => Self::Forbidden(msg),
            StoreError::Request(msg) | StoreError::Database(msg) | StoreError::Decode(msg) => {
                Self::RemoteRequestFailed(msg)
            }
        }
    }
}

//! Seam to the relational store holding collections and their entries.
//!
//! The store enforces ownership itself, like a row-level security policy:
//! implementations identify the caller from the access token and only ever
//! expose or change that caller's rows.

use thiserror::Error;

use crate::clients::{SupabaseError, supabase::RLS_VIOLATION_CODE};
use crate::domain::{CollectionId, UserId};
use crate::models::{Collection, CollectionFields, ListEntry, Session};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not authorized")]
    Unauthorized,

    #[error("{0}")]
    PolicyViolation(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

impl From<SupabaseError> for StoreError {
    fn from(err: SupabaseError) -> Self {
        if err.code() == Some(RLS_VIOLATION_CODE) || err.status() == Some(403) {
            return Self::PolicyViolation(err.to_string());
        }
        if err.status() == Some(401) {
            return Self::Unauthorized;
        }

        match err {
            SupabaseError::Decode(msg) => Self::Decode(msg),
            other => Self::Request(other.to_string()),
        }
    }
}

/// Credentials a store call is made with.
#[derive(Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub access_token: String,
}

impl From<&Session> for Caller {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user.id,
            access_token: session.access_token.clone(),
        }
    }
}

impl std::fmt::Debug for Caller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Caller")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
pub trait CollectionStore: Send + Sync {
    /// The caller's collections, newest first.
    async fn list_collections(&self, caller: &Caller) -> Result<Vec<Collection>, StoreError>;

    async fn insert_collection(
        &self,
        caller: &Caller,
        fields: &CollectionFields,
    ) -> Result<Collection, StoreError>;

    /// Returns the number of rows changed. Rows the caller does not own are
    /// invisible, so a foreign id changes nothing.
    async fn update_collection(
        &self,
        caller: &Caller,
        id: &CollectionId,
        fields: &CollectionFields,
    ) -> Result<u64, StoreError>;

    async fn delete_collection(&self, caller: &Caller, id: &CollectionId)
    -> Result<u64, StoreError>;
}

#[async_trait::async_trait]
pub trait EntryStore: Send + Sync {
    async fn list_entries(
        &self,
        caller: &Caller,
        collection_id: &CollectionId,
    ) -> Result<Vec<ListEntry>, StoreError>;

    /// # Errors
    ///
    /// [`StoreError::PolicyViolation`] when the collection is not the caller's.
    async fn insert_entry(&self, caller: &Caller, entry: &ListEntry)
    -> Result<ListEntry, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_postgrest_failures() {
        let rls = StoreError::from(SupabaseError::Api {
            status: 403,
            code: Some("42501".to_string()),
            message: "new row violates row-level security policy".to_string(),
        });
        assert!(matches!(rls, StoreError::PolicyViolation(_)));

        let expired = StoreError::from(SupabaseError::Api {
            status: 401,
            code: Some("PGRST301".to_string()),
            message: "JWT expired".to_string(),
        });
        assert!(matches!(expired, StoreError::Unauthorized));

        let timeout = StoreError::from(SupabaseError::Timeout);
        assert!(matches!(timeout, StoreError::Request(_)));
    }
}

use std::sync::Arc;
use tracing::info;

use super::{AuthorizationGuard, RepositoryError};
use crate::domain::CollectionId;
use crate::models::{AnimeSnapshot, ListEntry, Tracking};
use crate::services::EntryStore;

/// Read and append access to the entries of a collection.
///
/// Whether the collection belongs to the caller is decided by the store;
/// a foreign collection lists as empty and refuses inserts.
#[derive(Clone)]
pub struct ListRepository {
    guard: AuthorizationGuard,
    store: Arc<dyn EntryStore>,
}

impl ListRepository {
    #[must_use]
    pub fn new(guard: AuthorizationGuard, store: Arc<dyn EntryStore>) -> Self {
        Self { guard, store }
    }

    pub async fn list_by_collection(
        &self,
        collection_id: &CollectionId,
    ) -> Result<Vec<ListEntry>, RepositoryError> {
        let caller = self.guard.authorize()?;
        Ok(self.store.list_entries(&caller, collection_id).await?)
    }

    /// Stores a copy of `anime` with the caller's tracking fields.
    pub async fn add(
        &self,
        collection_id: CollectionId,
        anime: AnimeSnapshot,
        tracking: Tracking,
    ) -> Result<ListEntry, RepositoryError> {
        let caller = self.guard.authorize()?;
        tracking.validate()?;

        let entry = ListEntry::new(collection_id, anime, tracking);
        let stored = self.store.insert_entry(&caller, &entry).await?;
        info!(
            collection = %collection_id,
            mal_id = %stored.anime.mal_id,
            "Entry added"
        );
        Ok(stored)
    }
}

//! `SeaORM` implementation of the store traits.

use async_trait::async_trait;
use tracing::debug;

use crate::db::Store;
use crate::domain::{CollectionId, UserId};
use crate::models::{Collection, CollectionFields, ListEntry};
use crate::services::store_service::{Caller, CollectionStore, EntryStore, StoreError};

pub struct SeaOrmStore {
    store: Store,
}

impl SeaOrmStore {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// The identity behind the access token. The user id carried by the caller is not trusted.
    async fn authenticate(&self, caller: &Caller) -> Result<UserId, StoreError> {
        self.store
            .resolve_caller(&caller.access_token)
            .await?
            .ok_or(StoreError::Unauthorized)
    }
}

#[async_trait]
impl CollectionStore for SeaOrmStore {
    async fn list_collections(&self, caller: &Caller) -> Result<Vec<Collection>, StoreError> {
        let owner = self.authenticate(caller).await?;
        Ok(self.store.list_collections(&owner).await?)
    }

    async fn insert_collection(
        &self,
        caller: &Caller,
        fields: &CollectionFields,
    ) -> Result<Collection, StoreError> {
        let owner = self.authenticate(caller).await?;
        Ok(self.store.insert_collection(&owner, fields).await?)
    }

    async fn update_collection(
        &self,
        caller: &Caller,
        id: &CollectionId,
        fields: &CollectionFields,
    ) -> Result<u64, StoreError> {
        let owner = self.authenticate(caller).await?;
        Ok(self.store.update_collection(id, &owner, fields).await?)
    }

    async fn delete_collection(
        &self,
        caller: &Caller,
        id: &CollectionId,
    ) -> Result<u64, StoreError> {
        let owner = self.authenticate(caller).await?;
        Ok(self.store.delete_collection(id, &owner).await?)
    }
}

#[async_trait]
impl EntryStore for SeaOrmStore {
    async fn list_entries(
        &self,
        caller: &Caller,
        collection_id: &CollectionId,
    ) -> Result<Vec<ListEntry>, StoreError> {
        let owner = self.authenticate(caller).await?;
        if !self.store.collection_owned_by(collection_id, &owner).await? {
            debug!(%collection_id, "Listing entries of a collection the caller cannot see");
            return Ok(Vec::new());
        }
        Ok(self.store.list_entries(collection_id).await?)
    }

    async fn insert_entry(
        &self,
        caller: &Caller,
        entry: &ListEntry,
    ) -> Result<ListEntry, StoreError> {
        let owner = self.authenticate(caller).await?;
        if !self
            .store
            .collection_owned_by(&entry.collection_id, &owner)
            .await?
        {
            return Err(StoreError::PolicyViolation(
                "new row violates row-level security policy for table \"collection_animes\""
                    .to_string(),
            ));
        }
        Ok(self.store.insert_entry(entry).await?)
    }
}

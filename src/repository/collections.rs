use std::sync::Arc;
use tracing::{debug, info};

use super::{AuthorizationGuard, RepositoryError};
use crate::domain::CollectionId;
use crate::models::{Collection, CollectionFields};
use crate::services::CollectionStore;

/// Collection CRUD for the signed-in user. Nothing is cached; every call goes to the store.
#[derive(Clone)]
pub struct CollectionRepository {
    guard: AuthorizationGuard,
    store: Arc<dyn CollectionStore>,
}

impl CollectionRepository {
    #[must_use]
    pub fn new(guard: AuthorizationGuard, store: Arc<dyn CollectionStore>) -> Self {
        Self { guard, store }
    }

    /// The caller's collections, newest first.
    pub async fn list(&self) -> Result<Vec<Collection>, RepositoryError> {
        let caller = self.guard.authorize()?;
        Ok(self.store.list_collections(&caller).await?)
    }

    /// # Errors
    ///
    /// [`RepositoryError::ValidationFailed`] for a blank name or more than three preview images.
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        preview_images: &[String],
    ) -> Result<Collection, RepositoryError> {
        let caller = self.guard.authorize()?;
        let fields = CollectionFields::new(name, description, preview_images.to_vec()).normalized()?;

        let collection = self.store.insert_collection(&caller, &fields).await?;
        info!(collection = %collection.id, "Collection created");
        Ok(collection)
    }

    /// Applies `fields` when the caller owns the collection. A missing or foreign
    /// collection is not reported.
    pub async fn update(
        &self,
        id: &CollectionId,
        fields: &CollectionFields,
    ) -> Result<(), RepositoryError> {
        let caller = self.guard.authorize()?;
        let fields = fields.normalized()?;

        let changed = self.store.update_collection(&caller, id, &fields).await?;
        if changed == 0 {
            debug!(collection = %id, "Update matched no owned collection");
        }
        Ok(())
    }

    pub async fn delete(&self, id: &CollectionId) -> Result<(), RepositoryError> {
        let caller = self.guard.authorize()?;

        let removed = self.store.delete_collection(&caller, id).await?;
        if removed == 0 {
            debug!(collection = %id, "Delete matched no owned collection");
        } else {
            info!(collection = %id, "Collection deleted");
        }
        Ok(())
    }
}

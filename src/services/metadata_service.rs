use async_trait::async_trait;

use crate::clients::jikan::{JikanClient, MetadataError};
use crate::domain::MalId;
use crate::models::AnimeMetadata;

/// Read-only source of anime catalog data.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<AnimeMetadata>, MetadataError>;

    async fn list_seasonal(&self, limit: u32) -> Result<Vec<AnimeMetadata>, MetadataError>;

    async fn get_by_id(&self, mal_id: MalId) -> Result<AnimeMetadata, MetadataError>;
}

#[async_trait]
impl MetadataSource for JikanClient {
    async fn search(&self, query: &str) -> Result<Vec<AnimeMetadata>, MetadataError> {
        Self::search(self, query).await
    }

    async fn list_seasonal(&self, limit: u32) -> Result<Vec<AnimeMetadata>, MetadataError> {
        Self::list_seasonal(self, limit).await
    }

    async fn get_by_id(&self, mal_id: MalId) -> Result<AnimeMetadata, MetadataError> {
        Self::get_by_id(self, mal_id).await
    }
}

use std::sync::Arc;

use super::{Messages, ViewState};
use crate::domain::MalId;
use crate::models::AnimeMetadata;
use crate::services::MetadataSource;

/// One anime, fetched by id.
pub struct AnimeDetailView {
    source: Arc<dyn MetadataSource>,
    messages: Messages,
    pub state: ViewState<AnimeMetadata>,
}

impl AnimeDetailView {
    #[must_use]
    pub fn new(source: Arc<dyn MetadataSource>, messages: Messages) -> Self {
        Self {
            source,
            messages,
            state: ViewState::Idle,
        }
    }

    pub async fn load(&mut self, mal_id: MalId) -> &ViewState<AnimeMetadata> {
        self.state = ViewState::Loading;
        let result = self.source.get_by_id(mal_id).await;
        self.state = ViewState::from_result(result, |e| self.messages.metadata_error(e));
        &self.state
    }
}

/// Anime airing this season.
pub struct SeasonalView {
    source: Arc<dyn MetadataSource>,
    messages: Messages,
    limit: u32,
    pub state: ViewState<Vec<AnimeMetadata>>,
}

impl SeasonalView {
    #[must_use]
    pub fn new(source: Arc<dyn MetadataSource>, limit: u32, messages: Messages) -> Self {
        Self {
            source,
            messages,
            limit,
            state: ViewState::Idle,
        }
    }

    pub async fn load(&mut self) -> &ViewState<Vec<AnimeMetadata>> {
        self.state = ViewState::Loading;
        let result = self.source.list_seasonal(self.limit).await;
        self.state = ViewState::from_result(result, |e| self.messages.metadata_error(e));
        &self.state
    }
}

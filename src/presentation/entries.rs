use std::collections::BTreeSet;
use tracing::debug;

use super::{Messages, ViewState};
use crate::domain::CollectionId;
use crate::models::entry::{MAX_SCORE, parse_optional_date};
use crate::models::{AnimeMetadata, AnimeSnapshot, ListEntry, Tracking, ValidationError, WatchStatus};
use crate::repository::{ListRepository, RepositoryError};

/// Entries of one collection, with a local title filter.
///
/// Status edits only change the in-memory list. There is no update operation
/// for entries, so the view tracks which rows differ from what was loaded.
pub struct AnimeListView {
    repo: ListRepository,
    messages: Messages,
    collection_id: Option<CollectionId>,
    filter: String,
    unsaved: BTreeSet<usize>,
    pub state: ViewState<Vec<ListEntry>>,
}

impl AnimeListView {
    #[must_use]
    pub fn new(repo: ListRepository, messages: Messages) -> Self {
        Self {
            repo,
            messages,
            collection_id: None,
            filter: String::new(),
            unsaved: BTreeSet::new(),
            state: ViewState::Idle,
        }
    }

    pub async fn load(&mut self, collection_id: CollectionId) -> &ViewState<Vec<ListEntry>> {
        if !self.unsaved.is_empty() {
            debug!(discarded = self.unsaved.len(), "Reload discards local status edits");
        }
        self.collection_id = Some(collection_id);
        self.unsaved.clear();
        self.state = ViewState::Loading;

        let result = self.repo.list_by_collection(&collection_id).await;
        self.state = ViewState::from_result(result, |e| self.messages.repository_error(e));
        &self.state
    }

    #[must_use]
    pub const fn collection_id(&self) -> Option<CollectionId> {
        self.collection_id
    }

    pub fn set_filter(&mut self, text: impl Into<String>) {
        self.filter = text.into();
    }

    /// Loaded entries whose title contains the filter text, case-insensitively,
    /// paired with their index in the full list.
    #[must_use]
    pub fn visible(&self) -> Vec<(usize, &ListEntry)> {
        let Some(entries) = self.state.value() else {
            return Vec::new();
        };
        let needle = self.filter.trim().to_lowercase();

        entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                needle.is_empty() || entry.anime.title.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Changes the status shown for one entry. Returns false for an unknown index.
    pub fn change_status(&mut self, index: usize, status: WatchStatus) -> bool {
        let Some(entry) = self.state.value_mut().and_then(|entries| entries.get_mut(index)) else {
            return false;
        };
        if entry.tracking.status != status {
            entry.tracking.status = status;
            self.unsaved.insert(index);
        }
        true
    }

    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        !self.unsaved.is_empty()
    }

    #[must_use]
    pub fn is_unsaved(&self, index: usize) -> bool {
        self.unsaved.contains(&index)
    }
}

/// Form for adding an anime to one of the user's collections.
#[derive(Debug, Clone)]
pub struct AddEntryForm {
    anime: AnimeMetadata,
    pub collection_id: Option<CollectionId>,
    pub status: WatchStatus,
    pub progress: u32,
    pub score: u8,
    pub started_at: String,
    pub finished_at: String,
    pub notes: String,
    pub state: ViewState<ListEntry>,
}

impl AddEntryForm {
    /// Starts from the anime's public score, rounded into 0..=10.
    #[must_use]
    pub fn new(anime: AnimeMetadata) -> Self {
        let score = anime
            .score
            .map_or(0, |s| s.round().clamp(0.0, f32::from(MAX_SCORE)) as u8);

        Self {
            anime,
            collection_id: None,
            status: WatchStatus::default(),
            progress: 0,
            score,
            started_at: String::new(),
            finished_at: String::new(),
            notes: String::new(),
            state: ViewState::Idle,
        }
    }

    #[must_use]
    pub const fn anime(&self) -> &AnimeMetadata {
        &self.anime
    }

    /// Checks the form and returns the target collection and tracking fields.
    ///
    /// # Errors
    ///
    /// [`ValidationError::CollectionNotSelected`], an out-of-range score or a malformed date.
    pub fn validate(&self) -> Result<(CollectionId, Tracking), ValidationError> {
        let collection_id = self
            .collection_id
            .ok_or(ValidationError::CollectionNotSelected)?;

        let tracking = Tracking {
            status: self.status,
            progress: self.progress,
            score: self.score,
            started_at: parse_optional_date(&self.started_at)?,
            finished_at: parse_optional_date(&self.finished_at)?,
            notes: self.notes.trim().to_string(),
        };
        tracking.validate()?;

        Ok((collection_id, tracking))
    }

    /// Adds the entry. The outcome is also kept in `state`, rendered with `messages`.
    pub async fn submit(
        &mut self,
        repo: &ListRepository,
        messages: Messages,
    ) -> Result<ListEntry, RepositoryError> {
        self.state = ViewState::Loading;
        let result = match self.validate() {
            Ok((collection_id, tracking)) => {
                repo.add(collection_id, AnimeSnapshot::from(&self.anime), tracking)
                    .await
            }
            Err(e) => Err(e.into()),
        };
        self.state = match &result {
            Ok(entry) => ViewState::Success(entry.clone()),
            Err(e) => ViewState::Error(messages.repository_error(e)),
        };
        result
    }
}

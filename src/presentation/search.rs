//! Search-as-you-type.
//!
//! Every call to [`SearchView::input`] takes the next sequence number. A request
//! is sent only after the debounce window passes with no newer input, and its
//! response is applied only if no newer input arrived while it was in flight.
//! Out-of-order responses are therefore dropped instead of overwriting newer
//! results.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{Messages, ViewState};
use crate::models::AnimeMetadata;
use crate::services::MetadataSource;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub results: ViewState<Vec<AnimeMetadata>>,
    /// Sequence number of the input the current state reflects.
    pub sequence: u64,
}

#[derive(Clone)]
pub struct SearchView {
    source: Arc<dyn MetadataSource>,
    debounce: Duration,
    messages: Messages,
    latest: Arc<AtomicU64>,
    state: Arc<RwLock<SearchState>>,
}

impl SearchView {
    #[must_use]
    pub fn new(source: Arc<dyn MetadataSource>, debounce: Duration, messages: Messages) -> Self {
        Self {
            source,
            debounce,
            messages,
            latest: Arc::new(AtomicU64::new(0)),
            state: Arc::new(RwLock::new(SearchState::default())),
        }
    }

    /// Records a new query. The returned handle finishes once this input has
    /// been applied or superseded.
    pub fn input(&self, query: impl Into<String>) -> JoinHandle<()> {
        let sequence = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let query = query.into().trim().to_string();

        let view = self.clone();
        tokio::spawn(async move { view.run(sequence, query).await })
    }

    async fn run(self, sequence: u64, query: String) {
        if query.is_empty() {
            self.apply(sequence, &query, ViewState::Idle).await;
            return;
        }

        tokio::time::sleep(self.debounce).await;
        if !self.is_current(sequence) {
            debug!(sequence, "Search input superseded during debounce");
            return;
        }

        if !self.apply(sequence, &query, ViewState::Loading).await {
            return;
        }

        let results = match self.source.search(&query).await {
            Ok(results) => ViewState::Success(results),
            Err(e) => ViewState::Error(self.messages.metadata_error(&e)),
        };

        if !self.apply(sequence, &query, results).await {
            debug!(sequence, query = %query, "Dropping stale search response");
        }
    }

    fn is_current(&self, sequence: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == sequence
    }

    /// Writes `results` if `sequence` is still the newest input.
    async fn apply(
        &self,
        sequence: u64,
        query: &str,
        results: ViewState<Vec<AnimeMetadata>>,
    ) -> bool {
        let mut state = self.state.write().await;
        if !self.is_current(sequence) {
            return false;
        }
        state.query = query.to_string();
        state.results = results;
        state.sequence = sequence;
        true
    }

    pub async fn snapshot(&self) -> SearchState {
        self.state.read().await.clone()
    }

    pub async fn results(&self) -> ViewState<Vec<AnimeMetadata>> {
        self.state.read().await.results.clone()
    }

    #[must_use]
    pub fn latest_sequence(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}

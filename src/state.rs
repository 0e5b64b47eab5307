use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::clients::jikan::JikanClient;
use crate::clients::supabase::SupabaseClient;
use crate::config::{BackendKind, Config};
use crate::db::Store;
use crate::presentation::{
    AnimeDetailView, AnimeListView, CollectionsView, Messages, SearchView, SeasonalView,
};
use crate::repository::{AuthorizationGuard, CollectionRepository, ListRepository};
use crate::services::{
    AuthBackend, CollectionStore, EntryStore, MetadataSource, SeaOrmAuthBackend, SeaOrmStore,
    SessionFile, SupabaseAuthBackend, SupabaseStore,
};
use crate::session::SessionStore;

/// Everything the front end needs, wired once at start-up and torn down with
/// [`AppContext::shutdown`].
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,

    pub metadata: Arc<dyn MetadataSource>,

    pub session: Arc<SessionStore>,

    pub collections: CollectionRepository,

    pub lists: ListRepository,

    pub messages: Messages,
}

impl AppContext {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let metadata: Arc<dyn MetadataSource> = Arc::new(JikanClient::from_config(&config.metadata)?);
        let session_file = SessionFile::new(config.backend.session_file_path());

        let (auth, collections, entries): (
            Arc<dyn AuthBackend>,
            Arc<dyn CollectionStore>,
            Arc<dyn EntryStore>,
        ) = match config.backend.kind {
            BackendKind::Embedded => {
                let store = Store::with_pool_options(
                    &config.backend.database_path,
                    config.backend.max_db_connections,
                    config.backend.min_db_connections,
                )
                .await?;
                let tables = Arc::new(SeaOrmStore::new(store.clone()));
                let auth: Arc<dyn AuthBackend> = Arc::new(SeaOrmAuthBackend::new(
                    store,
                    config.security.clone(),
                    session_file,
                ));
                (auth, tables.clone() as Arc<dyn CollectionStore>, tables as Arc<dyn EntryStore>)
            }
            BackendKind::Supabase => {
                let client = SupabaseClient::from_config(&config.backend)?;
                let tables = Arc::new(SupabaseStore::new(client.clone()));
                let auth: Arc<dyn AuthBackend> = Arc::new(SupabaseAuthBackend::new(
                    client,
                    session_file,
                    config.backend.oauth_redirect_url.clone(),
                ));
                (auth, tables.clone() as Arc<dyn CollectionStore>, tables as Arc<dyn EntryStore>)
            }
        };

        info!(backend = ?config.backend.kind, "Backend initialised");

        let session = Arc::new(SessionStore::start(auth).await?);
        Ok(Self::from_parts(config, metadata, session, collections, entries))
    }

    /// Assembles a context from already-built parts.
    #[must_use]
    pub fn from_parts(
        config: Config,
        metadata: Arc<dyn MetadataSource>,
        session: Arc<SessionStore>,
        collections: Arc<dyn CollectionStore>,
        entries: Arc<dyn EntryStore>,
    ) -> Self {
        let guard = AuthorizationGuard::new(session.clone());
        let messages = Messages::for_locale(&config.general.locale);

        Self {
            collections: CollectionRepository::new(guard.clone(), collections),
            lists: ListRepository::new(guard, entries),
            config: Arc::new(config),
            metadata,
            session,
            messages,
        }
    }

    #[must_use]
    pub fn search_view(&self) -> SearchView {
        SearchView::new(
            self.metadata.clone(),
            Duration::from_millis(self.config.metadata.search_debounce_ms),
            self.messages,
        )
    }

    #[must_use]
    pub fn detail_view(&self) -> AnimeDetailView {
        AnimeDetailView::new(self.metadata.clone(), self.messages)
    }

    #[must_use]
    pub fn seasonal_view(&self, limit: Option<u32>) -> SeasonalView {
        SeasonalView::new(
            self.metadata.clone(),
            limit.unwrap_or(self.config.metadata.seasonal_limit),
            self.messages,
        )
    }

    #[must_use]
    pub fn collections_view(&self) -> CollectionsView {
        CollectionsView::new(self.collections.clone(), self.messages)
    }

    #[must_use]
    pub fn list_view(&self) -> AnimeListView {
        AnimeListView::new(self.lists.clone(), self.messages)
    }

    pub fn shutdown(&self) {
        self.session.shutdown();
    }
}

#![allow(dead_code)]

use std::sync::Arc;

use animeshelf::config::SecurityConfig;
use animeshelf::db::Store;
use animeshelf::domain::MalId;
use animeshelf::models::{AnimeSnapshot, Genre, SignUpOutcome, User};
use animeshelf::repository::{AuthorizationGuard, CollectionRepository, ListRepository};
use animeshelf::services::{
    AuthBackend, CollectionStore, EntryStore, SeaOrmAuthBackend, SeaOrmStore, SessionFile,
};
use animeshelf::session::SessionStore;

pub const PASSWORD: &str = "correct horse battery";

pub fn fast_security() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        ..SecurityConfig::default()
    }
}

/// One signed-in client over a shared embedded database.
pub struct Harness {
    pub store: Store,
    pub auth: Arc<SeaOrmAuthBackend>,
    pub session: Arc<SessionStore>,
    pub collections: CollectionRepository,
    pub lists: ListRepository,
}

impl Harness {
    pub async fn new() -> Self {
        let store = Store::in_memory().await.unwrap();
        Self::on(store).await
    }

    /// A second client against the same database, signed out.
    pub async fn on(store: Store) -> Self {
        let auth = Arc::new(SeaOrmAuthBackend::new(
            store.clone(),
            fast_security(),
            SessionFile::disabled(),
        ));
        let session = Arc::new(
            SessionStore::start(auth.clone() as Arc<dyn AuthBackend>)
                .await
                .unwrap(),
        );

        let tables = Arc::new(SeaOrmStore::new(store.clone()));
        let guard = AuthorizationGuard::new(session.clone());

        Self {
            collections: CollectionRepository::new(
                guard.clone(),
                tables.clone() as Arc<dyn CollectionStore>,
            ),
            lists: ListRepository::new(guard, tables as Arc<dyn EntryStore>),
            store,
            auth,
            session,
        }
    }

    pub async fn sign_up(&self, email: &str, name: &str) -> User {
        match self
            .session
            .sign_up(email, PASSWORD, Some(name))
            .await
            .unwrap()
        {
            SignUpOutcome::SignedIn(session) => session.user,
            SignUpOutcome::ConfirmationRequired(_) => panic!("embedded backend confirmed nothing"),
        }
    }
}

pub fn snapshot(mal_id: i32, title: &str) -> AnimeSnapshot {
    AnimeSnapshot {
        mal_id: MalId::new(mal_id),
        title: title.to_string(),
        url: format!("https://myanimelist.net/anime/{mal_id}"),
        image_jpg: format!("https://cdn.myanimelist.net/images/anime/{mal_id}.jpg"),
        image_webp: format!("https://cdn.myanimelist.net/images/anime/{mal_id}.webp"),
        anime_type: Some("TV".to_string()),
        episodes: Some(26),
        airing: false,
        synopsis: Some("Bounty hunters in space.".to_string()),
        season: Some("spring".to_string()),
        year: Some(1998),
        genres: vec![Genre {
            mal_id: 1,
            kind: "anime".to_string(),
            name: "Action".to_string(),
            url: "https://myanimelist.net/anime/genre/1/Action".to_string(),
        }],
    }
}

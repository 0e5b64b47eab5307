use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::domain::{CollectionId, UserId};
use crate::models::{Collection, CollectionFields, ListEntry, User};

pub mod migrator;
pub mod repositories;

pub use crate::entities::sessions::Model as SessionRow;

/// Handle to the embedded SQLite database.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .with_context(|| format!("Failed to create database file {path_str}"))?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        // An in-memory database lives only as long as its connection.
        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    /// Single-connection in-memory database, used by tests and throwaway runs.
    pub async fn in_memory() -> Result<Self> {
        Self::with_pool_options("sqlite::memory:", 1, 1).await
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    fn collection_repo(&self) -> repositories::collection::CollectionRepository {
        repositories::collection::CollectionRepository::new(self.conn.clone())
    }

    fn entry_repo(&self) -> repositories::entry::EntryRepository {
        repositories::entry::EntryRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
        security: &SecurityConfig,
    ) -> Result<Option<User>> {
        self.user_repo()
            .create(email, password, display_name, security)
            .await
    }

    pub async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(&id.to_string()).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn update_user_profile(
        &self,
        id: &UserId,
        display_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<Option<User>> {
        self.user_repo()
            .update_profile(&id.to_string(), display_name, avatar_url)
            .await
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    pub async fn create_session(&self, user_id: &UserId, ttl: chrono::Duration) -> Result<SessionRow> {
        self.session_repo().create(&user_id.to_string(), ttl).await
    }

    /// The session for an access token, if it exists and has not expired.
    pub async fn find_valid_session(&self, access_token: &str) -> Result<Option<SessionRow>> {
        self.session_repo().find_valid(access_token, Utc::now()).await
    }

    pub async fn rotate_session(
        &self,
        refresh_token: &str,
        ttl: chrono::Duration,
    ) -> Result<Option<SessionRow>> {
        self.session_repo().rotate(refresh_token, ttl).await
    }

    pub async fn delete_session(&self, access_token: &str) -> Result<bool> {
        self.session_repo().delete(access_token).await
    }

    pub async fn delete_user_sessions(&self, user_id: &UserId) -> Result<u64> {
        self.session_repo().delete_for_user(&user_id.to_string()).await
    }

    /// Resolves the caller behind an access token.
    pub async fn resolve_caller(&self, access_token: &str) -> Result<Option<UserId>> {
        self.find_valid_session(access_token)
            .await?
            .map(|row| parse_uuid(&row.user_id).map(UserId::from_uuid))
            .transpose()
    }

    // ========================================================================
    // Collections
    // ========================================================================

    pub async fn list_collections(&self, owner: &UserId) -> Result<Vec<Collection>> {
        self.collection_repo()
            .list_for_owner(&owner.to_string())
            .await
    }

    pub async fn insert_collection(
        &self,
        owner: &UserId,
        fields: &CollectionFields,
    ) -> Result<Collection> {
        self.collection_repo()
            .insert(&owner.to_string(), fields)
            .await
    }

    pub async fn update_collection(
        &self,
        id: &CollectionId,
        owner: &UserId,
        fields: &CollectionFields,
    ) -> Result<u64> {
        self.collection_repo()
            .update(&id.to_string(), &owner.to_string(), fields)
            .await
    }

    pub async fn delete_collection(&self, id: &CollectionId, owner: &UserId) -> Result<u64> {
        self.collection_repo()
            .delete(&id.to_string(), &owner.to_string())
            .await
    }

    pub async fn collection_owned_by(&self, id: &CollectionId, owner: &UserId) -> Result<bool> {
        self.collection_repo()
            .is_owned_by(&id.to_string(), &owner.to_string())
            .await
    }

    // ========================================================================
    // Entries
    // ========================================================================

    pub async fn list_entries(&self, collection_id: &CollectionId) -> Result<Vec<ListEntry>> {
        self.entry_repo()
            .list_for_collection(&collection_id.to_string())
            .await
    }

    pub async fn insert_entry(&self, entry: &ListEntry) -> Result<ListEntry> {
        self.entry_repo().insert(entry).await
    }
}

/// Timestamps are stored as fixed-width RFC 3339 text so that they sort correctly as strings.
#[must_use]
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid timestamp in database: {value}"))
}

pub fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).with_context(|| format!("Invalid id in database: {value}"))
}

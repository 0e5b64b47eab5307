//! Store traits over PostgREST. Ownership is left to the server's row-level
//! security policies; the client only scopes its queries.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clients::SupabaseClient;
use crate::domain::{CollectionId, MalId, UserId};
use crate::models::{
    AnimeSnapshot, Collection, CollectionFields, Genre, ListEntry, Tracking, WatchStatus,
};
use crate::services::store_service::{Caller, CollectionStore, EntryStore, StoreError};

const COLLECTIONS: &str = "collections";
const ENTRIES: &str = "collection_animes";

#[derive(Debug, Deserialize)]
struct CollectionRow {
    id: CollectionId,
    user_id: UserId,
    name: String,
    description: Option<String>,
    preview_images: Option<Vec<String>>,
    animes_count: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<CollectionRow> for Collection {
    fn from(row: CollectionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            description: row.description.unwrap_or_default(),
            preview_images: row.preview_images.unwrap_or_default(),
            animes_count: row.animes_count.unwrap_or(0),
            created_at: row.created_at,
        }
    }
}

#[derive(Serialize)]
struct NewCollection<'a> {
    user_id: UserId,
    name: &'a str,
    description: &'a str,
    preview_images: &'a [String],
}

#[derive(Serialize)]
struct CollectionChanges<'a> {
    name: &'a str,
    description: &'a str,
    preview_images: &'a [String],
}

/// A `collection_animes` row as PostgREST returns it; most columns are nullable.
#[derive(Debug, Deserialize)]
struct EntryRow {
    collection_id: CollectionId,
    mal_id: i32,
    title: String,
    url: Option<String>,
    image_jpg: Option<String>,
    image_webp: Option<String>,
    status: Option<WatchStatus>,
    #[serde(rename = "type")]
    anime_type: Option<String>,
    episodes: Option<i32>,
    progress: Option<i64>,
    score: Option<i64>,
    airing: Option<bool>,
    synopsis: Option<String>,
    season: Option<String>,
    year: Option<i32>,
    genres: Option<Vec<Genre>>,
    started_at: Option<NaiveDate>,
    finished_at: Option<NaiveDate>,
    notes: Option<String>,
}

impl From<EntryRow> for ListEntry {
    fn from(row: EntryRow) -> Self {
        Self {
            collection_id: row.collection_id,
            anime: AnimeSnapshot {
                mal_id: MalId::new(row.mal_id),
                title: row.title,
                url: row.url.unwrap_or_default(),
                image_jpg: row.image_jpg.unwrap_or_default(),
                image_webp: row.image_webp.unwrap_or_default(),
                anime_type: row.anime_type,
                episodes: row.episodes,
                airing: row.airing.unwrap_or(false),
                synopsis: row.synopsis,
                season: row.season,
                year: row.year,
                genres: row.genres.unwrap_or_default(),
            },
            tracking: Tracking {
                status: row.status.unwrap_or_default(),
                progress: row.progress.and_then(|p| u32::try_from(p).ok()).unwrap_or(0),
                score: row.score.and_then(|s| u8::try_from(s).ok()).unwrap_or(0),
                started_at: row.started_at,
                finished_at: row.finished_at,
                notes: row.notes.unwrap_or_default(),
            },
        }
    }
}

pub struct SupabaseStore {
    client: SupabaseClient,
}

impl SupabaseStore {
    #[must_use]
    pub const fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

fn first<T>(rows: Vec<T>, table: &str) -> Result<T, StoreError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| StoreError::Decode(format!("{table}: write returned no row")))
}

#[async_trait]
impl CollectionStore for SupabaseStore {
    async fn list_collections(&self, caller: &Caller) -> Result<Vec<Collection>, StoreError> {
        let owner = format!("eq.{}", caller.user_id);
        let rows: Vec<CollectionRow> = self
            .client
            .select(
                COLLECTIONS,
                &[
                    ("select", "*"),
                    ("user_id", owner.as_str()),
                    ("order", "created_at.desc"),
                ],
                &caller.access_token,
            )
            .await?;

        Ok(rows.into_iter().map(Collection::from).collect())
    }

    async fn insert_collection(
        &self,
        caller: &Caller,
        fields: &CollectionFields,
    ) -> Result<Collection, StoreError> {
        let row = NewCollection {
            user_id: caller.user_id,
            name: &fields.name,
            description: &fields.description,
            preview_images: &fields.preview_images,
        };
        let rows: Vec<CollectionRow> = self
            .client
            .insert(COLLECTIONS, &[row], &caller.access_token)
            .await?;

        first(rows, COLLECTIONS).map(Collection::from)
    }

    async fn update_collection(
        &self,
        caller: &Caller,
        id: &CollectionId,
        fields: &CollectionFields,
    ) -> Result<u64, StoreError> {
        let id = format!("eq.{id}");
        let owner = format!("eq.{}", caller.user_id);
        let changes = CollectionChanges {
            name: &fields.name,
            description: &fields.description,
            preview_images: &fields.preview_images,
        };
        let rows: Vec<serde_json::Value> = self
            .client
            .update(
                COLLECTIONS,
                &[("id", id.as_str()), ("user_id", owner.as_str())],
                &changes,
                &caller.access_token,
            )
            .await?;

        Ok(rows.len() as u64)
    }

    async fn delete_collection(
        &self,
        caller: &Caller,
        id: &CollectionId,
    ) -> Result<u64, StoreError> {
        let id = format!("eq.{id}");
        let owner = format!("eq.{}", caller.user_id);
        let rows: Vec<serde_json::Value> = self
            .client
            .delete(
                COLLECTIONS,
                &[("id", id.as_str()), ("user_id", owner.as_str())],
                &caller.access_token,
            )
            .await?;

        Ok(rows.len() as u64)
    }
}

#[async_trait]
impl EntryStore for SupabaseStore {
    async fn list_entries(
        &self,
        caller: &Caller,
        collection_id: &CollectionId,
    ) -> Result<Vec<ListEntry>, StoreError> {
        let collection = format!("eq.{collection_id}");
        let rows: Vec<EntryRow> = self
            .client
            .select(
                ENTRIES,
                &[("select", "*"), ("collection_id", collection.as_str())],
                &caller.access_token,
            )
            .await?;

        Ok(rows.into_iter().map(ListEntry::from).collect())
    }

    async fn insert_entry(
        &self,
        caller: &Caller,
        entry: &ListEntry,
    ) -> Result<ListEntry, StoreError> {
        let rows: Vec<EntryRow> = self
            .client
            .insert(ENTRIES, std::slice::from_ref(entry), &caller.access_token)
            .await?;

        first(rows, ENTRIES).map(ListEntry::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_row_tolerates_nulls() {
        let json = r#"{
            "id": 7,
            "collection_id": "5f0c3c1e-6a55-4bde-9d55-6a3a0c1b2d3e",
            "mal_id": 21,
            "title": "One Piece",
            "url": null,
            "image_jpg": null,
            "image_webp": null,
            "status": "watching",
            "type": "TV",
            "episodes": null,
            "progress": 1100,
            "score": null,
            "airing": true,
            "synopsis": null,
            "season": null,
            "year": 1999,
            "genres": null,
            "started_at": "2020-05-01",
            "finished_at": null,
            "notes": null
        }"#;
        let entry = ListEntry::from(serde_json::from_str::<EntryRow>(json).unwrap());
        assert_eq!(entry.anime.mal_id, MalId::new(21));
        assert_eq!(entry.tracking.status, WatchStatus::Watching);
        assert_eq!(entry.tracking.progress, 1100);
        assert_eq!(entry.tracking.score, 0);
        assert_eq!(entry.progress_label(), "1100 / ?");
        assert!(entry.anime.genres.is_empty());
    }

    #[test]
    fn collection_row_defaults() {
        let json = r#"{
            "id": "5f0c3c1e-6a55-4bde-9d55-6a3a0c1b2d3e",
            "user_id": "0b3e1b8e-8f5a-4a57-9a84-2f6f7c3f6f11",
            "name": "Favourites",
            "description": null,
            "preview_images": null,
            "created_at": "2024-02-01T10:00:00+00:00"
        }"#;
        let collection = Collection::from(serde_json::from_str::<CollectionRow>(json).unwrap());
        assert_eq!(collection.animes_count, 0);
        assert!(collection.preview_images.is_empty());
        assert_eq!(collection.description, "");
    }
}

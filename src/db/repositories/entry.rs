use anyhow::{Context, Result};
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::info;

use crate::db::{now_timestamp, parse_uuid};
use crate::domain::{CollectionId, MalId};
use crate::entities::{collection_animes, prelude::*};
use crate::models::{AnimeSnapshot, ListEntry, Tracking, WatchStatus};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Rows of `collection_animes`. Ownership of the parent collection is checked by the caller.
pub struct EntryRepository {
    conn: DatabaseConnection,
}

impl EntryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: collection_animes::Model) -> Result<ListEntry> {
        let status = model
            .status
            .parse::<WatchStatus>()
            .map_err(|e| anyhow::anyhow!("Corrupt status on entry {}: {e}", model.id))?;
        let genres = serde_json::from_str(&model.genres)
            .with_context(|| format!("Corrupt genres on entry {}", model.id))?;

        Ok(ListEntry {
            collection_id: CollectionId::from_uuid(parse_uuid(&model.collection_id)?),
            anime: AnimeSnapshot {
                mal_id: MalId::new(model.mal_id),
                title: model.title,
                url: model.url,
                image_jpg: model.image_jpg,
                image_webp: model.image_webp,
                anime_type: model.anime_type,
                episodes: model.episodes,
                airing: model.airing,
                synopsis: model.synopsis,
                season: model.season,
                year: model.year,
                genres,
            },
            tracking: Tracking {
                status,
                progress: u32::try_from(model.progress).unwrap_or(0),
                score: u8::try_from(model.score).unwrap_or(0),
                started_at: parse_date(model.started_at.as_deref())?,
                finished_at: parse_date(model.finished_at.as_deref())?,
                notes: model.notes,
            },
        })
    }

    /// Entries of a collection in insertion order.
    pub async fn list_for_collection(&self, collection_id: &str) -> Result<Vec<ListEntry>> {
        let rows = CollectionAnimes::find()
            .filter(collection_animes::Column::CollectionId.eq(collection_id))
            .order_by_asc(collection_animes::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list collection entries")?;

        rows.into_iter().map(Self::map_model).collect()
    }

    pub async fn insert(&self, entry: &ListEntry) -> Result<ListEntry> {
        let anime = &entry.anime;
        let tracking = &entry.tracking;

        let active = collection_animes::ActiveModel {
            collection_id: Set(entry.collection_id.to_string()),
            mal_id: Set(anime.mal_id.value()),
            title: Set(anime.title.clone()),
            url: Set(anime.url.clone()),
            image_jpg: Set(anime.image_jpg.clone()),
            image_webp: Set(anime.image_webp.clone()),
            status: Set(tracking.status.as_str().to_string()),
            anime_type: Set(anime.anime_type.clone()),
            episodes: Set(anime.episodes),
            progress: Set(i32::try_from(tracking.progress).unwrap_or(i32::MAX)),
            score: Set(i32::from(tracking.score)),
            airing: Set(anime.airing),
            synopsis: Set(anime.synopsis.clone()),
            season: Set(anime.season.clone()),
            year: Set(anime.year),
            genres: Set(serde_json::to_string(&anime.genres)?),
            started_at: Set(tracking.started_at.map(|d| d.format(DATE_FORMAT).to_string())),
            finished_at: Set(tracking.finished_at.map(|d| d.format(DATE_FORMAT).to_string())),
            notes: Set(tracking.notes.clone()),
            created_at: Set(now_timestamp()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert collection entry")?;

        info!(
            "Added anime {} to collection {}",
            anime.mal_id, entry.collection_id
        );
        Self::map_model(model)
    }
}

fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v, DATE_FORMAT)
                .with_context(|| format!("Invalid date in database: {v}"))
        })
        .transpose()
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{AnimeMetadata, Genre, ValidationError};
use crate::domain::{CollectionId, MalId};

pub const MAX_SCORE: u8 = 10;

/// Personal watch state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    Watching,
    Completed,
    #[default]
    PlanToWatch,
}

impl WatchStatus {
    pub const ALL: [Self; 3] = [Self::Watching, Self::Completed, Self::PlanToWatch];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Watching => "watching",
            Self::Completed => "completed",
            Self::PlanToWatch => "plan_to_watch",
        }
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "watching" => Ok(Self::Watching),
            "completed" => Ok(Self::Completed),
            "plan_to_watch" => Ok(Self::PlanToWatch),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// Metadata fields copied into an entry when it is added. The copy is not
/// linked back to the metadata service and never refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeSnapshot {
    pub mal_id: MalId,
    pub title: String,
    pub url: String,
    pub image_jpg: String,
    pub image_webp: String,
    #[serde(rename = "type")]
    pub anime_type: Option<String>,
    pub episodes: Option<i32>,
    pub airing: bool,
    pub synopsis: Option<String>,
    pub season: Option<String>,
    pub year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

impl From<&AnimeMetadata> for AnimeSnapshot {
    fn from(anime: &AnimeMetadata) -> Self {
        Self {
            mal_id: anime.mal_id,
            title: anime.title.clone(),
            url: anime.url.clone(),
            image_jpg: anime.images.jpg.image_url.clone(),
            image_webp: anime.images.webp.image_url.clone(),
            anime_type: anime.anime_type.clone(),
            episodes: anime.episodes,
            airing: anime.airing,
            synopsis: anime.synopsis.clone(),
            season: anime.season.clone(),
            year: anime.year,
            genres: anime.genres.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracking {
    pub status: WatchStatus,
    pub progress: u32,
    pub score: u8,
    pub started_at: Option<NaiveDate>,
    pub finished_at: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
}

impl Tracking {
    /// # Errors
    ///
    /// [`ValidationError::ScoreOutOfRange`] when the score exceeds [`MAX_SCORE`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.score > MAX_SCORE {
            return Err(ValidationError::ScoreOutOfRange(self.score));
        }
        Ok(())
    }
}

/// A collection member: denormalized anime data plus personal tracking state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    pub collection_id: CollectionId,
    #[serde(flatten)]
    pub anime: AnimeSnapshot,
    #[serde(flatten)]
    pub tracking: Tracking,
}

impl ListEntry {
    #[must_use]
    pub const fn new(collection_id: CollectionId, anime: AnimeSnapshot, tracking: Tracking) -> Self {
        Self {
            collection_id,
            anime,
            tracking,
        }
    }

    /// "3 / 12", or "3 / ?" while the episode count is unknown.
    #[must_use]
    pub fn progress_label(&self) -> String {
        match self.anime.episodes {
            Some(total) => format!("{} / {}", self.tracking.progress, total),
            None => format!("{} / ?", self.tracking.progress),
        }
    }
}

/// Parses an optional `YYYY-MM-DD` form value; blank input means "not set".
///
/// # Errors
///
/// [`ValidationError::InvalidDate`] when the text is not a calendar date.
pub fn parse_optional_date(value: &str) -> Result<Option<NaiveDate>, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ValidationError::InvalidDate(value.to_string()))
}

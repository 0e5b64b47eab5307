use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::MetadataConfig;
use crate::domain::MalId;
use crate::models::{AnimeImages, AnimeMetadata, Genre, ImageUrls};

const JIKAN_API: &str = "https://api.jikan.moe/v4";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Failures talking to the metadata service. None of them are retried.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Jikan request timed out")]
    Timeout,

    #[error("Jikan API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Anime {0} not found")]
    NotFound(MalId),

    #[error("Jikan network error: {0}")]
    Network(String),

    #[error("Failed to decode Jikan response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for MetadataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct JikanResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
pub struct MalAnime {
    pub mal_id: i32,
    pub url: Option<String>,
    pub title: String,
    pub images: Option<MalImages>,
    #[serde(rename = "type")]
    pub anime_type: Option<String>,
    pub episodes: Option<i32>,
    pub status: Option<String>,
    #[serde(default)]
    pub airing: bool,
    pub score: Option<f32>,
    pub synopsis: Option<String>,
    pub season: Option<String>,
    pub year: Option<i32>,
    pub genres: Option<Vec<MalGenre>>,
    pub aired: Option<Aired>,
}

#[derive(Debug, Deserialize)]
pub struct MalImages {
    pub jpg: Option<MalImageSet>,
    pub webp: Option<MalImageSet>,
}

#[derive(Debug, Deserialize)]
pub struct MalImageSet {
    pub image_url: Option<String>,
    pub small_image_url: Option<String>,
    pub large_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MalGenre {
    pub mal_id: i32,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Aired {
    pub prop: Option<AiredProp>,
}

#[derive(Debug, Deserialize)]
pub struct AiredProp {
    pub from: Option<AiredDate>,
}

#[derive(Debug, Deserialize)]
pub struct AiredDate {
    pub year: Option<i32>,
}

impl MalAnime {
    pub fn get_start_year(&self) -> Option<i32> {
        if let Some(year) = self.year {
            return Some(year);
        }

        self.aired
            .as_ref()
            .and_then(|a| a.prop.as_ref())
            .and_then(|p| p.from.as_ref())
            .and_then(|f| f.year)
    }

    fn into_metadata(self) -> AnimeMetadata {
        let year = self.get_start_year();
        let images = self.images.map_or_else(AnimeImages::default, |images| AnimeImages {
            jpg: images.jpg.map(image_urls).unwrap_or_default(),
            webp: images.webp.map(image_urls).unwrap_or_default(),
        });

        AnimeMetadata {
            mal_id: MalId::new(self.mal_id),
            url: self.url.unwrap_or_default(),
            title: self.title,
            images,
            anime_type: self.anime_type,
            episodes: self.episodes,
            status: self.status,
            airing: self.airing,
            score: self.score,
            synopsis: self.synopsis,
            season: self.season,
            year,
            genres: self
                .genres
                .unwrap_or_default()
                .into_iter()
                .map(|g| Genre {
                    mal_id: g.mal_id,
                    kind: g.kind.unwrap_or_else(|| "anime".to_string()),
                    name: g.name,
                    url: g.url.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

fn image_urls(set: MalImageSet) -> ImageUrls {
    ImageUrls {
        image_url: set.image_url.unwrap_or_default(),
        small_image_url: set.small_image_url.unwrap_or_default(),
        large_image_url: set.large_image_url.unwrap_or_default(),
    }
}

/// Read-only client for the Jikan v4 API.
///
/// One request per call, bounded by a short fixed timeout. No caching,
/// no pagination, no retries.
#[derive(Clone)]
pub struct JikanClient {
    client: Client,
    base_url: String,
    sfw: bool,
}

impl JikanClient {
    /// Client for the public Jikan API with the default 2 second timeout.
    ///
    /// # Errors
    ///
    /// Fails only if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, MetadataError> {
        Self::with_options(JIKAN_API, DEFAULT_TIMEOUT, true)
    }

    pub fn from_config(config: &MetadataConfig) -> Result<Self, MetadataError> {
        Self::with_options(
            &config.base_url,
            Duration::from_millis(config.timeout_ms),
            config.sfw,
        )
    }

    pub fn with_options(
        base_url: &str,
        timeout: Duration,
        sfw: bool,
    ) -> Result<Self, MetadataError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("animeshelf/0.1")
            .build()
            .map_err(|e| MetadataError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            sfw,
        })
    }

    fn sfw_flag(&self) -> &'static str {
        if self.sfw { "sfw&" } else { "" }
    }

    /// Searches anime by title. An empty query returns no results without a request.
    pub async fn search(&self, query: &str) -> Result<Vec<AnimeMetadata>, MetadataError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/anime?{}q={}",
            self.base_url,
            self.sfw_flag(),
            urlencoding::encode(query)
        );
        let response: JikanResponse<Vec<MalAnime>> = self.get_json(&url).await?;

        Ok(response.data.into_iter().map(MalAnime::into_metadata).collect())
    }

    /// Anime airing in the current season.
    pub async fn list_seasonal(&self, limit: u32) -> Result<Vec<AnimeMetadata>, MetadataError> {
        let url = format!(
            "{}/seasons/now?{}limit={}",
            self.base_url,
            self.sfw_flag(),
            limit
        );
        let response: JikanResponse<Vec<MalAnime>> = self.get_json(&url).await?;

        Ok(response.data.into_iter().map(MalAnime::into_metadata).collect())
    }

    pub async fn get_by_id(&self, mal_id: MalId) -> Result<AnimeMetadata, MetadataError> {
        let url = format!("{}/anime/{}", self.base_url, mal_id);
        match self.get_json::<JikanResponse<MalAnime>>(&url).await {
            Ok(response) => Ok(response.data.into_metadata()),
            Err(MetadataError::Status { status: 404, .. }) => Err(MetadataError::NotFound(mal_id)),
            Err(e) => Err(e),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, MetadataError> {
        debug!(url, "Jikan request");

        let response = self.client.get(url).send().await.map_err(|e| {
            let err = MetadataError::from(e);
            warn!(url, error = %err, "Jikan request failed");
            err
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status != StatusCode::NOT_FOUND {
                warn!(url, status = status.as_u16(), "Jikan returned an error status");
            }
            return Err(MetadataError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<T>().await.map_err(MetadataError::from)
    }
}

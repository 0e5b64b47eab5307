use serde::{Deserialize, Serialize};

use crate::domain::MalId;

/// One encoding of the cover art in its three sizes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrls {
    pub image_url: String,
    pub small_image_url: String,
    pub large_image_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeImages {
    pub jpg: ImageUrls,
    pub webp: ImageUrls,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub mal_id: i32,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub url: String,
}

/// Catalog record fetched from the metadata service. Never persisted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeMetadata {
    pub mal_id: MalId,
    pub url: String,
    pub title: String,
    pub images: AnimeImages,
    #[serde(rename = "type")]
    pub anime_type: Option<String>,
    pub episodes: Option<i32>,
    pub status: Option<String>,
    pub airing: bool,
    pub score: Option<f32>,
    pub synopsis: Option<String>,
    pub season: Option<String>,
    pub year: Option<i32>,
    pub genres: Vec<Genre>,
}

impl AnimeMetadata {
    /// "TV • 2023" style subtitle used by list and card views.
    #[must_use]
    pub fn subtitle(&self) -> String {
        let kind = self.anime_type.as_deref().unwrap_or("?");
        match self.year {
            Some(year) => format!("{kind} • {year}"),
            None => kind.to_string(),
        }
    }

    #[must_use]
    pub fn genre_names(&self) -> Vec<&str> {
        self.genres.iter().map(|g| g.name.as_str()).collect()
    }
}

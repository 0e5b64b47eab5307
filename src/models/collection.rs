use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ValidationError;
use crate::domain::{CollectionId, UserId};

pub const MAX_PREVIEW_IMAGES: usize = 3;

/// A user-owned, named group of tracked anime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub preview_images: Vec<String>,
    #[serde(default)]
    pub animes_count: i64,
    pub created_at: DateTime<Utc>,
}

/// The user-editable part of a collection, used for both create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionFields {
    pub name: String,
    pub description: String,
    pub preview_images: Vec<String>,
}

impl CollectionFields {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        preview_images: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            preview_images,
        }
    }

    /// Trims text fields and drops blank preview URLs, then checks the result.
    ///
    /// # Errors
    ///
    /// [`ValidationError::MissingField`] for an empty name and
    /// [`ValidationError::TooManyPreviewImages`] past [`MAX_PREVIEW_IMAGES`].
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::MissingField("name"));
        }

        let preview_images: Vec<String> = self
            .preview_images
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect();

        if preview_images.len() > MAX_PREVIEW_IMAGES {
            return Err(ValidationError::TooManyPreviewImages {
                max: MAX_PREVIEW_IMAGES,
            });
        }

        Ok(Self {
            name,
            description: self.description.trim().to_string(),
            preview_images,
        })
    }
}

impl From<&Collection> for CollectionFields {
    fn from(collection: &Collection) -> Self {
        Self {
            name: collection.name.clone(),
            description: collection.description.clone(),
            preview_images: collection.preview_images.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_preview_urls_are_dropped() {
        let fields = CollectionFields::new(
            " Favourites ",
            "",
            vec!["a".into(), "  ".into(), "b".into()],
        );
        let normalized = fields.normalized().unwrap();
        assert_eq!(normalized.name, "Favourites");
        assert_eq!(normalized.preview_images, vec!["a", "b"]);
    }

    #[test]
    fn rejects_missing_name() {
        let fields = CollectionFields::new("   ", "desc", vec![]);
        assert_eq!(
            fields.normalized(),
            Err(ValidationError::MissingField("name"))
        );
    }

    #[test]
    fn rejects_more_than_three_previews() {
        let urls = vec!["1".into(), "2".into(), "3".into(), "4".into()];
        let fields = CollectionFields::new("x", "", urls);
        assert_eq!(
            fields.normalized(),
            Err(ValidationError::TooManyPreviewImages { max: 3 })
        );
    }
}

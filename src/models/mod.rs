pub mod anime;
pub mod collection;
pub mod entry;
pub mod user;

pub use anime::{AnimeImages, AnimeMetadata, Genre, ImageUrls};
pub use collection::{Collection, CollectionFields, MAX_PREVIEW_IMAGES};
pub use entry::{AnimeSnapshot, ListEntry, Tracking, WatchStatus};
pub use user::{OAuthProvider, Session, SignUpOutcome, User};

use thiserror::Error;

/// Client-side checks on user-entered payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("at most {max} preview images are allowed")]
    TooManyPreviewImages { max: usize },

    #[error("score must be between 0 and 10, got {0}")]
    ScoreOutOfRange(u8),

    #[error("a collection must be selected")]
    CollectionNotSelected,

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

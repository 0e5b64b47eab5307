//! Domain identifiers shared by every layer.
//!
//! Newtype wrappers keep MyAnimeList ids, user ids and collection ids from
//! being mixed up at call sites that take several of them.

pub mod events;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// MyAnimeList identifier of an anime, as used by the metadata service.
///
/// # Examples
///
/// ```rust
/// use animeshelf::domain::MalId;
///
/// let id = MalId::new(5114);
/// assert_eq!(id.value(), 5114);
/// assert_eq!(id.to_string(), "5114");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MalId(i32);

impl MalId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for MalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for MalId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl From<MalId> for i32 {
    fn from(id: MalId) -> Self {
        id.0
    }
}

impl FromStr for MalId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i32>().map(Self)
    }
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[must_use]
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Generates a fresh random (v4) identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Identity of an authenticated user, issued by the auth subsystem.
    UserId
);

uuid_id!(
    /// Identifier of a user-owned collection.
    CollectionId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mal_id_conversions() {
        let id = MalId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(i32::from(id), 42);
        assert_eq!(MalId::from(42), id);
        assert_eq!(" 42 ".parse::<MalId>().unwrap(), id);
    }

    #[test]
    fn mal_id_serializes_as_number() {
        let json = serde_json::to_string(&MalId::new(21)).unwrap();
        assert_eq!(json, "21");
    }

    #[test]
    fn collection_id_round_trips_through_text() {
        let id = CollectionId::generate();
        let parsed: CollectionId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<CollectionId>().is_err());
    }

    #[test]
    fn user_id_serializes_as_plain_string() {
        let uuid = Uuid::new_v4();
        let json = serde_json::to_string(&UserId::from_uuid(uuid)).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }
}

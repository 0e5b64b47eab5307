pub use super::collection_animes::Entity as CollectionAnimes;
pub use super::collections::Entity as Collections;
pub use super::sessions::Entity as Sessions;
pub use super::users::Entity as Users;

pub mod prelude;

pub mod collection_animes;
pub mod collections;
pub mod sessions;
pub mod users;

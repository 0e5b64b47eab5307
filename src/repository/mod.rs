//! Collection and list access for the signed-in user.
//!
//! Every operation passes through [`AuthorizationGuard::authorize`] first and
//! maps store failures onto [`RepositoryError`].

pub mod collections;
pub mod entries;
pub mod error;
pub mod guard;

pub use collections::CollectionRepository;
pub use entries::ListRepository;
pub use error::RepositoryError;
pub use guard::AuthorizationGuard;

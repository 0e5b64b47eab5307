//! View models driven by the front end.
//!
//! Each view owns its own [`ViewState`]; views share no cache and do not
//! invalidate each other.

pub mod auth;
pub mod collections;
pub mod detail;
pub mod entries;
pub mod messages;
pub mod search;
pub mod state;

pub use auth::{FormError, LoginForm, RegisterForm};
pub use collections::{CollectionForm, CollectionsView};
pub use detail::{AnimeDetailView, SeasonalView};
pub use entries::{AddEntryForm, AnimeListView};
pub use messages::{Key, Locale, Messages};
pub use search::{SearchState, SearchView};
pub use state::ViewState;

pub mod auth_service;
pub mod auth_service_impl;
pub mod auth_service_supabase;
pub use auth_service::{AuthBackend, AuthError};
pub use auth_service_impl::SeaOrmAuthBackend;
pub use auth_service_supabase::SupabaseAuthBackend;

pub mod store_service;
pub mod store_service_impl;
pub mod store_service_supabase;
pub use store_service::{Caller, CollectionStore, EntryStore, StoreError};
pub use store_service_impl::SeaOrmStore;
pub use store_service_supabase::SupabaseStore;

pub mod metadata_service;
pub use metadata_service::MetadataSource;

pub mod session_file;
pub use session_file::SessionFile;

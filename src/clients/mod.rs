pub mod jikan;
pub mod supabase;

pub use jikan::{JikanClient, MetadataError};
pub use supabase::{SupabaseClient, SupabaseError};

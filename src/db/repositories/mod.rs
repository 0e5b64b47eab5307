pub mod collection;
pub mod entry;
pub mod session;
pub mod user;

// Adapters layer: concrete implementations for external systems (database, password hashing).

pub mod password;
pub mod sqlite_store;

pub use sqlite_store::SqliteStore;

pub mod connection;
pub mod migration_runner;
pub mod store;

pub use connection::Database;
pub use store::{DEFAULT_DOCUMENT_KEY, DocumentStore, MemoryStore, SqliteStore};

//! Storage module for API-key persistence

pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{ApiKeyRecord, ApiKeyStorage};

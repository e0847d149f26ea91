//! Storage abstraction traits
//!
//! Defines the interface for API-key persistence.

use async_trait::async_trait;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A stored API key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    pub id: i64,
    /// Unique key name (e.g. "weather_api")
    pub key_name: String,
    pub key_value: String,
}

/// API-key storage trait
/// Implementations must be thread-safe and async-compatible
#[async_trait]
pub trait ApiKeyStorage: Send + Sync + 'static {
    /// All records, ordered by id
    async fn list_keys(&self) -> Result<Vec<ApiKeyRecord>>;

    /// Look up a record by name
    async fn get_key(&self, key_name: &str) -> Result<Option<ApiKeyRecord>>;

    /// Replace the value of an existing key.
    /// Returns false (and inserts nothing) when no row matches.
    async fn update_key(&self, key_name: &str, key_value: &str) -> Result<bool>;

    /// Insert a key unless one with the same name exists.
    /// Returns true when a row was inserted.
    async fn seed_key(&self, key_name: &str, key_value: &str) -> Result<bool>;
}

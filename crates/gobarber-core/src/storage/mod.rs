//! Durable key-value storage for the session.
//!
//! `PersistentStore` is the async capability the session manager writes to.
//! Three backends are provided:
//! - `FileStore`: a JSON document in the platform data directory
//! - `KeyringStore`: one OS keychain entry per key
//! - `MemoryStore`: process-local map, lost on exit
//!
//! All backends treat keys as opaque strings and values as UTF-8 text.

pub mod error;
pub mod file;
pub mod keychain;
pub mod memory;

use async_trait::async_trait;

pub use error::StorageError;
pub use file::FileStore;
pub use keychain::KeyringStore;
pub use memory::MemoryStore;

/// Storage key holding the raw bearer token.
pub const TOKEN_KEY: &str = "@GoBarber:token";

/// Storage key holding the JSON-encoded `User`.
pub const USER_KEY: &str = "@GoBarber:user";

/// Async string key-value store that survives process restarts.
#[async_trait]
pub trait PersistentStore: Send + Sync {
    /// Read several keys at once. The result has one entry per requested key,
    /// in request order, with `None` for keys that are not set.
    async fn multi_get(&self, keys: &[&str]) -> Result<Vec<(String, Option<String>)>, StorageError>;

    /// Write several entries at once.
    async fn multi_set(&self, pairs: &[(&str, &str)]) -> Result<(), StorageError>;

    /// Remove several keys at once. Absent keys are ignored.
    async fn multi_remove(&self, keys: &[&str]) -> Result<(), StorageError>;

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.multi_set(&[(key, value)]).await
    }

    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .multi_get(&[key])
            .await?
            .into_iter()
            .next()
            .and_then(|(_, value)| value))
    }
}

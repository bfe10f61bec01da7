use async_trait::async_trait;
use futures::future::try_join_all;
use keyring::Entry;
use tracing::debug;

use super::{PersistentStore, StorageError};

const SERVICE_NAME: &str = "gobarber";

/// Stores each key as its own OS keychain entry.
///
/// Keychain calls block, so every operation runs on the blocking pool.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Use a different keychain service name, e.g. to keep profiles apart.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn read(service: &str, key: &str) -> Result<Option<String>, StorageError> {
        let entry = Entry::new(service, key)?;
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(service: &str, key: &str, value: &str) -> Result<(), StorageError> {
        Entry::new(service, key)?.set_password(value)?;
        Ok(())
    }

    fn delete(service: &str, key: &str) -> Result<(), StorageError> {
        match Entry::new(service, key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PersistentStore for KeyringStore {
    async fn multi_get(&self, keys: &[&str]) -> Result<Vec<(String, Option<String>)>, StorageError> {
        let reads = keys.iter().map(|key| {
            let service = self.service.clone();
            let key = key.to_string();
            async move {
                tokio::task::spawn_blocking(move || {
                    let value = Self::read(&service, &key)?;
                    Ok::<_, StorageError>((key, value))
                })
                .await?
            }
        });
        try_join_all(reads).await
    }

    async fn multi_set(&self, pairs: &[(&str, &str)]) -> Result<(), StorageError> {
        let service = self.service.clone();
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        debug!(count = pairs.len(), "Writing keychain entries");
        tokio::task::spawn_blocking(move || {
            pairs
                .iter()
                .try_for_each(|(key, value)| Self::write(&service, key, value))
        })
        .await?
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        let service = self.service.clone();
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        debug!(count = keys.len(), "Removing keychain entries");
        tokio::task::spawn_blocking(move || {
            keys.iter().try_for_each(|key| Self::delete(&service, key))
        })
        .await?
    }
}

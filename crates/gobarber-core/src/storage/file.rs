use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::{PersistentStore, StorageError};

/// Store file name in the data directory
const STORE_FILE: &str = "storage.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    entries: BTreeMap<String, String>,
    updated_at: Option<DateTime<Utc>>,
}

/// Keeps every entry in a single JSON document on disk.
///
/// Each write reads the document, applies the change and replaces the file
/// through a temporary sibling, so a crash never leaves a half-written file.
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self::at_path(data_dir.as_ref().join(STORE_FILE))
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the document was last written, if it exists.
    pub async fn updated_at(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.updated_at)
    }

    async fn load(&self) -> Result<StoreDocument, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, mut doc: StoreDocument) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        doc.updated_at = Some(Utc::now());
        let contents = serde_json::to_string_pretty(&doc)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), entries = doc.entries.len(), "Store file written");
        Ok(())
    }
}

#[async_trait]
impl PersistentStore for FileStore {
    async fn multi_get(&self, keys: &[&str]) -> Result<Vec<(String, Option<String>)>, StorageError> {
        let _guard = self.lock.lock().await;
        let doc = self.load().await?;
        Ok(keys
            .iter()
            .map(|key| (key.to_string(), doc.entries.get(*key).cloned()))
            .collect())
    }

    async fn multi_set(&self, pairs: &[(&str, &str)]) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        for (key, value) in pairs {
            doc.entries.insert(key.to_string(), value.to_string());
        }
        self.save(doc).await
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        let before = doc.entries.len();
        for key in keys {
            doc.entries.remove(*key);
        }
        if doc.entries.len() == before {
            return Ok(());
        }
        self.save(doc).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let values = store.multi_get(&["a"]).await.unwrap();
        assert_eq!(values, vec![("a".to_string(), None)]);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::new(dir.path().join("nested"));
            store.multi_set(&[("a", "1"), ("b", "{\"x\":2}")]).await.unwrap();
            assert!(store.updated_at().await.unwrap().is_some());
        }

        let reopened = FileStore::new(dir.path().join("nested"));
        assert_eq!(reopened.get_item("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(reopened.get_item("b").await.unwrap().as_deref(), Some("{\"x\":2}"));
    }

    #[tokio::test]
    async fn test_remove_then_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.multi_set(&[("a", "1"), ("b", "2")]).await.unwrap();
        store.multi_remove(&["a", "absent"]).await.unwrap();

        let reopened = FileStore::new(dir.path());
        let values = reopened.multi_get(&["a", "b"]).await.unwrap();
        assert_eq!(values[0].1, None);
        assert_eq!(values[1].1.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        std::fs::write(store.path(), "not json").unwrap();
        let err = store.multi_get(&["a"]).await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}

//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the backend URL, the storage backend for the session,
//! and the last email used to sign in.
//!
//! Configuration is stored at `~/.config/gobarber/config.json`.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_BASE_URL;
use crate::storage::{FileStore, KeyringStore, MemoryStore, PersistentStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "gobarber";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Where the session is persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub store: StoreBackend,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            store: StoreBackend::default(),
            last_email: None,
        }
    }
}

impl Config {
    pub fn load() -> io::Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> io::Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> io::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the file-backed session store.
    pub fn data_dir(&self) -> io::Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Directory for rolling log files.
    pub fn log_dir(&self) -> io::Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join("logs"))
    }

    /// Build the session store selected by `store`.
    pub fn open_store(&self) -> io::Result<Arc<dyn PersistentStore>> {
        Ok(match self.store {
            StoreBackend::File => Arc::new(FileStore::new(self.data_dir()?)),
            StoreBackend::Keyring => Arc::new(KeyringStore::new()),
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"store":"keyring"}"#).unwrap();
        assert_eq!(config.store, StoreBackend::Keyring);
        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.last_email, None);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config {
            api_base_url: "https://api.gobarber.test".to_string(),
            store: StoreBackend::Memory,
            last_email: Some("a@b.com".to_string()),
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"memory\""));
        let decoded: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.api_base_url, config.api_base_url);
        assert_eq!(decoded.last_email, config.last_email);
    }
}

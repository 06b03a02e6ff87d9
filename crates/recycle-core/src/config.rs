//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the backend URL override, the storage backend used for
//! the session token, and the last email used to sign in.
//!
//! Configuration is stored at `~/.config/recycle/config.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_API_BASE_URL;
use crate::auth::{FileStore, KeyValueStore, KeyringStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "recycle";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Delay before leaving the login screen when a session already exists.
pub const DEFAULT_REDIRECT_DELAY_MS: u64 = 400;

/// Where the session token is persisted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// JSON file in the data directory
    #[default]
    File,
    /// OS keychain
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub storage: StorageBackend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_delay_ms: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the token file and logs
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms.unwrap_or(DEFAULT_REDIRECT_DELAY_MS))
    }

    /// Build the configured token store rooted at `data_dir`
    pub fn open_store(&self, data_dir: &Path) -> Arc<dyn KeyValueStore> {
        match self.storage {
            StorageBackend::File => Arc::new(FileStore::new(data_dir)),
            StorageBackend::Keyring => Arc::new(KeyringStore),
        }
    }
}

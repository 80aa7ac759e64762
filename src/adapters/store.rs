//! JSON File Store
//!
//! Key/value document persisted as a single JSON object on disk. Holds the
//! watchlist and cached wallet summaries between runs.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::WalletSummary;

/// Storage key of the watchlist document
pub const WATCHED_WALLETS_KEY: &str = "watchedWallets";

/// Default store file name
pub const DEFAULT_STORE_FILE: &str = "lemora_store.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to serialize value for {key}: {reason}")]
    Serialization { key: String, reason: String },

    #[error("Failed to deserialize value for {key}: {reason}")]
    Deserialization { key: String, reason: String },

    #[error("Failed to write store file: {0}")]
    Write(String),

    #[error("Failed to read store file: {0}")]
    Read(String),

    #[error("Store file is corrupted: {0}")]
    Corrupted(String),

    #[error("Failed to create directory: {0}")]
    Directory(String),
}

/// Storage key of a cached wallet summary
pub fn wallet_key(address: &str) -> String {
    format!("wallet_{}", address)
}

/// Wallet summary with the time it was fetched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedWalletInfo {
    pub data: WalletSummary,
    /// Unix ms
    pub timestamp: i64,
}

impl CachedWalletInfo {
    pub fn new(data: WalletSummary, fetched_at: DateTime<Utc>) -> Self {
        Self {
            data,
            timestamp: fetched_at.timestamp_millis(),
        }
    }

    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp_millis().saturating_sub(self.timestamp)
    }
}

#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store file inside a data directory
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(DEFAULT_STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let doc = self.load()?;
        match doc.get(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| StoreError::Deserialization {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|e| StoreError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        let mut doc = self.load()?;
        doc.insert(key.to_string(), value);
        self.save(&doc)?;

        tracing::debug!("Stored {} in {}", key, self.path.display());
        Ok(())
    }

    /// Returns whether the key existed
    pub fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut doc = self.load()?;
        if doc.remove(key).is_none() {
            return Ok(false);
        }
        self.save(&doc)?;
        Ok(true)
    }

    pub fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.load()?.keys().cloned().collect())
    }

    fn load(&self) -> Result<Map<String, Value>, StoreError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content =
            fs::read_to_string(&self.path).map_err(|e| StoreError::Read(e.to_string()))?;

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StoreError::Corrupted("top level is not an object".to_string())),
            Err(e) => Err(StoreError::Corrupted(e.to_string())),
        }
    }

    fn save(&self, doc: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::Directory(e.to_string()))?;
            }
        }

        let content = serde_json::to_string_pretty(doc).map_err(|e| StoreError::Serialization {
            key: "*".to_string(),
            reason: e.to_string(),
        })?;

        fs::write(&self.path, content).map_err(|e| StoreError::Write(e.to_string()))
    }
}

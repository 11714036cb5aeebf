// src/gateway/cache.rs
// Local response cache. Entries are JSON envelopes `{data, expiry}` stored under
// `prefix + key` in an injected key-value store. Caching is an optimization only:
// every store failure is logged and treated as a miss.

use chrono::{Duration as ChronoDuration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::CacheError;
use crate::models::generation::{Language, OperationKind};

pub const CACHE_PREFIX: &str = "vira_cache_";
pub const DEFAULT_TTL_HOURS: i64 = 24;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn set(&self, key: &str, value: String) -> Result<(), CacheError>;
    fn delete(&self, key: &str) -> Result<(), CacheError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// One file per key under a directory, so cached results survive restarts.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    data: Value,
    /// Expiry as epoch milliseconds.
    expiry: i64,
}

/// Compose the cache key for an (operation, query, language) tuple.
pub fn cache_key(kind: OperationKind, query: &str, language: Language) -> String {
    let normalized = query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    format!("{}_{}_{}", kind.cache_prefix(), normalized, language.code())
}

#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn KeyValueStore>,
    ttl_hours: i64,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_ttl(store, DEFAULT_TTL_HOURS)
    }

    pub fn with_ttl(store: Arc<dyn KeyValueStore>, ttl_hours: i64) -> Self {
        Self { store, ttl_hours }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Fresh cached value, or `None` on miss, expiry or any store failure.
    /// Expired or unreadable entries are removed.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let storage_key = format!("{}{}", CACHE_PREFIX, key);
        let raw = match self.store.get(&storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Cache read failed for {}: {}", key, e);
                return None;
            }
        };

        let envelope: Envelope = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("Discarding unreadable cache entry {}: {}", key, e);
                self.remove(&storage_key);
                return None;
            }
        };

        if Utc::now().timestamp_millis() >= envelope.expiry {
            tracing::debug!("Cache entry expired: {}", key);
            self.remove(&storage_key);
            return None;
        }

        match serde_json::from_value(envelope.data) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Cached payload for {} has an unexpected shape: {}", key, e);
                self.remove(&storage_key);
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        self.set_with_ttl(key, value, self.ttl_hours)
    }

    pub fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl_hours: i64) {
        let storage_key = format!("{}{}", CACHE_PREFIX, key);
        let Some(expiry) = ChronoDuration::try_hours(ttl_hours).and_then(|ttl| Utc::now().checked_add_signed(ttl))
        else {
            tracing::warn!("Skipping cache write for {}: TTL of {}h is out of range", key, ttl_hours);
            return;
        };
        let result = serde_json::to_value(value)
            .map_err(CacheError::from)
            .and_then(|data| {
                let envelope = Envelope {
                    data,
                    expiry: expiry.timestamp_millis(),
                };
                Ok(serde_json::to_string(&envelope)?)
            })
            .and_then(|raw| self.store.set(&storage_key, raw));

        if let Err(e) = result {
            tracing::warn!("Cache write failed for {}: {}", key, e);
        }
    }

    fn remove(&self, storage_key: &str) {
        if let Err(e) = self.store.delete(storage_key) {
            tracing::warn!("Cache delete failed for {}: {}", storage_key, e);
        }
    }
}

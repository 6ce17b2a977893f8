//! Key/value storage media and the repositories built on them.
//!
//! The storefront persists everything as JSON strings under string keys, the
//! same shape the browser template keeps in local storage. [`MemoryStore`]
//! backs tests and previews; [`SqliteStore`] backs the service.

mod repository;
mod sqlite;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use thiserror::Error;

pub use repository::{place_order, CartRepository, OrderRepository, SetupRepository, StoredCarts, StoredOrders, StoredSetups};
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// String key/value medium with local-storage semantics.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.lock().map(|e| e.contains_key(key)).unwrap_or(false)
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().map(|e| e.keys().cloned().collect()).unwrap_or_default()
    }

    fn poisoned() -> StorageError { StorageError::Unavailable("memory store lock poisoned".into()) }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

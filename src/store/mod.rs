//! Durable mapping from (user, item) to a `ReviewRecord`.
//!
//! The store holds no algorithm. Every implementation serializes access
//! internally so one instance can be shared by the scheduler, the selector and
//! the analyzer.

pub mod json;
pub mod memory;
pub mod schema;
pub mod sqlite;

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use crate::config::{StoreBackend, StoreConfig};
use crate::domain::{ItemId, ReviewRecord};

pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use schema::run_migrations;
pub use sqlite::SqliteStore;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt review data: {0}")]
    Corrupt(String),

    #[error("Review store unavailable")]
    Lock,
}

pub type Result<T> = std::result::Result<T, StorageError>;

pub trait ReviewStore: Send + Sync {
    fn get(&self, user: &str, item: &ItemId) -> Result<Option<ReviewRecord>>;

    /// Insert or replace the record. On error the previous state is kept.
    fn put(&self, user: &str, item: &ItemId, record: &ReviewRecord) -> Result<()>;

    /// Every record of a user, in no particular order.
    fn all_for_user(&self, user: &str) -> Result<Vec<(ItemId, ReviewRecord)>>;
}

impl<T: ReviewStore + ?Sized> ReviewStore for &T {
    fn get(&self, user: &str, item: &ItemId) -> Result<Option<ReviewRecord>> {
        (**self).get(user, item)
    }

    fn put(&self, user: &str, item: &ItemId, record: &ReviewRecord) -> Result<()> {
        (**self).put(user, item, record)
    }

    fn all_for_user(&self, user: &str) -> Result<Vec<(ItemId, ReviewRecord)>> {
        (**self).all_for_user(user)
    }
}

impl<T: ReviewStore + ?Sized> ReviewStore for Arc<T> {
    fn get(&self, user: &str, item: &ItemId) -> Result<Option<ReviewRecord>> {
        (**self).get(user, item)
    }

    fn put(&self, user: &str, item: &ItemId, record: &ReviewRecord) -> Result<()> {
        (**self).put(user, item, record)
    }

    fn all_for_user(&self, user: &str) -> Result<Vec<(ItemId, ReviewRecord)>> {
        (**self).all_for_user(user)
    }
}

impl<T: ReviewStore + ?Sized> ReviewStore for Box<T> {
    fn get(&self, user: &str, item: &ItemId) -> Result<Option<ReviewRecord>> {
        (**self).get(user, item)
    }

    fn put(&self, user: &str, item: &ItemId, record: &ReviewRecord) -> Result<()> {
        (**self).put(user, item, record)
    }

    fn all_for_user(&self, user: &str) -> Result<Vec<(ItemId, ReviewRecord)>> {
        (**self).all_for_user(user)
    }
}

/// Acquire a store lock, returning an error if poisoned
pub(crate) fn try_lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| {
        tracing::error!("Review store mutex poisoned - a thread panicked while holding the lock");
        StorageError::Lock
    })
}

/// Open the store selected by the configuration.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn ReviewStore>> {
    match config.backend {
        StoreBackend::Sqlite => Ok(Box::new(SqliteStore::open(&config.path)?)),
        StoreBackend::Json => Ok(Box::new(JsonFileStore::open(&config.path)?)),
        StoreBackend::Memory => Ok(Box::new(MemoryStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn roundtrip(store: &dyn ReviewStore) {
        let item = ItemId::from_content("Rust", "What does `?` do?");
        let record = ReviewRecord::new(Utc::now());
        store.put("ann", &item, &record).unwrap();
        assert_eq!(store.get("ann", &item).unwrap(), Some(record));
    }

    #[test]
    fn test_open_memory_store() {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            path: Default::default(),
        };
        let store = open_store(&config).unwrap();
        roundtrip(store.as_ref());
    }

    #[test]
    fn test_open_sqlite_store_creates_parent_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("reviews.db");
        let store = open_store(&StoreConfig {
            backend: StoreBackend::Sqlite,
            path: path.clone(),
        })
        .unwrap();
        roundtrip(store.as_ref());
        assert!(path.exists());
    }

    #[test]
    fn test_open_json_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let store = open_store(&StoreConfig {
            backend: StoreBackend::Json,
            path: path.clone(),
        })
        .unwrap();
        roundtrip(store.as_ref());
        assert!(path.exists());
    }

    #[test]
    fn test_shared_store_through_arc() {
        let store = Arc::new(MemoryStore::new());
        let shared = Arc::clone(&store);
        roundtrip(&shared);
        assert_eq!(store.all_for_user("ann").unwrap().len(), 1);
    }
}

//! Test utilities for store setup.
//!
//! Provides a temporary data directory for the file-backed stores and a store
//! wrapper that injects I/O failures.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tempfile::TempDir;

use crate::domain::{ItemId, ReviewRecord};
use crate::store::{MemoryStore, ReviewStore, StorageError};

/// Temporary data directory, removed when dropped.
pub struct TestEnv {
    /// Temporary directory (kept alive for database file persistence)
    pub temp: TempDir,
}

impl TestEnv {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            temp: TempDir::new()?,
        })
    }

    /// Get the temporary directory path for creating test files.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.temp.path().join("reviews.db")
    }

    pub fn json_path(&self) -> PathBuf {
        self.temp.path().join("spaced_repetition_data.json")
    }
}

/// In-memory store whose reads or writes can be switched to fail.
#[derive(Default)]
pub struct FailingStore {
    pub inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, op: &str) -> crate::store::Result<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StorageError::Io(std::io::Error::other(format!("injected {} failure", op))))
        } else {
            Ok(())
        }
    }
}

impl ReviewStore for FailingStore {
    fn get(&self, user: &str, item: &ItemId) -> crate::store::Result<Option<ReviewRecord>> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.get(user, item)
    }

    fn put(&self, user: &str, item: &ItemId, record: &ReviewRecord) -> crate::store::Result<()> {
        Self::check(&self.fail_writes, "write")?;
        self.inner.put(user, item, record)
    }

    fn all_for_user(&self, user: &str) -> crate::store::Result<Vec<(ItemId, ReviewRecord)>> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.all_for_user(user)
    }
}

/// `count` distinct item ids for one topic.
pub fn item_ids(topic: &str, count: usize) -> Vec<ItemId> {
    (0..count)
        .map(|i| ItemId::from_content(topic, &format!("Question {}?", i + 1)))
        .collect()
}

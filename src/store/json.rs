//! Single-document JSON review history.
//!
//! File layout:
//! ```text
//! {
//!   "version": 1,
//!   "records": [
//!     { "user": "ann", "item": "3f2a9c01b7de", "record": { "ease_factor": 2.6, ... } }
//!   ]
//! }
//! ```
//!
//! The whole document is loaded on open and rewritten on every put. A document
//! that cannot be parsed is never overwritten: `open` fails instead.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::{try_lock, Result, ReviewStore};
use crate::domain::{ItemId, ReviewRecord};

const FORMAT_VERSION: u32 = 1;

type Key = (String, ItemId);

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    version: u32,
    records: Vec<Entry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    user: String,
    item: ItemId,
    record: ReviewRecord,
}

pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<HashMap<Key, ReviewRecord>>,
}

impl JsonFileStore {
    /// Load the document at `path`. A missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        let records = match fs::read_to_string(path) {
            Ok(contents) => parse_document(&contents).inspect_err(|e| {
                tracing::warn!("Refusing to load review history {}: {}", path.display(), e);
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            "Opened review history at {} ({} records)",
            path.display(),
            records.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, records: &HashMap<Key, ReviewRecord>) -> Result<()> {
        let mut entries: Vec<Entry> = records
            .iter()
            .map(|((user, item), record)| Entry {
                user: user.clone(),
                item: item.clone(),
                record: record.clone(),
            })
            .collect();
        entries.sort_by(|a, b| (&a.user, &a.item).cmp(&(&b.user, &b.item)));

        let document = Document {
            version: FORMAT_VERSION,
            records: entries,
        };
        let json = serde_json::to_string_pretty(&document)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write then rename so a crash never leaves a half-written document
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

fn parse_document(contents: &str) -> Result<HashMap<Key, ReviewRecord>> {
    let document: Document = serde_json::from_str(contents)?;
    Ok(document
        .records
        .into_iter()
        .map(|entry| ((entry.user, entry.item), entry.record))
        .collect())
}

impl ReviewStore for JsonFileStore {
    fn get(&self, user: &str, item: &ItemId) -> Result<Option<ReviewRecord>> {
        let records = try_lock(&self.records)?;
        Ok(records.get(&(user.to_string(), item.clone())).cloned())
    }

    fn put(&self, user: &str, item: &ItemId, record: &ReviewRecord) -> Result<()> {
        let mut records = try_lock(&self.records)?;
        let key = (user.to_string(), item.clone());
        let previous = records.insert(key.clone(), record.clone());

        if let Err(e) = self.save(&records) {
            tracing::warn!("Failed to save review history {}: {}", self.path.display(), e);
            match previous {
                Some(old) => records.insert(key, old),
                None => records.remove(&key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn all_for_user(&self, user: &str) -> Result<Vec<(ItemId, ReviewRecord)>> {
        let records = try_lock(&self.records)?;
        Ok(records
            .iter()
            .filter(|((owner, _), _)| owner == user)
            .map(|((_, item), record)| (item.clone(), record.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StorageError;
    use crate::testing::TestEnv;
    use chrono::{Duration, Utc};

    fn sample_record() -> ReviewRecord {
        let created = Utc::now() - Duration::days(3);
        ReviewRecord {
            ease_factor: 2.18,
            repetition: 0,
            interval: 1,
            next_review: created + Duration::days(1),
            total_attempts: 4,
            correct_attempts: 1,
            last_response_time: 12.5,
            avg_response_time: 9.875,
            created_at: created,
        }
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let env = TestEnv::new().unwrap();
        let store = JsonFileStore::open(&env.json_path()).unwrap();
        assert!(store.all_for_user("ann").unwrap().is_empty());
        assert!(!env.json_path().exists());
    }

    #[test]
    fn test_roundtrip_survives_reopen() {
        let env = TestEnv::new().unwrap();
        let item = ItemId::from_content("Geography", "Capital of Peru?");
        let record = sample_record();

        {
            let store = JsonFileStore::open(&env.json_path()).unwrap();
            store.put("ann", &item, &record).unwrap();
        }

        let reopened = JsonFileStore::open(&env.json_path()).unwrap();
        let loaded = reopened.get("ann", &item).unwrap().unwrap();
        assert_eq!(loaded.next_review, record.next_review);
        assert_eq!(loaded.created_at, record.created_at);
        assert_eq!(loaded.total_attempts, 4);
        assert_eq!(loaded.correct_attempts, 1);
        assert!((loaded.ease_factor - record.ease_factor).abs() < 1e-9);
        assert!((loaded.avg_response_time - record.avg_response_time).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_fields_are_tolerated() {
        let env = TestEnv::new().unwrap();
        let json = r#"{
          "version": 1,
          "exported_by": "a newer release",
          "records": [
            {
              "user": "ann",
              "item": "abc123def456",
              "device": "laptop",
              "record": {
                "ease_factor": 2.5,
                "repetition": 1,
                "interval": 1,
                "next_review": "2026-01-02T00:00:00Z",
                "total_attempts": 1,
                "correct_attempts": 1,
                "last_response_time": 3.0,
                "avg_response_time": 3.0,
                "created_at": "2026-01-01T00:00:00Z",
                "streak_bonus": 4
              }
            }
          ]
        }"#;
        fs::write(env.json_path(), json).unwrap();

        let store = JsonFileStore::open(&env.json_path()).unwrap();
        let record = store.get("ann", &ItemId::from_key("abc123def456")).unwrap().unwrap();
        assert_eq!(record.repetition, 1);
    }

    #[test]
    fn test_corrupt_document_fails_closed() {
        let env = TestEnv::new().unwrap();
        let garbage = "{ \"version\": 1, \"records\": [ { \"user\": ";
        fs::write(env.json_path(), garbage).unwrap();

        let result = JsonFileStore::open(&env.json_path());
        assert!(matches!(result, Err(StorageError::Json(_))));

        // History is left untouched for manual recovery
        assert_eq!(fs::read_to_string(env.json_path()).unwrap(), garbage);
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let env = TestEnv::new().unwrap();
        // A directory where the document should be makes the rename fail
        let path = env.path().join("blocked.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let store = JsonFileStore {
            path: path.clone(),
            records: Mutex::new(HashMap::new()),
        };
        let item = ItemId::from_key("aaaaaaaaaaaa");

        assert!(store.put("ann", &item, &sample_record()).is_err());
        assert!(store.get("ann", &item).unwrap().is_none());
    }

    #[test]
    fn test_failed_save_restores_previous_record() {
        let env = TestEnv::new().unwrap();
        let path = env.path().join("blocked.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let item = ItemId::from_key("aaaaaaaaaaaa");
        let original = sample_record();
        let mut records = HashMap::new();
        records.insert(("ann".to_string(), item.clone()), original.clone());
        let store = JsonFileStore {
            path,
            records: Mutex::new(records),
        };

        let mut changed = original.clone();
        changed.total_attempts += 1;
        assert!(store.put("ann", &item, &changed).is_err());
        assert_eq!(store.get("ann", &item).unwrap(), Some(original));
    }

    #[test]
    fn test_document_is_sorted_and_versioned() {
        let env = TestEnv::new().unwrap();
        let store = JsonFileStore::open(&env.json_path()).unwrap();
        store.put("bob", &ItemId::from_key("bbbbbbbbbbbb"), &sample_record()).unwrap();
        store.put("ann", &ItemId::from_key("aaaaaaaaaaaa"), &sample_record()).unwrap();

        let document: Document =
            serde_json::from_str(&fs::read_to_string(env.json_path()).unwrap()).unwrap();
        assert_eq!(document.version, FORMAT_VERSION);
        let users: Vec<&str> = document.records.iter().map(|e| e.user.as_str()).collect();
        assert_eq!(users, vec!["ann", "bob"]);
    }
}

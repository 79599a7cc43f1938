//! In-process store, used for tests and throwaway sessions.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{try_lock, Result, ReviewStore};
use crate::domain::{ItemId, ReviewRecord};

type Key = (String, ItemId);

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<Key, ReviewRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all users
    pub fn len(&self) -> Result<usize> {
        Ok(try_lock(&self.records)?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl ReviewStore for MemoryStore {
    fn get(&self, user: &str, item: &ItemId) -> Result<Option<ReviewRecord>> {
        let records = try_lock(&self.records)?;
        Ok(records.get(&(user.to_string(), item.clone())).cloned())
    }

    fn put(&self, user: &str, item: &ItemId, record: &ReviewRecord) -> Result<()> {
        let mut records = try_lock(&self.records)?;
        records.insert((user.to_string(), item.clone()), record.clone());
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
    use chrono::Utc;

    #[test]
    fn test_get_missing_is_none() {
        let store = MemoryStore::new();
        let item = ItemId::from_key("000000000000");
        assert!(store.get("ann", &item).unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_put_replaces() {
        let store = MemoryStore::new();
        let item = ItemId::from_key("aaaaaaaaaaaa");
        let mut record = ReviewRecord::new(Utc::now());
        store.put("ann", &item, &record).unwrap();

        record.total_attempts = 3;
        store.put("ann", &item, &record).unwrap();

        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.get("ann", &item).unwrap().unwrap().total_attempts, 3);
    }

    #[test]
    fn test_users_are_isolated() {
        let store = MemoryStore::new();
        let item = ItemId::from_key("aaaaaaaaaaaa");
        store.put("ann", &item, &ReviewRecord::new(Utc::now())).unwrap();

        assert!(store.get("bob", &item).unwrap().is_none());
        assert!(store.all_for_user("bob").unwrap().is_empty());
        assert_eq!(store.all_for_user("ann").unwrap().len(), 1);
    }

    #[test]
    fn test_user_names_with_separators_do_not_collide() {
        // "a:b" + "c" and "a" + "b:c" would collide with a concatenated key
        let store = MemoryStore::new();
        store.put("a:b", &ItemId::from_key("c"), &ReviewRecord::new(Utc::now())).unwrap();

        assert!(store.get("a", &ItemId::from_key("b:c")).unwrap().is_none());
        assert!(store.all_for_user("a").unwrap().is_empty());
    }
}

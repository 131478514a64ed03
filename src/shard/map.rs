//! A single independently lockable partition of the key space

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{ShardError, ShardResult};

/// Key/value map guarded by its own reader/writer lock.
///
/// Readers run concurrently; a writer excludes everyone else on this shard
/// only. Every operation takes the lock exactly once and never touches
/// another shard, so there is no lock ordering to get wrong.
#[derive(Debug, Default)]
pub struct Shard {
    entries: RwLock<HashMap<String, String>>,
}

impl Shard {
    /// Create an empty shard
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new key. Existing keys are rejected, never overwritten.
    pub fn put(&self, key: &str, value: &str) -> ShardResult<()> {
        // Check and insert under the same write guard
        let mut entries = self.entries.write();

        if entries.contains_key(key) {
            return Err(ShardError::KeyAlreadyExists);
        }
        entries.insert(key.to_owned(), value.to_owned());

        Ok(())
    }

    /// Read the value stored under `key`
    pub fn get(&self, key: &str) -> ShardResult<String> {
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or(ShardError::KeyNotFound)
    }

    /// Remove `key`, failing if it is absent
    pub fn delete(&self, key: &str) -> ShardResult<()> {
        self.entries
            .write()
            .remove(key)
            .map(|_| ())
            .ok_or(ShardError::KeyNotFound)
    }

    /// Check whether `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Number of keys currently held
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the shard holds no keys
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_put_get_delete() {
        let shard = Shard::new();

        shard.put("a", "1").unwrap();
        assert_eq!(shard.get("a").unwrap(), "1");
        assert_eq!(shard.len(), 1);

        shard.delete("a").unwrap();
        assert_eq!(shard.get("a"), Err(ShardError::KeyNotFound));
        assert!(shard.is_empty());
    }

    #[test]
    fn test_put_is_insert_only() {
        let shard = Shard::new();

        shard.put("a", "1").unwrap();
        assert_eq!(shard.put("a", "2"), Err(ShardError::KeyAlreadyExists));
        assert_eq!(shard.get("a").unwrap(), "1");
    }

    #[test]
    fn test_delete_missing_key() {
        let shard = Shard::new();
        assert_eq!(shard.delete("missing"), Err(ShardError::KeyNotFound));
    }

    #[test]
    fn test_concurrent_put_same_key_single_winner() {
        let shard = Arc::new(Shard::new());
        let mut handles = Vec::new();

        for i in 0..16 {
            let shard = shard.clone();
            handles.push(thread::spawn(move || shard.put("contended", &i.to_string())));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();

        assert_eq!(winners, 1);
        assert!(results
            .iter()
            .filter_map(|r| r.err())
            .all(|e| e == ShardError::KeyAlreadyExists));
        assert_eq!(shard.len(), 1);
    }
}

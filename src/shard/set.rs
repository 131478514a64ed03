//! Fixed set of shards behind a hash router

use super::{Shard, ShardResult, ShardRouter, ShardStats};

/// Store facade over a fixed array of shards.
///
/// Every key lives in exactly one shard, chosen by [`ShardRouter`]. There is
/// no locking at this layer: each call forwards to one shard and returns its
/// result verbatim. The shard count is fixed for the lifetime of the set.
#[derive(Debug)]
pub struct ShardSet {
    router: ShardRouter,
    shards: Box<[Shard]>,
}

impl ShardSet {
    /// Allocate `shard_count` empty shards (at least one)
    pub fn new(shard_count: usize) -> Self {
        let router = ShardRouter::new(shard_count);
        let shards = (0..router.shard_count()).map(|_| Shard::new()).collect();

        Self { router, shards }
    }

    /// Number of shards in the set
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// The router used to place keys
    pub fn router(&self) -> ShardRouter {
        self.router
    }

    /// Index of the shard that owns `key`
    pub fn shard_for(&self, key: &str) -> usize {
        self.router.route(key)
    }

    #[inline]
    fn shard(&self, key: &str) -> &Shard {
        &self.shards[self.router.route(key)]
    }

    /// Read the value stored under `key`
    pub fn get(&self, key: &str) -> ShardResult<String> {
        self.shard(key).get(key)
    }

    /// Insert `key`; fails with `KeyAlreadyExists` if present
    pub fn put(&self, key: &str, value: &str) -> ShardResult<()> {
        self.shard(key).put(key, value)
    }

    /// Remove `key`; fails with `KeyNotFound` if absent
    pub fn delete(&self, key: &str) -> ShardResult<()> {
        self.shard(key).delete(key)
    }

    /// Check whether `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.shard(key).contains_key(key)
    }

    /// Total keys across all shards (not an atomic snapshot)
    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    /// Check if every shard is empty
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(Shard::is_empty)
    }

    /// Per-shard occupancy
    pub fn stats(&self) -> ShardStats {
        ShardStats::from_counts(self.shards.iter().map(Shard::len).collect())
    }
}

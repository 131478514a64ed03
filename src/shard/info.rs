//! Shard occupancy statistics

use serde::Serialize;

/// Point-in-time key counts for every shard of a set.
///
/// Each count is read under its own shard lock, so the snapshot is not
/// atomic across shards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ShardStats {
    /// Number of shards
    pub shard_count: usize,
    /// Total keys across all shards
    pub total_keys: usize,
    /// Keys held by each shard, by index
    pub keys_per_shard: Vec<usize>,
    /// Number of shards holding no keys
    pub empty_shards: usize,
}

impl ShardStats {
    /// Build statistics from per-shard key counts
    pub fn from_counts(keys_per_shard: Vec<usize>) -> Self {
        Self {
            shard_count: keys_per_shard.len(),
            total_keys: keys_per_shard.iter().sum(),
            empty_shards: keys_per_shard.iter().filter(|&&n| n == 0).count(),
            keys_per_shard,
        }
    }

    /// Fewest keys held by any shard
    pub fn min_keys(&self) -> usize {
        self.keys_per_shard.iter().copied().min().unwrap_or(0)
    }

    /// Most keys held by any shard
    pub fn max_keys(&self) -> usize {
        self.keys_per_shard.iter().copied().max().unwrap_or(0)
    }

    /// Ratio of the fullest shard to the mean occupancy (1.0 is perfectly even)
    pub fn skew(&self) -> f64 {
        if self.total_keys == 0 || self.shard_count == 0 {
            return 1.0;
        }

        let mean = self.total_keys as f64 / self.shard_count as f64;
        self.max_keys() as f64 / mean
    }
}

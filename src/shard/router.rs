//! Deterministic key-to-shard routing
//!
//! Keys are placed with an ELF/PJW-style rolling hash. The variant used here
//! clears the top nibble *before* folding it back in (shifted right by 8), so
//! the accumulator never grows past 28 bits and a 32-bit unsigned value holds
//! it exactly.

/// Mask selecting the top nibble (bits 28-31) of the accumulator
const HIGH_NIBBLE_MASK: u32 = 0xF000_0000;

/// Hash a key with the rolling ELF-style hash.
///
/// Total over all inputs: the empty key hashes to 0. The result is always
/// below `1 << 28`.
pub fn elf_hash(key: &str) -> u32 {
    let mut hash: u32 = 0;

    for &byte in key.as_bytes() {
        // hash < 2^28 here, so the shift cannot drop bits
        hash = (hash << 4) | u32::from(byte);

        let high = hash & HIGH_NIBBLE_MASK;
        if high != 0 {
            hash &= !HIGH_NIBBLE_MASK;
            hash ^= high >> 8;
        }
    }

    hash
}

/// Maps keys onto a fixed number of shards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardRouter {
    shard_count: usize,
}

impl ShardRouter {
    /// Create a router for `shard_count` shards.
    ///
    /// A zero count is clamped to one so `route` stays total.
    pub fn new(shard_count: usize) -> Self {
        Self {
            shard_count: shard_count.max(1),
        }
    }

    /// Number of shards this router distributes over
    pub fn shard_count(&self) -> usize {
        self.shard_count
    }

    /// Shard index for `key`, always in `[0, shard_count)`
    #[inline]
    pub fn route(&self, key: &str) -> usize {
        elf_hash(key) as usize % self.shard_count
    }
}

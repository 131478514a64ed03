//! Hash-sharded key/value storage
//!
//! This module spreads keys across a fixed number of independently locked
//! shards. The router is a pure function of the key, which is what makes
//! per-shard uniqueness equivalent to global uniqueness.

mod error;
mod info;
mod map;
mod router;
mod set;

pub use error::{ShardError, ShardResult};
pub use info::ShardStats;
pub use map::Shard;
pub use router::{elf_hash, ShardRouter};
pub use set::ShardSet;

/// Default number of shards
pub const DEFAULT_SHARD_COUNT: usize = 7;

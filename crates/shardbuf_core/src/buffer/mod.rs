//! # Sharded Byte Buffers
//!
//! Per-worker append-only storage.
//!
//! ## Design Philosophy
//!
//! Each worker slot owns one shard for the whole write phase:
//! - No locks, no atomics on the append path
//! - Growth only contends on the global allocator
//! - One consolidated, ordered read after every writer has joined

mod reader;
mod shard;
mod sharded;

pub use reader::Reader;
pub use shard::Shard;
pub use sharded::{ShardSlot, ShardWriter, ShardedBuffer};

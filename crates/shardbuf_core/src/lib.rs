//! # SHARDBUF Core
//!
//! Thread-sharded, append-only event buffers designed for:
//! - Any number of parallel producers with zero cross-thread locking
//! - One deterministic, consolidated read after every producer joins
//! - Buffer reuse across cycles without reallocation
//!
//! ## Architecture Rules
//!
//! 1. **One shard, one writer** - Each worker slot appends to its own shard
//! 2. **Phases never overlap** - Writers borrow the queue mutably; reads need it back
//! 3. **Shard order is read order** - Ascending shard id, never wall-clock order
//!
//! ## Example
//!
//! ```rust,ignore
//! use shardbuf_core::{EventQueue, QueueConfig, ShardSlot};
//!
//! let mut queue: EventQueue<u32> = EventQueue::new(&QueueConfig::default())?;
//!
//! std::thread::scope(|s| {
//!     for mut writer in queue.writers() {
//!         s.spawn(move || writer.enqueue(writer.shard_id() as u32));
//!     }
//! });
//!
//! assert_eq!(queue.component_count(), queue.shard_count());
//! queue.clear();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod buffer;
pub mod config;
pub mod error;
pub mod queue;

pub use buffer::{Reader, Shard, ShardSlot, ShardWriter, ShardedBuffer};
pub use config::{
    Lifetime, QueueConfig, DEFAULT_SHARD_ID, MAX_SHARD_ID, MAX_WORKER_COUNT, MIN_SHARD_ID,
};
pub use error::{ShardError, ShardResult};
pub use queue::{
    EventQueue, EventWriter, LinkRecord, PayloadEventQueue, PayloadWriter, QueueStats,
    RawEventQueue, RawWriter,
};

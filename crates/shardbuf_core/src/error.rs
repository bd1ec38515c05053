//! # Error Types
//!
//! All errors that can occur while writing to or reading from sharded buffers.

use thiserror::Error;

/// Errors that can occur in the buffer system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShardError {
    /// A per-shard accessor was called with an id outside the valid range.
    ///
    /// Recoverable: the buffer is untouched.
    #[error("shard id {id} out of range [{min}, {max}]")]
    OutOfRange {
        /// The rejected shard id.
        id: usize,
        /// Smallest valid shard id.
        min: usize,
        /// Largest valid shard id.
        max: usize,
    },

    /// A shard could not grow. Fatal for the write that triggered it.
    #[error("shard {shard_id} failed to reserve {additional} more bytes")]
    Allocation {
        /// The shard that tried to grow.
        shard_id: usize,
        /// Bytes requested on top of the current length.
        additional: usize,
    },

    /// A reader was asked for more bytes than the buffer holds.
    #[error("read of {requested} bytes exceeds {available} bytes available")]
    ReadOverrun {
        /// Bytes requested.
        requested: usize,
        /// Bytes held across all shards.
        available: usize,
    },

    /// The destination slice cannot hold the requested bytes.
    #[error("destination holds {capacity} bytes, {requested} requested")]
    DestinationTooSmall {
        /// Bytes requested.
        requested: usize,
        /// Length of the destination.
        capacity: usize,
    },

    /// A typed view was requested over storage with a different layout.
    #[error("layout mismatch: expected {expected}-byte items, storage holds {actual}-byte items")]
    LayoutMismatch {
        /// Size of the requested type.
        expected: usize,
        /// Size recorded in the storage.
        actual: usize,
    },

    /// A link record points past the end of its payload shard.
    #[error("link into shard {shard_id} ends at byte {end}, shard holds {available}")]
    LinkOutOfBounds {
        /// Payload shard referenced by the link.
        shard_id: usize,
        /// End of the linked byte range.
        end: usize,
        /// Bytes held by the payload shard.
        available: usize,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for buffer operations.
pub type ShardResult<T> = Result<T, ShardError>;

//! # Reader
//!
//! Read-only view presenting every shard of a buffer as one stream.
//!
//! ```text
//!   shard 0      shard 1   shard 2 (empty)   shard 3
//! ┌─────────┐  ┌───────┐  ┌┐                ┌──────────┐
//! │ a a a a │  │ b b   │  ││                │ c c c c c│
//! └─────────┘  └───────┘  └┘                └──────────┘
//!        ╲          │                           ╱
//!         ▼         ▼                          ▼
//!        [ a a a a b b c c c c c ]   logical stream
//! ```
//!
//! Order is ascending shard id, never the wall-clock order of the appends.

use super::shard::Shard;
use crate::error::{ShardError, ShardResult};

/// Ordered, read-only concatenation of a buffer's shards.
#[derive(Clone, Copy, Debug)]
pub struct Reader<'a> {
    shards: &'a [Shard],
}

impl<'a> Reader<'a> {
    pub(crate) fn new(shards: &'a [Shard]) -> Self {
        Self { shards }
    }

    /// Total bytes available.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    /// Returns true if no shard holds data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(Shard::is_empty)
    }

    /// Iterates `(shard_id, bytes)` over non-empty shards in read order.
    pub fn chunks(&self) -> impl Iterator<Item = (usize, &'a [u8])> + 'a {
        let shards: &'a [Shard] = self.shards;
        shards
            .iter()
            .filter(|shard| !shard.is_empty())
            .map(|shard| (shard.id(), shard.as_bytes()))
    }

    /// Copies the first `byte_length` bytes of the stream into `destination`.
    ///
    /// # Errors
    ///
    /// - `ReadOverrun` if `byte_length` exceeds [`len`](Self::len)
    /// - `DestinationTooSmall` if `destination` is shorter than `byte_length`
    pub fn copy_to(&self, destination: &mut [u8], byte_length: usize) -> ShardResult<()> {
        let available = self.len();
        if byte_length > available {
            return Err(ShardError::ReadOverrun {
                requested: byte_length,
                available,
            });
        }
        if destination.len() < byte_length {
            return Err(ShardError::DestinationTooSmall {
                requested: byte_length,
                capacity: destination.len(),
            });
        }

        let mut cursor = 0;
        for (_, bytes) in self.chunks() {
            if cursor == byte_length {
                break;
            }
            let take = (byte_length - cursor).min(bytes.len());
            destination[cursor..cursor + take].copy_from_slice(&bytes[..take]);
            cursor += take;
        }
        debug_assert_eq!(cursor, byte_length);
        Ok(())
    }

    /// Copies the whole stream into a new vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for (_, bytes) in self.chunks() {
            out.extend_from_slice(bytes);
        }
        out
    }
}

//! # Shard
//!
//! One worker's private, growable byte region.

use crate::error::{ShardError, ShardResult};

/// A growable append-only byte buffer owned by exactly one writer.
///
/// There is no concurrency control here. During a write phase the shard is
/// reachable only through the single [`ShardWriter`](super::ShardWriter)
/// handed to its worker.
#[derive(Debug, Default)]
pub struct Shard {
    /// Position of this shard in its buffer.
    id: usize,
    /// Written bytes. `data.len()` is the shard size.
    data: Vec<u8>,
}

impl Shard {
    /// Creates an empty shard, reserving `capacity` bytes up front.
    ///
    /// # Errors
    ///
    /// Returns `Allocation` if the reservation fails.
    pub fn with_capacity(id: usize, capacity: usize) -> ShardResult<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| ShardError::Allocation {
                shard_id: id,
                additional: capacity,
            })?;
        Ok(Self { id, data })
    }

    /// Returns the id of this shard.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Returns the number of bytes written.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing has been written since the last clear.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the reserved capacity in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Returns the written bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Appends `bytes`, growing geometrically when capacity runs out.
    ///
    /// # Errors
    ///
    /// Returns `Allocation` if growth fails. The shard is unchanged in that case.
    #[inline]
    pub fn append(&mut self, bytes: &[u8]) -> ShardResult<()> {
        let before = self.data.capacity();
        if self.data.len() + bytes.len() > before {
            self.data
                .try_reserve(bytes.len())
                .map_err(|_| ShardError::Allocation {
                    shard_id: self.id,
                    additional: bytes.len(),
                })?;
            tracing::trace!(
                shard = self.id,
                from = before,
                to = self.data.capacity(),
                "shard grown"
            );
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Resets the length to zero. Capacity is kept for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Releases the shard memory.
    pub fn dispose(&mut self) {
        self.data = Vec::new();
    }
}

//! # Sharded Buffer
//!
//! A fixed array of shards, one per worker slot plus the reserved default
//! shard, with read, clear and dispose operations spanning all of them.

use super::reader::Reader;
use super::shard::Shard;
use crate::config::{QueueConfig, MIN_SHARD_ID};
use crate::error::{ShardError, ShardResult};

/// A write handle bound to one shard id.
///
/// Schedulers use this to route each writer to the worker slot with the
/// same id.
pub trait ShardSlot: Send {
    /// The shard id every append through this handle lands in.
    fn shard_id(&self) -> usize;
}

/// Fixed-size collection of [`Shard`]s indexed by worker slot.
///
/// Invariant: [`len`](Self::len) equals the sum of all shard lengths.
///
/// # Example
///
/// ```rust,ignore
/// let mut buffer = ShardedBuffer::new(&QueueConfig::default().with_worker_count(4))?;
///
/// std::thread::scope(|s| {
///     for mut writer in buffer.writers() {
///         s.spawn(move || writer.append(&[1, 2, 3]));
///     }
/// });
///
/// assert_eq!(buffer.len(), 15);
/// ```
#[derive(Debug)]
pub struct ShardedBuffer {
    /// One shard per id in `MIN_SHARD_ID..=max_shard_id`.
    shards: Box<[Shard]>,
}

impl ShardedBuffer {
    /// Creates a buffer with `config.shard_count()` empty shards.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an invalid config, or `Allocation` if the
    /// initial reservation fails.
    pub fn new(config: &QueueConfig) -> ShardResult<Self> {
        config.validate()?;
        let shards = (0..config.shard_count())
            .map(|id| Shard::with_capacity(id, config.initial_shard_capacity))
            .collect::<ShardResult<Vec<_>>>()?;
        Ok(Self {
            shards: shards.into_boxed_slice(),
        })
    }

    /// Number of shards.
    #[inline]
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Largest accepted shard id.
    #[inline]
    #[must_use]
    pub fn max_shard_id(&self) -> usize {
        self.shards.len() - 1
    }

    #[inline]
    fn check_id(&self, id: usize) -> ShardResult<()> {
        if (MIN_SHARD_ID..=self.max_shard_id()).contains(&id) {
            Ok(())
        } else {
            Err(ShardError::OutOfRange {
                id,
                min: MIN_SHARD_ID,
                max: self.max_shard_id(),
            })
        }
    }

    /// Returns shard `id`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `id` is outside `[MIN_SHARD_ID, max_shard_id]`.
    pub fn shard(&self, id: usize) -> ShardResult<&Shard> {
        self.check_id(id)?;
        Ok(&self.shards[id])
    }

    /// Returns shard `id` mutably.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `id` is outside `[MIN_SHARD_ID, max_shard_id]`.
    pub fn shard_mut(&mut self, id: usize) -> ShardResult<&mut Shard> {
        self.check_id(id)?;
        Ok(&mut self.shards[id])
    }

    /// Total bytes written across all shards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    /// Returns true if every shard is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(Shard::is_empty)
    }

    /// Total reserved bytes across all shards.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shards.iter().map(Shard::capacity).sum()
    }

    /// Number of shards holding at least one byte.
    #[must_use]
    pub fn non_empty_shards(&self) -> usize {
        self.shards.iter().filter(|s| !s.is_empty()).count()
    }

    /// Returns an ordered reader over all shards.
    #[inline]
    #[must_use]
    pub fn reader(&self) -> Reader<'_> {
        Reader::new(&self.shards)
    }

    /// Splits the buffer into one writer per shard, in ascending id order.
    ///
    /// The writers borrow disjoint shards, so they can be moved to separate
    /// threads and used without any locking. The buffer cannot be read until
    /// every writer is dropped.
    pub fn writers(&mut self) -> Vec<ShardWriter<'_>> {
        self.shards
            .iter_mut()
            .map(|shard| ShardWriter { shard })
            .collect()
    }

    /// Returns a writer for shard `id`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `id` is outside `[MIN_SHARD_ID, max_shard_id]`.
    pub fn writer(&mut self, id: usize) -> ShardResult<ShardWriter<'_>> {
        let shard = self.shard_mut(id)?;
        Ok(ShardWriter { shard })
    }

    /// Resets every shard to zero length, keeping capacity.
    pub fn clear(&mut self) {
        for shard in self.shards.iter_mut() {
            shard.clear();
        }
    }

    /// Releases the memory of every shard. The buffer cannot be used afterwards.
    pub fn dispose(mut self) {
        let released = self.release();
        tracing::debug!(shards = self.shards.len(), released, "sharded buffer disposed");
    }

    /// Frees every shard in place, returning the bytes released.
    pub(crate) fn release(&mut self) -> usize {
        let released = self.capacity();
        for shard in self.shards.iter_mut() {
            shard.dispose();
        }
        released
    }
}

/// Exclusive append handle for one shard.
#[derive(Debug)]
pub struct ShardWriter<'a> {
    shard: &'a mut Shard,
}

impl ShardWriter<'_> {
    /// Appends raw bytes to the shard.
    ///
    /// # Errors
    ///
    /// Returns `Allocation` if the shard cannot grow.
    #[inline]
    pub fn append(&mut self, bytes: &[u8]) -> ShardResult<()> {
        self.shard.append(bytes)
    }

    /// Bytes written to the shard so far.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.shard.len()
    }

    /// Returns true if the shard is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shard.is_empty()
    }
}

impl ShardSlot for ShardWriter<'_> {
    #[inline]
    fn shard_id(&self) -> usize {
        self.shard.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_SHARD_ID, MAX_SHARD_ID};

    fn small() -> ShardedBuffer {
        ShardedBuffer::new(&QueueConfig::default().with_worker_count(4)).unwrap()
    }

    #[test]
    fn test_creation() {
        let buffer = small();
        assert_eq!(buffer.shard_count(), 5);
        assert_eq!(buffer.max_shard_id(), 4);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_size_is_sum_of_shards() {
        let mut buffer = small();
        buffer.shard_mut(0).unwrap().append(&[1, 2]).unwrap();
        buffer.shard_mut(3).unwrap().append(&[3, 4, 5]).unwrap();
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.non_empty_shards(), 2);
    }

    #[test]
    fn test_range_errors() {
        let buffer = ShardedBuffer::new(&QueueConfig::default()).unwrap();
        assert!(buffer.shard(DEFAULT_SHARD_ID).is_ok());
        assert!(buffer.shard(MAX_SHARD_ID).is_ok());
        assert_eq!(
            buffer.shard(MAX_SHARD_ID + 1).unwrap_err(),
            ShardError::OutOfRange {
                id: MAX_SHARD_ID + 1,
                min: MIN_SHARD_ID,
                max: MAX_SHARD_ID,
            }
        );
        assert!(buffer.shard(MIN_SHARD_ID.wrapping_sub(1)).is_err());
    }

    #[test]
    fn test_writers_are_disjoint() {
        let mut buffer = small();
        std::thread::scope(|s| {
            for mut writer in buffer.writers() {
                s.spawn(move || {
                    let id = u8::try_from(writer.shard_id()).unwrap();
                    for _ in 0..=id {
                        writer.append(&[id]).unwrap();
                    }
                });
            }
        });

        for id in 0..=4 {
            let shard = buffer.shard(id).unwrap();
            assert_eq!(shard.len(), id + 1);
            assert!(shard.as_bytes().iter().all(|&b| usize::from(b) == id));
        }
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut buffer = small();
        buffer.writer(2).unwrap().append(&[0; 100]).unwrap();
        let capacity = buffer.capacity();

        buffer.clear();
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.capacity(), capacity);
    }

    #[test]
    fn test_initial_capacity_reserved() {
        let config = QueueConfig::default()
            .with_worker_count(2)
            .with_initial_shard_capacity(64);
        let buffer = ShardedBuffer::new(&config).unwrap();
        assert!(buffer.capacity() >= 3 * 64);
        buffer.dispose();
    }
}

//! # Raw Event Queue
//!
//! The untyped physical storage shared by every typed queue facade.
//!
//! ## Layout
//!
//! ```text
//!              shard 0        shard 1        shard N
//! records   [ r r r     ]  [ r r       ]  [ ...        ]   record_size bytes each
//! links     [ l l l     ]  [ l l       ]  [ ...        ]   one LinkRecord per record
//! payload   [ p p p p p ]  [ p p p p p ]  [ ...        ]   element_size bytes each
//! ```
//!
//! A link in shard `k` always points into payload shard `k`.

use std::cell::Cell;

use crate::buffer::{Reader, ShardSlot, ShardWriter, ShardedBuffer};
use crate::config::{Lifetime, QueueConfig};
use crate::error::{ShardError, ShardResult};

use super::link::LinkRecord;

/// Memory usage snapshot of a queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Bytes of fixed-size records.
    pub record_bytes: usize,
    /// Bytes of link records.
    pub link_bytes: usize,
    /// Bytes of variable payload.
    pub payload_bytes: usize,
    /// Bytes reserved across all three buffers.
    pub reserved_bytes: usize,
    /// Shards per buffer.
    pub shard_count: usize,
    /// Record shards holding at least one record.
    pub active_shards: usize,
}

/// Canonical, size-erased event queue.
///
/// Three sharded buffers (records, links, payload) plus the record and
/// payload element sizes they were created with. A size of zero is valid
/// and makes the count for that axis always zero.
///
/// # Phases
///
/// Writes go through [`writers`](Self::writers) or [`writer`](Self::writer),
/// which borrow the queue mutably. Counts and readers are only reachable
/// once those borrows end, so reads can never overlap a write phase.
#[derive(Debug)]
pub struct RawEventQueue {
    records: ShardedBuffer,
    links: ShardedBuffer,
    payload: ShardedBuffer,
    record_size: usize,
    element_size: usize,
    /// Last value produced by a count query. Never refreshed on its own.
    cached_count: Cell<usize>,
    lifetime: Lifetime,
}

impl RawEventQueue {
    /// Creates a queue with empty shards.
    ///
    /// # Arguments
    ///
    /// * `record_size` - Bytes per fixed record
    /// * `element_size` - Bytes per payload element (0 when records carry no payload)
    /// * `config` - Shard count, initial capacity and lifetime
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` or `Allocation` from buffer creation.
    pub fn new(record_size: usize, element_size: usize, config: &QueueConfig) -> ShardResult<Self> {
        let queue = Self {
            records: ShardedBuffer::new(config)?,
            links: ShardedBuffer::new(config)?,
            payload: ShardedBuffer::new(config)?,
            record_size,
            element_size,
            cached_count: Cell::new(0),
            lifetime: config.lifetime,
        };
        tracing::debug!(
            record_size,
            element_size,
            shards = config.shard_count(),
            lifetime = ?config.lifetime,
            "event queue created"
        );
        Ok(queue)
    }

    /// Bytes per fixed record.
    #[inline]
    #[must_use]
    pub const fn record_size(&self) -> usize {
        self.record_size
    }

    /// Bytes per payload element.
    #[inline]
    #[must_use]
    pub const fn element_size(&self) -> usize {
        self.element_size
    }

    /// Lifetime the queue was created with.
    #[inline]
    #[must_use]
    pub const fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Number of shards per buffer.
    #[inline]
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.records.shard_count()
    }

    /// Number of records written. Zero when `record_size` is zero.
    ///
    /// Updates the cached count.
    pub fn component_count(&self) -> usize {
        let count = if self.record_size == 0 {
            0
        } else {
            self.records.len() / self.record_size
        };
        self.cached_count.set(count);
        count
    }

    /// Number of link records written.
    ///
    /// Updates the cached count.
    pub fn links_count(&self) -> usize {
        let count = self.links.len() / LinkRecord::SIZE;
        self.cached_count.set(count);
        count
    }

    /// Number of payload elements written. Zero when `element_size` is zero.
    #[must_use]
    pub fn element_count(&self) -> usize {
        if self.element_size == 0 {
            0
        } else {
            self.payload.len() / self.element_size
        }
    }

    /// Last value computed by [`component_count`](Self::component_count) or
    /// [`links_count`](Self::links_count).
    ///
    /// This is a stale cache: call a count method first for a fresh value.
    #[inline]
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.cached_count.get()
    }

    /// Ordered reader over the record bytes.
    #[must_use]
    pub fn component_reader(&self) -> Reader<'_> {
        self.records.reader()
    }

    /// Ordered reader over the link record bytes.
    #[must_use]
    pub fn links_reader(&self) -> Reader<'_> {
        self.links.reader()
    }

    /// Ordered reader over the payload bytes.
    #[must_use]
    pub fn payload_reader(&self) -> Reader<'_> {
        self.payload.reader()
    }

    /// Record bytes of shard `id`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` for an invalid shard id.
    pub fn shard_records(&self, id: usize) -> ShardResult<&[u8]> {
        Ok(self.records.shard(id)?.as_bytes())
    }

    /// Link record bytes of shard `id`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` for an invalid shard id.
    pub fn shard_links(&self, id: usize) -> ShardResult<&[u8]> {
        Ok(self.links.shard(id)?.as_bytes())
    }

    /// Payload bytes of shard `id`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` for an invalid shard id.
    pub fn shard_payload(&self, id: usize) -> ShardResult<&[u8]> {
        Ok(self.payload.shard(id)?.as_bytes())
    }

    /// Payload bytes a link points at.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if the link names an invalid shard
    /// - `LinkOutOfBounds` if the range runs past the end of the shard
    pub fn payload_for(&self, link: &LinkRecord) -> ShardResult<&[u8]> {
        let bytes = self.payload.shard(link.shard())?.as_bytes();
        let range = link.byte_range(self.element_size);
        if range.end > bytes.len() {
            return Err(ShardError::LinkOutOfBounds {
                shard_id: link.shard(),
                end: range.end,
                available: bytes.len(),
            });
        }
        Ok(&bytes[range])
    }

    /// Splits the queue into one writer per shard id, ascending.
    pub fn writers(&mut self) -> Vec<RawWriter<'_>> {
        let element_size = self.element_size;
        self.records
            .writers()
            .into_iter()
            .zip(self.links.writers())
            .zip(self.payload.writers())
            .map(|((records, links), payload)| RawWriter {
                records,
                links,
                payload,
                element_size,
            })
            .collect()
    }

    /// Returns the writer for shard `id`, for single-threaded callers.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` for an invalid shard id.
    pub fn writer(&mut self, id: usize) -> ShardResult<RawWriter<'_>> {
        Ok(RawWriter {
            records: self.records.writer(id)?,
            links: self.links.writer(id)?,
            payload: self.payload.writer(id)?,
            element_size: self.element_size,
        })
    }

    /// Memory usage snapshot.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            record_bytes: self.records.len(),
            link_bytes: self.links.len(),
            payload_bytes: self.payload.len(),
            reserved_bytes: self.records.capacity()
                + self.links.capacity()
                + self.payload.capacity(),
            shard_count: self.records.shard_count(),
            active_shards: self.records.non_empty_shards(),
        }
    }

    /// Returns true if no buffer holds data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.links.is_empty() && self.payload.is_empty()
    }

    /// Empties all three buffers, keeping their capacity for the next cycle.
    ///
    /// The cached count is left as is.
    pub fn clear(&mut self) {
        self.records.clear();
        self.links.clear();
        self.payload.clear();
    }

    /// Releases the memory of all three buffers.
    pub fn dispose(mut self) {
        let stats = self.stats();
        self.records.release();
        self.links.release();
        self.payload.release();
        tracing::debug!(
            released = stats.reserved_bytes,
            records = stats.record_bytes,
            "event queue disposed"
        );
    }
}

impl Drop for RawEventQueue {
    fn drop(&mut self) {
        if self.lifetime == Lifetime::Cycle && !self.is_empty() {
            tracing::warn!(
                records = self.records.len(),
                payload = self.payload.len(),
                "cycle-scoped event queue dropped without clear or dispose"
            );
        }
    }
}

/// Append handle for one shard id across all three buffers of a queue.
#[derive(Debug)]
pub struct RawWriter<'a> {
    records: ShardWriter<'a>,
    links: ShardWriter<'a>,
    payload: ShardWriter<'a>,
    element_size: usize,
}

impl RawWriter<'_> {
    /// Appends record bytes with no payload.
    ///
    /// # Errors
    ///
    /// Returns `Allocation` if the record shard cannot grow.
    #[inline]
    pub fn append_record(&mut self, record: &[u8]) -> ShardResult<()> {
        self.records.append(record)
    }

    /// Appends a record, its link, then its payload, all to this shard id.
    ///
    /// `length` is the element count of `payload`. The link's offset is the
    /// payload shard size before the payload is written.
    ///
    /// # Errors
    ///
    /// Returns `Allocation` if any shard cannot grow. Steps already taken
    /// stay in place.
    pub fn append_linked(&mut self, record: &[u8], payload: &[u8], length: usize) -> ShardResult<()> {
        debug_assert_eq!(payload.len(), length * self.element_size);
        self.records.append(record)?;
        let link = LinkRecord::new(self.records.shard_id(), self.payload.len(), length);
        self.links.append(bytemuck::bytes_of(&link))?;
        self.payload.append(payload)
    }

    /// Record bytes written to this shard so far.
    #[inline]
    #[must_use]
    pub fn record_bytes(&self) -> usize {
        self.records.len()
    }

    /// Payload bytes written to this shard so far.
    #[inline]
    #[must_use]
    pub fn payload_bytes(&self) -> usize {
        self.payload.len()
    }
}

impl ShardSlot for RawWriter<'_> {
    #[inline]
    fn shard_id(&self) -> usize {
        self.records.shard_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_SHARD_ID, MAX_SHARD_ID, MIN_SHARD_ID};

    fn queue(record_size: usize, element_size: usize) -> RawEventQueue {
        RawEventQueue::new(record_size, element_size, &QueueConfig::persistent()).unwrap()
    }

    #[test]
    fn test_counts_start_at_zero() {
        let q = queue(4, 2);
        assert_eq!(q.component_count(), 0);
        assert_eq!(q.links_count(), 0);
        assert_eq!(q.element_count(), 0);
        assert_eq!(q.shard_count(), MAX_SHARD_ID + 1);
    }

    #[test]
    fn test_linked_append() {
        let mut q = queue(4, 2);
        {
            let mut w = q.writer(5).unwrap();
            w.append_linked(&[1, 0, 0, 0], &[9, 9, 8, 8], 2).unwrap();
            w.append_linked(&[2, 0, 0, 0], &[7, 7], 1).unwrap();
        }
        assert_eq!(q.component_count(), 2);
        assert_eq!(q.links_count(), 2);
        assert_eq!(q.element_count(), 3);

        let links: Vec<LinkRecord> = q
            .shard_links(5)
            .unwrap()
            .chunks_exact(LinkRecord::SIZE)
            .map(bytemuck::pod_read_unaligned)
            .collect();
        assert_eq!(links[0], LinkRecord::new(5, 0, 2));
        assert_eq!(links[1], LinkRecord::new(5, 4, 1));
        assert_eq!(q.payload_for(&links[1]).unwrap(), &[7, 7]);
    }

    #[test]
    fn test_cached_count_is_stale() {
        let mut q = queue(1, 1);
        q.writer(DEFAULT_SHARD_ID).unwrap().append_record(&[1, 2, 3]).unwrap();
        assert_eq!(q.cached_count(), 0);
        assert_eq!(q.component_count(), 3);
        assert_eq!(q.cached_count(), 3);

        q.writer(DEFAULT_SHARD_ID).unwrap().append_record(&[4]).unwrap();
        assert_eq!(q.cached_count(), 3);
        assert_eq!(q.links_count(), 0);
        assert_eq!(q.cached_count(), 0);
    }

    #[test]
    fn test_zero_sized_axes_count_zero() {
        let mut q = queue(0, 0);
        {
            let mut w = q.writer(1).unwrap();
            w.append_linked(&[], &[], 5).unwrap();
            w.append_linked(&[], &[], 3).unwrap();
        }
        assert_eq!(q.component_count(), 0);
        assert_eq!(q.element_count(), 0);
        assert_eq!(q.links_count(), 2);
    }

    #[test]
    fn test_shard_accessor_ranges() {
        let q = queue(4, 4);
        for id in [MIN_SHARD_ID, DEFAULT_SHARD_ID, 64, MAX_SHARD_ID] {
            assert!(q.shard_records(id).unwrap().is_empty());
            assert!(q.shard_links(id).unwrap().is_empty());
            assert!(q.shard_payload(id).unwrap().is_empty());
        }
        for id in [MIN_SHARD_ID.wrapping_sub(1), MAX_SHARD_ID + 1] {
            assert!(matches!(q.shard_records(id), Err(ShardError::OutOfRange { .. })));
            assert!(matches!(q.shard_links(id), Err(ShardError::OutOfRange { .. })));
            assert!(matches!(q.shard_payload(id), Err(ShardError::OutOfRange { .. })));
        }
    }

    #[test]
    fn test_payload_for_rejects_bad_links() {
        let mut q = queue(1, 1);
        q.writer(2).unwrap().append_linked(&[0], &[1, 2], 2).unwrap();

        let past_end = LinkRecord::new(2, 1, 5);
        assert_eq!(
            q.payload_for(&past_end),
            Err(ShardError::LinkOutOfBounds { shard_id: 2, end: 6, available: 2 })
        );
        let bad_shard = LinkRecord::new(MAX_SHARD_ID + 1, 0, 0);
        assert!(matches!(q.payload_for(&bad_shard), Err(ShardError::OutOfRange { .. })));
    }

    #[test]
    fn test_clear_and_reuse() {
        let mut q = queue(2, 1);
        q.writer(3).unwrap().append_linked(&[1, 1], &[5; 32], 32).unwrap();
        let reserved = q.stats().reserved_bytes;

        q.clear();
        assert_eq!(q.component_count(), 0);
        assert_eq!(q.links_count(), 0);
        assert_eq!(q.element_count(), 0);
        assert_eq!(q.stats().reserved_bytes, reserved);

        q.writer(3).unwrap().append_linked(&[2, 2], &[6; 8], 8).unwrap();
        assert_eq!(q.component_count(), 1);
        assert_eq!(q.stats().reserved_bytes, reserved);
        q.dispose();
    }

    #[test]
    fn test_new_propagates_allocation_failure() {
        let config = QueueConfig::default().with_initial_shard_capacity(usize::MAX);
        assert!(matches!(
            RawEventQueue::new(4, 0, &config),
            Err(ShardError::Allocation { shard_id: 0, .. })
        ));
    }

    #[test]
    fn test_stats() {
        let mut q = queue(4, 1);
        q.writer(1).unwrap().append_linked(&[0; 4], &[1, 2, 3], 3).unwrap();
        q.writer(4).unwrap().append_record(&[0; 4]).unwrap();
        let stats = q.stats();
        assert_eq!(stats.record_bytes, 8);
        assert_eq!(stats.link_bytes, LinkRecord::SIZE);
        assert_eq!(stats.payload_bytes, 3);
        assert_eq!(stats.active_shards, 2);
    }
}

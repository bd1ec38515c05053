//! # Typed Event Queue
//!
//! Fixed-size records of one plain-data type.

use std::marker::PhantomData;
use std::ops::Deref;

use bytemuck::Pod;

use super::raw::{RawEventQueue, RawWriter};
use super::{pod_bytes, pod_decode};
use crate::buffer::ShardSlot;
use crate::config::QueueConfig;
use crate::error::{ShardError, ShardResult};

/// Queue of `T` records with no payload.
///
/// Read operations (counts, readers, per-shard bytes) come from the
/// underlying [`RawEventQueue`] through `Deref`.
///
/// # Example
///
/// ```rust,ignore
/// let mut queue: EventQueue<Hit> = EventQueue::new(&QueueConfig::default())?;
///
/// std::thread::scope(|s| {
///     for mut writer in queue.writers() {
///         s.spawn(move || writer.enqueue(Hit { target: 7, damage: 10 }));
///     }
/// });
///
/// for hit in queue.iter() {
///     apply(hit);
/// }
/// queue.clear();
/// ```
#[derive(Debug)]
pub struct EventQueue<T: Pod> {
    raw: RawEventQueue,
    _marker: PhantomData<T>,
}

impl<T: Pod> EventQueue<T> {
    /// Creates an empty queue.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` or `Allocation` from buffer creation.
    pub fn new(config: &QueueConfig) -> ShardResult<Self> {
        Ok(Self {
            raw: RawEventQueue::new(std::mem::size_of::<T>(), 0, config)?,
            _marker: PhantomData,
        })
    }

    /// Wraps raw storage whose records are `T`.
    ///
    /// # Errors
    ///
    /// Returns `LayoutMismatch` if the record size differs from `T`.
    pub fn from_raw(raw: RawEventQueue) -> ShardResult<Self> {
        let expected = std::mem::size_of::<T>();
        if raw.record_size() != expected {
            return Err(ShardError::LayoutMismatch {
                expected,
                actual: raw.record_size(),
            });
        }
        Ok(Self {
            raw,
            _marker: PhantomData,
        })
    }

    /// Borrows the size-erased storage.
    #[inline]
    #[must_use]
    pub fn as_raw(&self) -> &RawEventQueue {
        &self.raw
    }

    /// Unwraps the size-erased storage.
    #[must_use]
    pub fn into_raw(self) -> RawEventQueue {
        self.raw
    }

    /// Appends one record to shard `shard_id`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` for an invalid shard id, `Allocation` if the shard
    /// cannot grow.
    pub fn enqueue(&mut self, shard_id: usize, item: T) -> ShardResult<()> {
        self.raw.writer(shard_id)?.append_record(bytemuck::bytes_of(&item))
    }

    /// Appends `items` to shard `shard_id` in one contiguous copy.
    ///
    /// # Errors
    ///
    /// Same as [`enqueue`](Self::enqueue).
    pub fn enqueue_slice(&mut self, shard_id: usize, items: &[T]) -> ShardResult<()> {
        self.raw.writer(shard_id)?.append_record(pod_bytes(items))
    }

    /// Splits the queue into one writer per shard id, ascending.
    pub fn writers(&mut self) -> Vec<EventWriter<'_, T>> {
        self.raw
            .writers()
            .into_iter()
            .map(|raw| EventWriter {
                raw,
                _marker: PhantomData,
            })
            .collect()
    }

    /// Returns the writer for shard `id`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` for an invalid shard id.
    pub fn writer(&mut self, id: usize) -> ShardResult<EventWriter<'_, T>> {
        Ok(EventWriter {
            raw: self.raw.writer(id)?,
            _marker: PhantomData,
        })
    }

    /// Iterates all records in read order (ascending shard id, then append order).
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.raw
            .component_reader()
            .chunks()
            .flat_map(|(_, bytes)| pod_decode::<T>(bytes))
    }

    /// Records written to shard `id`, in append order.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` for an invalid shard id.
    pub fn records_in_shard(&self, id: usize) -> ShardResult<Vec<T>> {
        Ok(pod_decode(self.raw.shard_records(id)?).collect())
    }

    /// Copies the first `destination.len()` records into `destination`.
    ///
    /// # Errors
    ///
    /// Returns `ReadOverrun` if fewer records are stored.
    pub fn copy_to(&self, destination: &mut [T]) -> ShardResult<()> {
        if std::mem::size_of::<T>() == 0 {
            return Ok(());
        }
        let byte_length = std::mem::size_of_val(destination);
        self.raw
            .component_reader()
            .copy_to(bytemuck::cast_slice_mut(destination), byte_length)
    }

    /// Copies every record into a new vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Empties the queue, keeping capacity.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Releases all memory held by the queue.
    pub fn dispose(self) {
        self.raw.dispose();
    }
}

impl<T: Pod> Deref for EventQueue<T> {
    type Target = RawEventQueue;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Typed append handle for one shard id.
#[derive(Debug)]
pub struct EventWriter<'a, T: Pod> {
    raw: RawWriter<'a>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Pod> EventWriter<'_, T> {
    /// Appends one record.
    ///
    /// # Errors
    ///
    /// Returns `Allocation` if the shard cannot grow.
    #[inline]
    pub fn enqueue(&mut self, item: T) -> ShardResult<()> {
        self.raw.append_record(bytemuck::bytes_of(&item))
    }

    /// Appends `items` in one contiguous copy.
    ///
    /// # Errors
    ///
    /// Returns `Allocation` if the shard cannot grow.
    #[inline]
    pub fn enqueue_slice(&mut self, items: &[T]) -> ShardResult<()> {
        self.raw.append_record(pod_bytes(items))
    }

    /// Records written through this shard so far.
    #[must_use]
    pub fn len(&self) -> usize {
        match std::mem::size_of::<T>() {
            0 => 0,
            size => self.raw.record_bytes() / size,
        }
    }

    /// Returns true if the shard holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Pod> ShardSlot for EventWriter<'_, T> {
    #[inline]
    fn shard_id(&self) -> usize {
        self.raw.shard_id()
    }
}

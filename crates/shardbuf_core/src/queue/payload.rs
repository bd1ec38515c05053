//! # Payload Event Queue
//!
//! Fixed-size records, each paired with a variable-length slice of elements.
//!
//! Every enqueue writes three things to the same shard id, in order:
//!
//! 1. the record
//! 2. a [`LinkRecord`] whose offset is the payload shard size at that moment
//! 3. the payload elements
//!
//! Records and links therefore line up one-to-one in read order, and no
//! separate index is needed to pair them.

use std::marker::PhantomData;
use std::ops::Deref;

use bytemuck::{Pod, Zeroable};

use super::link::LinkRecord;
use super::raw::{RawEventQueue, RawWriter};
use super::{pod_bytes, pod_decode};
use crate::buffer::ShardSlot;
use crate::config::QueueConfig;
use crate::error::{ShardError, ShardResult};

/// Queue of `T` records carrying `E` payloads.
#[derive(Debug)]
pub struct PayloadEventQueue<T: Pod, E: Pod> {
    raw: RawEventQueue,
    _marker: PhantomData<(T, E)>,
}

impl<T: Pod, E: Pod> PayloadEventQueue<T, E> {
    /// Creates an empty queue.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` or `Allocation` from buffer creation.
    pub fn new(config: &QueueConfig) -> ShardResult<Self> {
        Ok(Self {
            raw: RawEventQueue::new(std::mem::size_of::<T>(), std::mem::size_of::<E>(), config)?,
            _marker: PhantomData,
        })
    }

    /// Wraps raw storage whose records are `T` and payload elements `E`.
    ///
    /// # Errors
    ///
    /// Returns `LayoutMismatch` if either size differs.
    pub fn from_raw(raw: RawEventQueue) -> ShardResult<Self> {
        let checks = [
            (std::mem::size_of::<T>(), raw.record_size()),
            (std::mem::size_of::<E>(), raw.element_size()),
        ];
        if let Some(&(expected, actual)) = checks.iter().find(|(e, a)| e != a) {
            return Err(ShardError::LayoutMismatch { expected, actual });
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

    /// Appends `component` and its `payload` to shard `shard_id`.
    ///
    /// Fixed arrays and externally owned vectors coerce to the slice.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` for an invalid shard id, `Allocation` if a shard
    /// cannot grow.
    pub fn enqueue(&mut self, shard_id: usize, component: T, payload: &[E]) -> ShardResult<()> {
        self.writer(shard_id)?.enqueue(component, payload)
    }

    /// Splits the queue into one writer per shard id, ascending.
    pub fn writers(&mut self) -> Vec<PayloadWriter<'_, T, E>> {
        self.raw
            .writers()
            .into_iter()
            .map(|raw| PayloadWriter {
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
    pub fn writer(&mut self, id: usize) -> ShardResult<PayloadWriter<'_, T, E>> {
        Ok(PayloadWriter {
            raw: self.raw.writer(id)?,
            _marker: PhantomData,
        })
    }

    /// Iterates link records in read order.
    pub fn links(&self) -> impl Iterator<Item = LinkRecord> + '_ {
        self.raw
            .links_reader()
            .chunks()
            .flat_map(|(_, bytes)| pod_decode::<LinkRecord>(bytes))
    }

    /// Iterates `(record, link)` pairs in read order.
    ///
    /// Zero-sized records occupy no bytes, so every link is paired with
    /// `T::zeroed()` instead.
    pub fn iter(&self) -> impl Iterator<Item = (T, LinkRecord)> + '_ {
        let zero_sized = std::mem::size_of::<T>() == 0;
        self.raw
            .component_reader()
            .chunks()
            .flat_map(|(_, bytes)| pod_decode::<T>(bytes))
            .chain(std::iter::repeat(<T as Zeroable>::zeroed()).take_while(move |_| zero_sized))
            .zip(self.links())
    }

    /// Decodes the payload elements a link points at.
    ///
    /// Zero-sized element types decode to an empty vector.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if the link names an invalid shard
    /// - `LinkOutOfBounds` if the range runs past the end of the shard
    pub fn payload(&self, link: &LinkRecord) -> ShardResult<Vec<E>> {
        Ok(pod_decode(self.raw.payload_for(link)?).collect())
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

impl<T: Pod, E: Pod> Deref for PayloadEventQueue<T, E> {
    type Target = RawEventQueue;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Typed append handle for one shard id of a payload queue.
#[derive(Debug)]
pub struct PayloadWriter<'a, T: Pod, E: Pod> {
    raw: RawWriter<'a>,
    _marker: PhantomData<fn() -> (T, E)>,
}

impl<T: Pod, E: Pod> PayloadWriter<'_, T, E> {
    /// Appends the record, its link, then its payload.
    ///
    /// # Errors
    ///
    /// Returns `Allocation` if a shard cannot grow.
    pub fn enqueue(&mut self, component: T, payload: &[E]) -> ShardResult<()> {
        self.raw
            .append_linked(bytemuck::bytes_of(&component), pod_bytes(payload), payload.len())
    }

    /// Payload elements written through this shard so far.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        match std::mem::size_of::<E>() {
            0 => 0,
            size => self.raw.payload_bytes() / size,
        }
    }
}

impl<T: Pod, E: Pod> ShardSlot for PayloadWriter<'_, T, E> {
    #[inline]
    fn shard_id(&self) -> usize {
        self.raw.shard_id()
    }
}

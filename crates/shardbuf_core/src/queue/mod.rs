//! # Event Queues
//!
//! Records appended in parallel by worker slots, read back by one consumer.
//!
//! ## Lifecycle
//!
//! ```text
//!   create ──► write phase ──► join ──► read phase ──► clear ──┐
//!                  ▲                                           │
//!                  └───────────────────────────────────────────┘
//!                                              └──► dispose
//! ```
//!
//! - [`RawEventQueue`]: size-erased physical storage
//! - [`EventQueue<T>`]: typed records
//! - [`PayloadEventQueue<T, E>`]: typed records, each with a slice of `E`

mod link;
mod payload;
mod raw;
mod typed;

pub use link::LinkRecord;
pub use payload::{PayloadEventQueue, PayloadWriter};
pub use raw::{QueueStats, RawEventQueue, RawWriter};
pub use typed::{EventQueue, EventWriter};

use bytemuck::Pod;

/// Views a slice of plain data as bytes. Zero-sized types view as empty.
#[inline]
pub(crate) fn pod_bytes<T: Pod>(items: &[T]) -> &[u8] {
    if std::mem::size_of::<T>() == 0 {
        &[]
    } else {
        bytemuck::cast_slice(items)
    }
}

/// Decodes consecutive `T` values from unaligned bytes.
///
/// Yields nothing for zero-sized types.
#[inline]
pub(crate) fn pod_decode<T: Pod>(bytes: &[u8]) -> impl Iterator<Item = T> + '_ {
    let size = std::mem::size_of::<T>();
    let bytes = if size == 0 { &[][..] } else { bytes };
    bytes
        .chunks_exact(size.max(1))
        .map(bytemuck::pod_read_unaligned::<T>)
}

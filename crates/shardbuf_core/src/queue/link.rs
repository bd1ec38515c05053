//! # Link Records
//!
//! Ties a fixed-size record to its variable-length payload range.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};

/// Location of a record's payload: `length` elements starting at byte
/// `offset` of payload shard `shard_id`.
///
/// Links are written in the same shard, in the same order, as the records
/// they belong to, so the i-th record of the read stream pairs with the
/// i-th link.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct LinkRecord {
    /// Byte offset into the payload shard.
    pub offset: u64,
    /// Number of payload elements.
    pub length: u64,
    /// Payload shard id (same as the record's shard).
    pub shard_id: u32,
    /// Padding, always zero.
    pub _reserved: u32,
}

impl LinkRecord {
    /// Size of one link in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Creates a link.
    #[inline]
    #[must_use]
    pub const fn new(shard_id: usize, offset: usize, length: usize) -> Self {
        Self {
            offset: offset as u64,
            length: length as u64,
            // Shard ids never exceed MAX_WORKER_COUNT.
            shard_id: shard_id as u32,
            _reserved: 0,
        }
    }

    /// Payload shard id as an index.
    #[inline]
    #[must_use]
    pub const fn shard(&self) -> usize {
        self.shard_id as usize
    }

    /// Byte range of the payload for elements of `element_size` bytes.
    ///
    /// Saturates instead of overflowing, so a corrupt link yields a range
    /// that fails any bounds check.
    #[must_use]
    pub fn byte_range(&self, element_size: usize) -> Range<usize> {
        let start = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let len = usize::try_from(self.length)
            .unwrap_or(usize::MAX)
            .saturating_mul(element_size);
        start..start.saturating_add(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        assert_eq!(LinkRecord::SIZE, 24);
        assert_eq!(std::mem::align_of::<LinkRecord>(), 8);
    }

    #[test]
    fn test_byte_range() {
        let link = LinkRecord::new(3, 16, 4);
        assert_eq!(link.shard(), 3);
        assert_eq!(link.byte_range(8), 16..48);
        assert_eq!(link.byte_range(0), 16..16);
    }

    #[test]
    fn test_largest_shard_id_round_trips() {
        let link = LinkRecord::new(crate::config::MAX_SHARD_ID, 0, 1);
        assert_eq!(link.shard(), crate::config::MAX_SHARD_ID);
    }

    #[test]
    fn test_byte_range_saturates() {
        let link = LinkRecord {
            offset: u64::MAX,
            length: u64::MAX,
            shard_id: 0,
            _reserved: 0,
        };
        let range = link.byte_range(4);
        assert_eq!(range.end, usize::MAX);
    }
}

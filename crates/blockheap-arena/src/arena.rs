//! The fixed-size byte region backing every block.
//!
//! [`Arena`] owns exactly `capacity` bytes for its whole lifetime. It never
//! grows, never shrinks, and knows nothing about blocks; the
//! [`BlockDirectory`](crate::directory::BlockDirectory) decides which byte
//! ranges belong to which payload.

use std::ops::Range;

use crate::error::HeapError;

/// Contiguous, zero-initialised storage for all payloads.
pub struct Arena {
    /// Backing storage. Allocated to full capacity at creation.
    data: Vec<u8>,
}

impl Arena {
    /// Acquire a region of exactly `capacity` bytes.
    ///
    /// Returns `Err(HeapError::RegionUnavailable)` if the system allocator
    /// refuses the reservation, instead of aborting the process.
    pub fn acquire(capacity: usize) -> Result<Self, HeapError> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|e| HeapError::RegionUnavailable {
                capacity,
                reason: e.to_string(),
            })?;
        data.resize(capacity, 0);
        Ok(Self { data })
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Whether `offset` lies inside `[0, capacity)`.
    pub fn contains(&self, offset: usize) -> bool {
        offset < self.data.len()
    }

    /// Shared view of a byte range.
    ///
    /// Returns `None` if the range does not fit inside the arena.
    pub fn bytes(&self, range: Range<usize>) -> Option<&[u8]> {
        self.data.get(range)
    }

    /// Mutable view of a byte range.
    ///
    /// Returns `None` if the range does not fit inside the arena.
    pub fn bytes_mut(&mut self, range: Range<usize>) -> Option<&mut [u8]> {
        self.data.get_mut(range)
    }

    /// Zero a byte range. Out-of-range portions are ignored.
    pub fn zero(&mut self, range: Range<usize>) {
        let end = range.end.min(self.data.len());
        if range.start < end {
            self.data[range.start..end].fill(0);
        }
    }

    /// Zero the whole arena.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }
}

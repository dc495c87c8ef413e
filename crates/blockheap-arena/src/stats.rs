//! Cumulative heap counters.
//!
//! [`HeapStats`] records the outcome of every public operation since the
//! heap was created (or last [`reset`](crate::Heap::reset)). The allocator
//! also emits each allocation as a `tracing` event; these counters are the
//! aggregate view of the same data.

/// Counters collected across the lifetime of a heap.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Successful allocations.
    pub allocations: u64,
    /// Successful frees.
    pub frees: u64,
    /// `allocate(0)` calls (answered with no allocation).
    pub zero_size_requests: u64,
    /// Requests rejected as larger than the whole heap.
    pub oversize_requests: u64,
    /// Requests rejected because no free block was large enough.
    pub exhausted_requests: u64,
    /// Frees rejected as out of bounds or not a block start.
    pub invalid_frees: u64,
    /// Frees rejected because the block was already free.
    pub double_frees: u64,
    /// Blocks created by splitting.
    pub splits: u64,
    /// Blocks absorbed by coalescing.
    pub merges: u64,
    /// Total payload bytes granted across all allocations.
    pub bytes_allocated: u64,
    /// Total surplus bytes granted because a block could not be split.
    pub internal_fragmentation_bytes: u64,
}

impl HeapStats {
    /// Requests that ended in an error.
    pub fn failed_allocations(&self) -> u64 {
        self.oversize_requests + self.exhausted_requests
    }

    /// Frees that ended in an error.
    pub fn rejected_frees(&self) -> u64 {
        self.invalid_frees + self.double_frees
    }
}

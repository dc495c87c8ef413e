//! Heap configuration parameters.

use crate::error::HeapError;

/// How the coalescer restores the "no adjacent free blocks" invariant
/// after a block is freed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CoalescePolicy {
    /// Rescan the whole directory left to right, merging every adjacent
    /// free pair. O(block count) per free.
    #[default]
    FullScan,
    /// Merge only the freed block with its immediate free neighbours.
    ///
    /// Produces the same directory as [`FullScan`](Self::FullScan) because
    /// the invariant already holds everywhere else before the free.
    Neighbors,
}

/// Configuration for a [`Heap`](crate::Heap).
///
/// Validated at construction; all values are immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeapConfig {
    /// Total size of the arena in bytes.
    ///
    /// Default: 1024. Must be strictly greater than `descriptor_size` so
    /// that the initial block has a non-empty payload.
    pub capacity: usize,

    /// Bytes of arena space reserved in front of every payload for the
    /// block header.
    ///
    /// Default: 24 (a `size`, a flag and a link on a 64-bit target).
    /// Must be non-zero.
    pub descriptor_size: usize,

    /// Minimum payload a split-off free block must have.
    ///
    /// Default: 0. A block is split only when the leftover after the
    /// request is at least `descriptor_size + min_split_payload`; smaller
    /// leftovers are handed to the caller as internal fragmentation.
    /// With the default a leftover of exactly one descriptor becomes a
    /// zero-payload free block. Must not exceed `capacity`.
    pub min_split_payload: usize,

    /// Coalescing strategy used after every successful free.
    pub coalesce: CoalescePolicy,
}

impl HeapConfig {
    /// Default arena size in bytes.
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Default per-block header footprint in bytes.
    pub const DEFAULT_DESCRIPTOR_SIZE: usize = 24;

    /// Default minimum payload for a split-off block.
    pub const DEFAULT_MIN_SPLIT_PAYLOAD: usize = 0;

    /// Create a config for an arena of `capacity` bytes.
    ///
    /// Uses default values for all other parameters.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            descriptor_size: Self::DEFAULT_DESCRIPTOR_SIZE,
            min_split_payload: Self::DEFAULT_MIN_SPLIT_PAYLOAD,
            coalesce: CoalescePolicy::default(),
        }
    }

    /// Set the per-block header footprint.
    pub fn with_descriptor_size(mut self, descriptor_size: usize) -> Self {
        self.descriptor_size = descriptor_size;
        self
    }

    /// Set the minimum payload of a split-off block.
    pub fn with_min_split_payload(mut self, min_split_payload: usize) -> Self {
        self.min_split_payload = min_split_payload;
        self
    }

    /// Set the coalescing strategy.
    pub fn with_coalesce(mut self, coalesce: CoalescePolicy) -> Self {
        self.coalesce = coalesce;
        self
    }

    /// Largest request that could ever be satisfied: the payload of the
    /// single block that spans an empty arena.
    pub fn max_request(&self) -> usize {
        self.capacity.saturating_sub(self.descriptor_size)
    }

    /// Check structural invariants.
    ///
    /// Returns `Err(HeapError::InvalidConfig)` if the arena cannot host a
    /// single block with a non-empty payload, or if `min_split_payload`
    /// is larger than the arena.
    pub fn validate(&self) -> Result<(), HeapError> {
        if self.descriptor_size == 0 {
            return Err(HeapError::InvalidConfig {
                reason: "descriptor_size must be non-zero".to_string(),
            });
        }
        if self.capacity <= self.descriptor_size {
            return Err(HeapError::InvalidConfig {
                reason: format!(
                    "capacity ({}) must exceed descriptor_size ({})",
                    self.capacity, self.descriptor_size
                ),
            });
        }
        if self.min_split_payload > self.capacity {
            return Err(HeapError::InvalidConfig {
                reason: format!(
                    "min_split_payload ({}) must not exceed capacity ({})",
                    self.min_split_payload, self.capacity
                ),
            });
        }
        Ok(())
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

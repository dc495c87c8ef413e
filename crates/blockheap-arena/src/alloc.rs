//! First-fit allocation with block splitting.
//!
//! The allocator scans the directory in address order and takes the first
//! free block whose payload can hold the request. If the leftover after
//! the request can host a descriptor plus `min_split_payload` bytes, the
//! block is split and the tail returns to the free chain. Otherwise the
//! caller receives the whole block and the surplus is reported as internal
//! fragmentation.

use tracing::{debug, trace, warn};

use crate::descriptor::{BlockDescriptor, BlockState};
use crate::directory::BlockDirectory;
use crate::error::HeapError;
use crate::handle::{Addr, Allocation};
use crate::heap::Heap;

/// The first free block, in address order, with a payload of at least
/// `size` bytes.
pub fn first_fit(directory: &BlockDirectory, size: usize) -> Option<BlockDescriptor> {
    directory
        .iter()
        .find(|block| block.is_free() && block.size >= size)
        .copied()
}

/// Payload size of the free tail a split would create, or `None` if the
/// leftover is too small to be worth a block of its own.
pub fn split_remainder(
    block_size: usize,
    size: usize,
    descriptor_size: usize,
    min_split_payload: usize,
) -> Option<usize> {
    let leftover = block_size.checked_sub(size)?;
    if leftover >= descriptor_size.saturating_add(min_split_payload) {
        Some(leftover - descriptor_size)
    } else {
        None
    }
}

impl Heap {
    /// Allocate at least `size` payload bytes.
    ///
    /// Returns `Ok(None)` for `size == 0`. The granted payload is
    /// zero-filled.
    ///
    /// # Errors
    ///
    /// `HeapError::OversizeRequest` if `size` exceeds the payload of an
    /// empty heap; `HeapError::ExhaustedPool` if no free block is large
    /// enough. The directory is unchanged on error.
    pub fn allocate(&mut self, size: usize) -> Result<Option<Allocation>, HeapError> {
        if size == 0 {
            self.stats.zero_size_requests += 1;
            return Ok(None);
        }

        let max = self.config.max_request();
        if size > max {
            self.stats.oversize_requests += 1;
            warn!(requested = size, max, "requested allocation exceeds available heap size");
            return Err(HeapError::OversizeRequest {
                requested: size,
                max,
            });
        }

        let Some(block) = first_fit(&self.directory, size) else {
            let largest_free = self.directory.largest_free();
            self.stats.exhausted_requests += 1;
            warn!(requested = size, largest_free, "no free block large enough");
            return Err(HeapError::ExhaustedPool {
                requested: size,
                largest_free,
            });
        };

        let ds = self.config.descriptor_size;
        // The granted length follows the directory: without a tail block
        // the caller owns the whole payload.
        let split = split_remainder(block.size, size, ds, self.config.min_split_payload)
            .and_then(|remainder| Some((self.directory.split(block.offset, size)?, remainder)));
        let granted = match split {
            Some((tail, remainder)) => {
                trace!(offset = block.offset, tail, remainder, "split free block");
                self.stats.splits += 1;
                size
            }
            None => block.size,
        };
        self.directory
            .set_state(block.offset, BlockState::Allocated { requested: size });

        let start = block.payload_start(ds);
        self.arena.zero(start..start + granted);

        let allocation = Allocation::new(Addr(start), granted, size);
        self.stats.allocations += 1;
        self.stats.bytes_allocated += granted as u64;
        self.stats.internal_fragmentation_bytes += allocation.fragmentation() as u64;
        debug!(
            addr = start,
            requested = size,
            granted,
            fragmentation = allocation.fragmentation(),
            "memory allocated"
        );
        Ok(Some(allocation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeapConfig;

    fn layout(heap: &Heap) -> Vec<(usize, bool)> {
        heap.directory()
            .iter()
            .map(|b| (b.size, b.is_free()))
            .collect()
    }

    #[test]
    fn zero_size_is_none_not_error() {
        let mut heap = Heap::with_capacity(1024).unwrap();
        assert_eq!(heap.allocate(0), Ok(None));
        assert_eq!(heap.block_count(), 1);
        assert_eq!(heap.stats().zero_size_requests, 1);
    }

    #[test]
    fn oversize_request_is_rejected() {
        let mut heap = Heap::with_capacity(1024).unwrap();
        assert_eq!(
            heap.allocate(1001),
            Err(HeapError::OversizeRequest {
                requested: 1001,
                max: 1000
            })
        );
        assert_eq!(layout(&heap), vec![(1000, true)]);
        assert_eq!(heap.stats().oversize_requests, 1);
    }

    #[test]
    fn whole_heap_request_succeeds_without_split() {
        let mut heap = Heap::with_capacity(1024).unwrap();
        let a = heap.allocate(1000).unwrap().unwrap();
        assert_eq!(a.addr(), Addr(24));
        assert_eq!(a.len(), 1000);
        assert_eq!(a.fragmentation(), 0);
        assert_eq!(layout(&heap), vec![(1000, false)]);
    }

    #[test]
    fn first_allocation_splits_spanning_block() {
        let mut heap = Heap::with_capacity(1024).unwrap();
        let a = heap.allocate(200).unwrap().unwrap();
        assert_eq!(a.addr(), Addr(24));
        assert_eq!(a.len(), 200);
        assert_eq!(layout(&heap), vec![(200, false), (776, true)]);
        assert_eq!(heap.stats().splits, 1);
    }

    #[test]
    fn sequential_allocations_are_address_ordered() {
        let mut heap = Heap::with_capacity(1024).unwrap();
        let a = heap.allocate(200).unwrap().unwrap();
        let b = heap.allocate(150).unwrap().unwrap();
        let c = heap.allocate(100).unwrap().unwrap();
        assert_eq!(a.addr(), Addr(24));
        assert_eq!(b.addr(), Addr(248));
        assert_eq!(c.addr(), Addr(422));
        assert_eq!(
            layout(&heap),
            vec![(200, false), (150, false), (100, false), (478, true)]
        );
    }

    #[test]
    fn small_leftover_becomes_internal_fragmentation() {
        let mut heap = Heap::with_capacity(1024).unwrap();
        // Leftover of 990 is 10 bytes: too small for a 24-byte descriptor.
        let a = heap.allocate(990).unwrap().unwrap();
        assert_eq!(a.len(), 1000);
        assert_eq!(a.requested(), 990);
        assert_eq!(a.fragmentation(), 10);
        assert_eq!(heap.block_count(), 1);
        assert_eq!(heap.stats().internal_fragmentation_bytes, 10);
    }

    #[test]
    fn leftover_of_exactly_descriptor_size_is_split_by_default() {
        let mut heap = Heap::with_capacity(1024).unwrap();
        let a = heap.allocate(976).unwrap().unwrap();
        assert_eq!(a.len(), 976);
        assert_eq!(a.fragmentation(), 0);
        assert_eq!(layout(&heap), vec![(976, false), (0, true)]);
    }

    #[test]
    fn min_split_payload_keeps_empty_tail_with_caller() {
        let config = HeapConfig::new(1024).with_min_split_payload(1);
        let mut heap = Heap::new(config).unwrap();
        let a = heap.allocate(976).unwrap().unwrap();
        assert_eq!(a.len(), 1000);
        assert_eq!(a.fragmentation(), 24);
        assert_eq!(layout(&heap), vec![(1000, false)]);
    }

    #[test]
    fn huge_min_split_payload_never_splits() {
        assert_eq!(split_remainder(1000, 10, 24, usize::MAX), None);

        // Bypass validation to exercise the allocator directly.
        let mut heap = Heap::with_capacity(1024).unwrap();
        heap.config.min_split_payload = usize::MAX;
        let a = heap.allocate(10).unwrap().unwrap();
        assert_eq!(a.len(), 1000);
        assert_eq!(heap.block_count(), 1);
    }

    #[test]
    fn granted_length_matches_directory_block() {
        let mut heap = Heap::with_capacity(1024).unwrap();
        for size in [200, 150, 1, 600, 1] {
            let Ok(Some(a)) = heap.allocate(size) else {
                continue;
            };
            let block = heap.directory().get(a.addr().0 - 24).unwrap();
            assert_eq!(block.size, a.len());
            assert_eq!(
                heap.stats().bytes_allocated,
                heap.summary().used_bytes as u64
            );
        }
    }

    #[test]
    fn exhausted_pool_reports_largest_free() {
        let mut heap = Heap::with_capacity(1024).unwrap();
        let _a = heap.allocate(900).unwrap().unwrap();
        let before = layout(&heap);
        assert_eq!(
            heap.allocate(100),
            Err(HeapError::ExhaustedPool {
                requested: 100,
                largest_free: 76
            })
        );
        assert_eq!(layout(&heap), before);
        assert_eq!(heap.stats().exhausted_requests, 1);
    }

    #[test]
    fn exhausted_when_everything_allocated() {
        let mut heap = Heap::with_capacity(1024).unwrap();
        let _a = heap.allocate(1000).unwrap().unwrap();
        assert_eq!(
            heap.allocate(1),
            Err(HeapError::ExhaustedPool {
                requested: 1,
                largest_free: 0
            })
        );
    }

    #[test]
    fn granted_payload_is_zeroed() {
        let mut heap = Heap::with_capacity(256).unwrap();
        let a = heap.allocate(64).unwrap().unwrap();
        heap.payload_mut(a.addr()).unwrap().fill(0xEE);
        heap.free(a.addr()).unwrap();
        let b = heap.allocate(64).unwrap().unwrap();
        assert_eq!(b.addr(), a.addr());
        assert!(heap.payload(b.addr()).unwrap().iter().all(|&v| v == 0));
    }

    #[test]
    fn split_remainder_thresholds() {
        assert_eq!(split_remainder(1000, 200, 24, 1), Some(776));
        assert_eq!(split_remainder(1000, 976, 24, 1), None);
        assert_eq!(split_remainder(1000, 976, 24, 0), Some(0));
        assert_eq!(split_remainder(1000, 975, 24, 1), Some(1));
        assert_eq!(split_remainder(100, 200, 24, 1), None);
    }

    #[test]
    fn first_fit_skips_small_and_allocated_blocks() {
        let mut heap = Heap::with_capacity(1024).unwrap();
        let a = heap.allocate(50).unwrap().unwrap();
        let _b = heap.allocate(50).unwrap().unwrap();
        heap.free(a.addr()).unwrap();
        // Block 0 is free but holds only 50 bytes.
        let fit = first_fit(heap.directory(), 60).unwrap();
        assert_eq!(fit.offset, 148);
        let fit = first_fit(heap.directory(), 50).unwrap();
        assert_eq!(fit.offset, 0);
    }
}

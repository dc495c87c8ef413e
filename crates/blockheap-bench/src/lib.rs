//! Workload profiles for benchmarking the block heap.
//!
//! Provides deterministic, seeded operation scripts:
//!
//! - [`churn_profile`]: random mix of allocations and frees
//! - [`fragmentation_profile`]: fill the heap, punch holes, then request
//!   sizes that only fit after coalescing
//! - [`filled_heap`]: a heap carved into `n` equal allocations

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use blockheap_arena::{Addr, Allocation, Heap, HeapConfig, HeapError};
use blockheap_test_utils::HeapOp;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// `len` random operations: roughly 60% allocations of 1..=`max_size`
/// bytes, the rest frees of a random live allocation.
pub fn churn_profile(seed: u64, len: usize, max_size: usize) -> Vec<HeapOp> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len)
        .map(|_| {
            if rng.random_bool(0.6) {
                HeapOp::Alloc(rng.random_range(1..=max_size))
            } else {
                HeapOp::Free(rng.random_range(0..usize::MAX))
            }
        })
        .collect()
}

/// Allocate `blocks` blocks of `size` bytes, free the even-indexed ones,
/// request blocks twice as large (which only fit in leftover tail space),
/// then free the odd-indexed ones and request the large blocks again,
/// now served from the coalesced front of the heap.
///
/// Addresses are computed for a fresh heap with the given descriptor size.
pub fn fragmentation_profile(blocks: usize, size: usize, descriptor_size: usize) -> Vec<HeapOp> {
    let addr = |i: usize| HeapOp::FreeAddr(Addr(descriptor_size + i * (descriptor_size + size)));
    let mut ops: Vec<_> = (0..blocks).map(|_| HeapOp::Alloc(size)).collect();
    ops.extend((0..blocks).step_by(2).map(addr));
    ops.extend((0..blocks / 4).map(|_| HeapOp::Alloc(size * 2)));
    ops.extend((1..blocks).step_by(2).map(addr));
    ops.extend((0..blocks / 4).map(|_| HeapOp::Alloc(size * 2)));
    ops
}

/// A heap of `capacity` bytes carved into `n` allocations of `size` bytes.
pub fn filled_heap(
    config: HeapConfig,
    n: usize,
    size: usize,
) -> Result<(Heap, Vec<Allocation>), HeapError> {
    let mut heap = Heap::new(config)?;
    let mut live = Vec::with_capacity(n);
    for _ in 0..n {
        match heap.allocate(size)? {
            Some(allocation) => live.push(allocation),
            None => break,
        }
    }
    Ok((heap, live))
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockheap_test_utils::{OpOutcome, ScriptRunner};

    #[test]
    fn churn_profile_deterministic() {
        assert_eq!(churn_profile(42, 100, 64), churn_profile(42, 100, 64));
        assert_ne!(churn_profile(42, 100, 64), churn_profile(43, 100, 64));
    }

    #[test]
    fn churn_profile_keeps_invariants() {
        let mut runner = ScriptRunner::new(HeapConfig::new(16 * 1024)).unwrap();
        runner.run(&churn_profile(7, 500, 256));
        assert!(runner.verify_payloads());
    }

    #[test]
    fn fragmentation_profile_needs_coalescing() {
        // Exactly 64 blocks of 100 bytes: no tail space is left over.
        let capacity = 64 * (24 + 100);
        let mut runner = ScriptRunner::new(HeapConfig::new(capacity)).unwrap();
        let outcomes = runner.run(&fragmentation_profile(64, 100, 24));
        let allocated = outcomes
            .iter()
            .filter(|o| matches!(o, OpOutcome::Allocated(_)))
            .count();
        let exhausted = outcomes
            .iter()
            .filter(|o| matches!(o, OpOutcome::Rejected(HeapError::ExhaustedPool { .. })))
            .count();
        assert_eq!(allocated, 64 + 16);
        assert_eq!(exhausted, 16);
        assert!(runner.verify_payloads());
    }

    #[test]
    fn filled_heap_stops_cleanly() {
        let (heap, live) = filled_heap(HeapConfig::new(4096), 16, 100).unwrap();
        assert_eq!(live.len(), 16);
        assert_eq!(heap.stats().allocations, 16);
    }
}

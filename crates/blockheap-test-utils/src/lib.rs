//! Test utilities for blockheap development.
//!
//! Provides a full structural invariant checker ([`check_invariants`]),
//! payload fill patterns for overlap detection, and a [`ScriptRunner`]
//! that drives a heap through a sequence of [`HeapOp`]s while tracking
//! which allocations are live.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::fmt;

use blockheap_arena::{Addr, Allocation, Heap, HeapConfig, HeapError};

/// A broken structural invariant, as found by [`check_invariants`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The directory has no blocks at all.
    EmptyDirectory,
    /// A block does not start where the previous one ended.
    Gap { expected: usize, found: usize },
    /// A block's `next` link disagrees with where the next block starts.
    BrokenLink {
        offset: usize,
        link: Option<usize>,
        actual: Option<usize>,
    },
    /// Two address-adjacent blocks are both free.
    AdjacentFree { first: usize, second: usize },
    /// An allocated block is smaller than its request.
    Undersized {
        offset: usize,
        size: usize,
        requested: usize,
    },
    /// Descriptor plus payload bytes do not add up to the capacity.
    Accounting { total: usize, capacity: usize },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDirectory => write!(f, "directory is empty"),
            Self::Gap { expected, found } => {
                write!(f, "block at {found}, expected one at {expected}")
            }
            Self::BrokenLink {
                offset,
                link,
                actual,
            } => write!(
                f,
                "block at {offset} links to {link:?}, next block is {actual:?}"
            ),
            Self::AdjacentFree { first, second } => {
                write!(f, "blocks at {first} and {second} are both free")
            }
            Self::Undersized {
                offset,
                size,
                requested,
            } => write!(
                f,
                "block at {offset} holds {size} bytes but {requested} were requested"
            ),
            Self::Accounting { total, capacity } => {
                write!(f, "blocks span {total} bytes, capacity is {capacity}")
            }
        }
    }
}

/// Check every structural invariant of the heap's directory.
pub fn check_invariants(heap: &Heap) -> Result<(), InvariantViolation> {
    let ds = heap.descriptor_size();
    let layout = heap.dump();
    let blocks = layout.blocks();
    if blocks.is_empty() {
        return Err(InvariantViolation::EmptyDirectory);
    }

    let mut expected = 0;
    for (i, block) in blocks.iter().enumerate() {
        if block.offset != expected {
            return Err(InvariantViolation::Gap {
                expected,
                found: block.offset,
            });
        }
        let actual = blocks.get(i + 1).map(|b| b.offset);
        if block.next != actual {
            return Err(InvariantViolation::BrokenLink {
                offset: block.offset,
                link: block.next,
                actual,
            });
        }
        if let Some(next) = blocks.get(i + 1) {
            if block.free && next.free {
                return Err(InvariantViolation::AdjacentFree {
                    first: block.offset,
                    second: next.offset,
                });
            }
        }
        if let Some(requested) = block.requested {
            if block.size < requested {
                return Err(InvariantViolation::Undersized {
                    offset: block.offset,
                    size: block.size,
                    requested,
                });
            }
        }
        expected = block.offset + ds + block.size;
    }

    let total = layout.total_span(ds);
    if total != heap.capacity() {
        return Err(InvariantViolation::Accounting {
            total,
            capacity: heap.capacity(),
        });
    }
    Ok(())
}

/// Panic with a readable message if any invariant is broken.
#[track_caller]
pub fn assert_invariants(heap: &Heap) {
    if let Err(violation) = check_invariants(heap) {
        panic!("heap invariant violated: {violation}\nlayout: {}", heap.dump());
    }
}

/// Fill an allocation's whole payload with `byte`.
pub fn fill_payload(heap: &mut Heap, allocation: &Allocation, byte: u8) {
    if let Some(bytes) = heap.payload_mut(allocation.addr()) {
        bytes.fill(byte);
    }
}

/// Whether an allocation's payload still holds only `byte`.
pub fn payload_is(heap: &Heap, allocation: &Allocation, byte: u8) -> bool {
    heap.payload(allocation.addr())
        .is_some_and(|bytes| bytes.iter().all(|&b| b == byte))
}

/// One step of a heap script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeapOp {
    /// Allocate this many bytes.
    Alloc(usize),
    /// Free the live allocation at `index % live_count`. Skipped when
    /// nothing is live.
    Free(usize),
    /// Free an arbitrary address, live or not.
    FreeAddr(Addr),
    /// Run an explicit coalescing pass.
    Coalesce,
}

/// What a [`HeapOp`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpOutcome {
    /// A new allocation was made.
    Allocated(Allocation),
    /// `allocate(0)` returned nothing.
    Nothing,
    /// A live allocation was released.
    Freed(Addr),
    /// The step was skipped (free with nothing live).
    Skipped,
    /// An explicit coalesce performed this many merges.
    Coalesced(usize),
    /// The heap rejected the step.
    Rejected(HeapError),
}

/// Drives a [`Heap`] through [`HeapOp`]s and tracks live allocations.
///
/// Each live allocation's payload is filled with a byte derived from its
/// sequence number, so that any overlap between two live allocations is
/// caught by [`verify_payloads`](Self::verify_payloads).
pub struct ScriptRunner {
    heap: Heap,
    live: Vec<(Allocation, u8)>,
    next_tag: u8,
}

impl ScriptRunner {
    pub fn new(config: HeapConfig) -> Result<Self, HeapError> {
        Ok(Self {
            heap: Heap::new(config)?,
            live: Vec::new(),
            next_tag: 1,
        })
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn live(&self) -> impl Iterator<Item = &Allocation> {
        self.live.iter().map(|(a, _)| a)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Apply one step.
    pub fn apply(&mut self, op: HeapOp) -> OpOutcome {
        match op {
            HeapOp::Alloc(size) => match self.heap.allocate(size) {
                Ok(Some(allocation)) => {
                    let tag = self.next_tag;
                    self.next_tag = self.next_tag.wrapping_add(1).max(1);
                    fill_payload(&mut self.heap, &allocation, tag);
                    self.live.push((allocation, tag));
                    OpOutcome::Allocated(allocation)
                }
                Ok(None) => OpOutcome::Nothing,
                Err(e) => OpOutcome::Rejected(e),
            },
            HeapOp::Free(index) => {
                if self.live.is_empty() {
                    return OpOutcome::Skipped;
                }
                let (allocation, _) = self.live.swap_remove(index % self.live.len());
                match self.heap.free(allocation.addr()) {
                    Ok(()) => OpOutcome::Freed(allocation.addr()),
                    Err(e) => OpOutcome::Rejected(e),
                }
            }
            HeapOp::FreeAddr(addr) => match self.heap.free(addr) {
                Ok(()) => {
                    self.live.retain(|(a, _)| a.addr() != addr);
                    OpOutcome::Freed(addr)
                }
                Err(e) => OpOutcome::Rejected(e),
            },
            HeapOp::Coalesce => OpOutcome::Coalesced(self.heap.coalesce()),
        }
    }

    /// Apply every step in order, checking invariants after each one.
    #[track_caller]
    pub fn run(&mut self, ops: &[HeapOp]) -> Vec<OpOutcome> {
        ops.iter()
            .map(|&op| {
                let outcome = self.apply(op);
                assert_invariants(&self.heap);
                outcome
            })
            .collect()
    }

    /// Whether every live payload still holds its fill byte and no two
    /// live payloads overlap.
    pub fn verify_payloads(&self) -> bool {
        let intact = self
            .live
            .iter()
            .all(|(a, tag)| payload_is(&self.heap, a, *tag));
        let disjoint = self.live.iter().enumerate().all(|(i, (a, _))| {
            self.live[i + 1..].iter().all(|(b, _)| !a.overlaps(b))
        });
        intact && disjoint
    }
}

/// The allocation sequence of the reference demonstration: three
/// allocations, free the middle one, then a smaller request that must
/// reuse it.
pub fn reference_script() -> Vec<HeapOp> {
    vec![
        HeapOp::Alloc(200),
        HeapOp::Alloc(150),
        HeapOp::Alloc(100),
        HeapOp::FreeAddr(Addr(248)),
        HeapOp::Alloc(140),
    ]
}

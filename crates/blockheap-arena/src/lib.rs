//! Fixed-capacity block heap with first-fit allocation and coalescing.
//!
//! A [`Heap`] carves one contiguous byte region into variable-sized blocks
//! on demand, tracks which blocks are in use, and recombines freed blocks
//! so that no two address-adjacent blocks are ever both free.
//!
//! # Architecture
//!
//! ```text
//! Heap (owns everything, passed explicitly to every operation)
//! ├── Arena            fixed Vec<u8> of `capacity` bytes (payload storage)
//! ├── BlockDirectory   IndexMap<offset, BlockDescriptor>, address ordered
//! │   └── BlockDescriptor { offset, size, state, next }
//! ├── HeapConfig       capacity, descriptor size, split threshold, policy
//! └── HeapStats        cumulative counters for every public operation
//! ```
//!
//! Block metadata lives in the directory, not inside the arena bytes. Each
//! block still *reserves* `descriptor_size` bytes of arena space in front
//! of its payload, so the byte accounting matches an embedded-header heap:
//! the sum of `descriptor_size + size` over all blocks is always exactly
//! the arena capacity.
//!
//! # Addresses
//!
//! External addresses are [`Addr`] values: the byte offset of a payload
//! from the start of the arena. Every address handed to [`Heap::free`] is
//! bounds-checked and translated to a descriptor offset before any
//! directory lookup.
//!
//! # Example
//!
//! ```rust
//! use blockheap_arena::Heap;
//!
//! let mut heap = Heap::with_capacity(1024).unwrap();
//! let a = heap.allocate(200).unwrap().unwrap();
//! assert!(a.len() >= 200);
//!
//! heap.free(a.addr()).unwrap();
//! assert_eq!(heap.dump().len(), 1);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod alloc;
pub mod arena;
pub mod coalesce;
pub mod config;
pub mod descriptor;
pub mod directory;
pub mod error;
pub mod free;
pub mod handle;
pub mod heap;
pub mod inspect;
pub mod stats;

// Public re-exports for the primary API surface.
pub use config::{CoalescePolicy, HeapConfig};
pub use descriptor::{BlockDescriptor, BlockState};
pub use error::{HeapError, InvalidFreeKind};
pub use handle::{Addr, Allocation};
pub use heap::Heap;
pub use inspect::{BlockInfo, HeapLayout, HeapSummary};
pub use stats::HeapStats;

//! Blockheap: a fixed-capacity heap manager for variable-sized blocks.
//!
//! This is the top-level facade crate. It re-exports the public API of
//! `blockheap-arena` and bundles the common imports in a [`prelude`].
//!
//! # Quick start
//!
//! ```rust
//! use blockheap::prelude::*;
//!
//! let mut heap = Heap::new(HeapConfig::new(1024)).unwrap();
//! let a = heap.allocate(200).unwrap().unwrap();
//! let b = heap.allocate(150).unwrap().unwrap();
//! assert!(!a.overlaps(&b));
//!
//! heap.free(b.addr()).unwrap();
//! assert_eq!(heap.free(b.addr()), Err(HeapError::DoubleFree { addr: b.addr() }));
//!
//! // The freed block is reused by a smaller request.
//! let c = heap.allocate(140).unwrap().unwrap();
//! assert_eq!(c.addr(), b.addr());
//! println!("{}", heap.dump());
//! ```
//!
//! # Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`arena`] | Heap, directory, descriptors, allocator, coalescer, inspector |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// The heap manager (`blockheap-arena`).
///
/// Most users only need [`arena::Heap`] and [`arena::HeapConfig`], which
/// are also in the [`prelude`]. The directory and coalescing internals are
/// reachable through this module for inspection and testing.
pub use blockheap_arena as arena;

pub use blockheap_arena::{
    Addr, Allocation, BlockInfo, CoalescePolicy, Heap, HeapConfig, HeapError, HeapLayout,
    HeapStats, HeapSummary, InvalidFreeKind,
};

/// Common imports for typical blockheap usage.
///
/// ```rust
/// use blockheap::prelude::*;
/// ```
pub mod prelude {
    // Heap and configuration
    pub use blockheap_arena::{CoalescePolicy, Heap, HeapConfig};

    // Handles
    pub use blockheap_arena::{Addr, Allocation};

    // Errors
    pub use blockheap_arena::{HeapError, InvalidFreeKind};

    // Inspection
    pub use blockheap_arena::{BlockInfo, HeapLayout, HeapStats, HeapSummary};
}

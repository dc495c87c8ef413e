//! Merging of adjacent free blocks.
//!
//! After every successful free the heap restores the invariant that no two
//! address-adjacent blocks are both free. Two strategies are provided (see
//! [`CoalescePolicy`](crate::CoalescePolicy)); both leave the directory in
//! the same state.

use tracing::trace;

use crate::directory::BlockDirectory;

/// Single left-to-right pass over the whole chain.
///
/// Whenever a free block is followed by another free block, the second is
/// absorbed into the first and the (now larger) block is compared against
/// its new successor before the cursor advances. Returns the number of
/// merges performed; calling it again immediately returns 0.
pub fn coalesce_all(directory: &mut BlockDirectory) -> usize {
    let mut merges = 0;
    let mut cursor = directory.head().map(|block| block.offset);
    while let Some(offset) = cursor {
        if let Some(absorbed) = directory.merge_next(offset) {
            trace!(offset, absorbed, "merged adjacent free blocks");
            merges += 1;
            continue;
        }
        cursor = directory.get(offset).and_then(|block| block.next);
    }
    merges
}

/// Merge the block at `offset` with its free successor and free
/// predecessor only.
///
/// Assumes the invariant held everywhere before the block at `offset` was
/// freed, so at most two merges can be needed. Returns the number of
/// merges performed.
pub fn coalesce_around(directory: &mut BlockDirectory, offset: usize) -> usize {
    let mut merges = 0;
    while let Some(absorbed) = directory.merge_next(offset) {
        trace!(offset, absorbed, "merged free successor");
        merges += 1;
    }
    let prev = directory
        .prev_of(offset)
        .filter(|block| block.is_free())
        .map(|block| block.offset);
    if let Some(prev) = prev {
        while let Some(absorbed) = directory.merge_next(prev) {
            trace!(offset = prev, absorbed, "merged into free predecessor");
            merges += 1;
        }
    }
    merges
}

//! Read-only views of the heap layout.
//!
//! [`Heap::dump`] walks the directory in address order and snapshots every
//! block into a [`HeapLayout`]. Nothing here mutates the heap.

use std::fmt;

use crate::descriptor::BlockState;
use crate::handle::Addr;
use crate::heap::Heap;

/// Snapshot of one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Offset of the block's descriptor.
    pub offset: usize,
    /// Address of the block's first payload byte.
    pub addr: Addr,
    /// Payload size in bytes.
    pub size: usize,
    /// Whether the block is free.
    pub free: bool,
    /// Bytes most recently requested, for allocated blocks.
    pub requested: Option<usize>,
    /// Offset of the next descriptor, if any.
    pub next: Option<usize>,
}

/// Ordered snapshot of every block, lowest address first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeapLayout {
    blocks: Vec<BlockInfo>,
}

impl HeapLayout {
    /// Iterate over the blocks in address order.
    pub fn iter(&self) -> std::slice::Iter<'_, BlockInfo> {
        self.blocks.iter()
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the layout has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The blocks as a slice.
    pub fn blocks(&self) -> &[BlockInfo] {
        &self.blocks
    }

    /// `(size, free)` for every block in address order.
    pub fn sizes_and_flags(&self) -> Vec<(usize, bool)> {
        self.blocks.iter().map(|b| (b.size, b.free)).collect()
    }

    /// Sum of descriptor and payload bytes over all blocks.
    pub fn total_span(&self, descriptor_size: usize) -> usize {
        self.blocks.iter().map(|b| descriptor_size + b.size).sum()
    }
}

impl<'a> IntoIterator for &'a HeapLayout {
    type Item = &'a BlockInfo;
    type IntoIter = std::slice::Iter<'a, BlockInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

impl fmt::Display for HeapLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            write!(f, "[size: {}, free: {}] -> ", block.size, block.free)?;
        }
        f.write_str("end")
    }
}

/// Aggregate occupancy figures derived from the directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeapSummary {
    /// Arena size in bytes.
    pub capacity: usize,
    /// Blocks in the directory.
    pub block_count: usize,
    /// Blocks currently free.
    pub free_blocks: usize,
    /// Payload bytes held by allocated blocks (granted, not requested).
    pub used_bytes: usize,
    /// Payload bytes held by free blocks.
    pub free_bytes: usize,
    /// Payload of the largest free block.
    pub largest_free: usize,
    /// Bytes reserved for descriptors.
    pub overhead_bytes: usize,
}

impl Heap {
    /// Snapshot every block in address order.
    pub fn dump(&self) -> HeapLayout {
        let ds = self.config.descriptor_size;
        let blocks = self
            .directory
            .iter()
            .map(|block| BlockInfo {
                offset: block.offset,
                addr: Addr(block.payload_start(ds)),
                size: block.size,
                free: block.is_free(),
                requested: match block.state {
                    BlockState::Allocated { requested } => Some(requested),
                    BlockState::Free => None,
                },
                next: block.next,
            })
            .collect();
        HeapLayout { blocks }
    }

    /// Occupancy totals.
    pub fn summary(&self) -> HeapSummary {
        let mut summary = HeapSummary {
            capacity: self.capacity(),
            block_count: 0,
            free_blocks: 0,
            used_bytes: 0,
            free_bytes: 0,
            largest_free: 0,
            overhead_bytes: 0,
        };
        for block in self.directory.iter() {
            summary.block_count += 1;
            summary.overhead_bytes += self.config.descriptor_size;
            if block.is_free() {
                summary.free_blocks += 1;
                summary.free_bytes += block.size;
                summary.largest_free = summary.largest_free.max(block.size);
            } else {
                summary.used_bytes += block.size;
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_heap_dumps_one_free_block() {
        let heap = Heap::with_capacity(1024).unwrap();
        let layout = heap.dump();
        assert_eq!(layout.len(), 1);
        assert_eq!(layout.sizes_and_flags(), vec![(1000, true)]);
        assert_eq!(layout.total_span(24), 1024);
        let head = layout.blocks()[0];
        assert_eq!(head.offset, 0);
        assert_eq!(head.addr, Addr(24));
        assert_eq!(head.requested, None);
        assert_eq!(head.next, None);
    }

    #[test]
    fn dump_records_requested_size() {
        let mut heap = Heap::with_capacity(1024).unwrap();
        let _a = heap.allocate(990).unwrap().unwrap();
        let layout = heap.dump();
        assert_eq!(layout.blocks()[0].size, 1000);
        assert_eq!(layout.blocks()[0].requested, Some(990));
    }

    #[test]
    fn dump_does_not_mutate() {
        let mut heap = Heap::with_capacity(1024).unwrap();
        let _a = heap.allocate(100).unwrap().unwrap();
        let first = heap.dump();
        let second = heap.dump();
        assert_eq!(first, second);
        assert_eq!(heap.stats().allocations, 1);
    }

    #[test]
    fn display_renders_chain() {
        let mut heap = Heap::with_capacity(1024).unwrap();
        let _a = heap.allocate(200).unwrap().unwrap();
        assert_eq!(
            heap.dump().to_string(),
            "[size: 200, free: false] -> [size: 776, free: true] -> end"
        );
    }

    #[test]
    fn summary_accounts_for_every_byte() {
        let mut heap = Heap::with_capacity(1024).unwrap();
        let _a = heap.allocate(200).unwrap().unwrap();
        let b = heap.allocate(150).unwrap().unwrap();
        let _c = heap.allocate(100).unwrap().unwrap();
        heap.free(b.addr()).unwrap();

        let s = heap.summary();
        assert_eq!(s.block_count, 4);
        assert_eq!(s.free_blocks, 2);
        assert_eq!(s.used_bytes, 300);
        assert_eq!(s.free_bytes, 150 + 478);
        assert_eq!(s.largest_free, 478);
        assert_eq!(s.overhead_bytes, 96);
        assert_eq!(s.used_bytes + s.free_bytes + s.overhead_bytes, s.capacity);
    }
}

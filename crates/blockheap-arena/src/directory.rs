//! The block directory: an address-ordered chain of descriptors.
//!
//! [`BlockDirectory`] is the central metadata table of the heap. It maps
//! each descriptor offset to its [`BlockDescriptor`] and keeps entries in
//! address order, so that index order, link order and address order all
//! agree. Lookup by offset is O(1); the predecessor of a block is the
//! entry one position before it.
//!
//! The directory only performs structural edits (split, merge, state
//! flips). Policy lives in [`alloc`](crate::alloc) and
//! [`coalesce`](crate::coalesce).

use indexmap::IndexMap;

use crate::descriptor::{BlockDescriptor, BlockState};

/// Address-ordered chain of block descriptors covering the whole arena.
#[derive(Clone, Debug)]
pub struct BlockDirectory {
    blocks: IndexMap<usize, BlockDescriptor>,
    capacity: usize,
    descriptor_size: usize,
}

impl BlockDirectory {
    /// Create a directory holding a single free block that spans
    /// `capacity` bytes.
    ///
    /// The caller guarantees `capacity > descriptor_size`
    /// (see [`HeapConfig::validate`](crate::HeapConfig::validate)).
    pub fn new(capacity: usize, descriptor_size: usize) -> Self {
        let mut dir = Self {
            blocks: IndexMap::new(),
            capacity,
            descriptor_size,
        };
        dir.reset();
        dir
    }

    /// Drop every block and restore the single spanning free block.
    pub fn reset(&mut self) {
        self.blocks.clear();
        let size = self.capacity.saturating_sub(self.descriptor_size);
        self.blocks.insert(0, BlockDescriptor::free(0, size));
    }

    /// Bytes reserved in front of every payload.
    pub fn descriptor_size(&self) -> usize {
        self.descriptor_size
    }

    /// Total bytes covered by the chain.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of blocks in the chain.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the chain is empty. Never true after construction.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The block at offset 0.
    pub fn head(&self) -> Option<&BlockDescriptor> {
        self.blocks.get_index(0).map(|(_, block)| block)
    }

    /// Look up the block whose descriptor starts exactly at `offset`.
    pub fn get(&self, offset: usize) -> Option<&BlockDescriptor> {
        self.blocks.get(&offset)
    }

    /// The block following `offset` in address order.
    pub fn next_of(&self, offset: usize) -> Option<&BlockDescriptor> {
        let next = self.blocks.get(&offset)?.next?;
        self.blocks.get(&next)
    }

    /// The block preceding `offset` in address order.
    pub fn prev_of(&self, offset: usize) -> Option<&BlockDescriptor> {
        let index = self.blocks.get_index_of(&offset)?;
        let (_, block) = self.blocks.get_index(index.checked_sub(1)?)?;
        Some(block)
    }

    /// The block whose span (header or payload) contains `offset`.
    pub fn containing(&self, offset: usize) -> Option<&BlockDescriptor> {
        self.iter()
            .find(|block| block.contains(offset, self.descriptor_size))
    }

    /// Walk the chain from offset 0 by following `next` links.
    pub fn iter(&self) -> Chain<'_> {
        Chain {
            directory: self,
            cursor: self.head().map(|block| block.offset),
        }
    }

    /// Payload size of the largest free block, or 0 if none is free.
    pub fn largest_free(&self) -> usize {
        self.iter()
            .filter(|block| block.is_free())
            .map(|block| block.size)
            .max()
            .unwrap_or(0)
    }

    /// Replace a block's state, returning the previous one.
    ///
    /// Returns `None` if no block starts at `offset`.
    pub fn set_state(&mut self, offset: usize, state: BlockState) -> Option<BlockState> {
        let block = self.blocks.get_mut(&offset)?;
        Some(std::mem::replace(&mut block.state, state))
    }

    /// Shrink the block at `offset` to a payload of exactly `size` bytes
    /// and splice a new free block into the space that frees up.
    ///
    /// Returns the new block's offset, or `None` if there is no block at
    /// `offset` or its leftover cannot hold a descriptor.
    pub fn split(&mut self, offset: usize, size: usize) -> Option<usize> {
        let ds = self.descriptor_size;
        let index = self.blocks.get_index_of(&offset)?;
        let (_, block) = self.blocks.get_index_mut(index)?;
        let remainder = block.size.checked_sub(size)?.checked_sub(ds)?;

        let tail_offset = offset + ds + size;
        let tail = BlockDescriptor {
            next: block.next,
            ..BlockDescriptor::free(tail_offset, remainder)
        };
        block.size = size;
        block.next = Some(tail_offset);

        self.blocks.shift_insert(index + 1, tail_offset, tail);
        Some(tail_offset)
    }

    /// Absorb the successor of `offset` into it if both are free.
    ///
    /// The merged block's payload grows by the successor's descriptor and
    /// payload; the successor's descriptor is removed from the chain.
    /// Returns the offset of the absorbed block.
    pub fn merge_next(&mut self, offset: usize) -> Option<usize> {
        let block = *self.blocks.get(&offset)?;
        let next_offset = block.next?;
        let next = *self.blocks.get(&next_offset)?;
        if !(block.is_free() && next.is_free()) {
            return None;
        }

        self.blocks.shift_remove(&next_offset);
        let merged = self.blocks.get_mut(&offset)?;
        merged.size += self.descriptor_size + next.size;
        merged.next = next.next;
        Some(next_offset)
    }
}

/// Iterator over a [`BlockDirectory`] in address order, following links.
pub struct Chain<'a> {
    directory: &'a BlockDirectory,
    cursor: Option<usize>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a BlockDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.directory.blocks.get(&self.cursor?)?;
        self.cursor = block.next;
        Some(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DS: usize = 24;

    fn sizes(dir: &BlockDirectory) -> Vec<(usize, bool)> {
        dir.iter().map(|b| (b.size, b.is_free())).collect()
    }

    #[test]
    fn new_directory_has_one_spanning_free_block() {
        let dir = BlockDirectory::new(1024, DS);
        assert_eq!(dir.len(), 1);
        let head = dir.head().unwrap();
        assert_eq!(head.offset, 0);
        assert_eq!(head.size, 1000);
        assert!(head.is_free());
        assert_eq!(head.next, None);
    }

    #[test]
    fn split_inserts_free_tail_after_block() {
        let mut dir = BlockDirectory::new(1024, DS);
        let tail = dir.split(0, 200).unwrap();
        assert_eq!(tail, 224);
        assert_eq!(sizes(&dir), vec![(200, true), (776, true)]);
        assert_eq!(dir.head().unwrap().next, Some(224));
        assert_eq!(dir.next_of(0).unwrap().offset, 224);
        assert_eq!(dir.prev_of(224).unwrap().offset, 0);
    }

    #[test]
    fn split_preserves_former_successor_link() {
        let mut dir = BlockDirectory::new(1024, DS);
        dir.split(0, 200).unwrap(); // [0:200][224:776]
        dir.split(0, 100).unwrap(); // [0:100][124:76][224:776]
        let offsets: Vec<_> = dir.iter().map(|b| b.offset).collect();
        assert_eq!(offsets, vec![0, 124, 224]);
        assert_eq!(dir.get(124).unwrap().next, Some(224));
        assert_eq!(dir.get(124).unwrap().size, 76);
    }

    #[test]
    fn split_rejects_leftover_smaller_than_descriptor() {
        let mut dir = BlockDirectory::new(1024, DS);
        assert!(dir.split(0, 990).is_none());
        assert!(dir.split(0, 1001).is_none());
        assert!(dir.split(999, 10).is_none());
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn split_with_exact_descriptor_leftover_makes_empty_block() {
        let mut dir = BlockDirectory::new(1024, DS);
        let tail = dir.split(0, 976).unwrap();
        assert_eq!(dir.get(tail).unwrap().size, 0);
    }

    #[test]
    fn merge_next_requires_both_free() {
        let mut dir = BlockDirectory::new(1024, DS);
        dir.split(0, 200).unwrap();
        dir.set_state(0, BlockState::Allocated { requested: 200 });
        assert!(dir.merge_next(0).is_none());

        dir.set_state(0, BlockState::Free);
        assert_eq!(dir.merge_next(0), Some(224));
        assert_eq!(sizes(&dir), vec![(1000, true)]);
        assert_eq!(dir.head().unwrap().next, None);
    }

    #[test]
    fn merge_next_on_last_block_is_noop() {
        let mut dir = BlockDirectory::new(1024, DS);
        assert!(dir.merge_next(0).is_none());
        assert!(dir.merge_next(42).is_none());
    }

    #[test]
    fn containing_finds_header_and_payload_bytes() {
        let mut dir = BlockDirectory::new(1024, DS);
        dir.split(0, 200).unwrap();
        assert_eq!(dir.containing(0).unwrap().offset, 0);
        assert_eq!(dir.containing(223).unwrap().offset, 0);
        assert_eq!(dir.containing(224).unwrap().offset, 224);
        assert_eq!(dir.containing(1023).unwrap().offset, 224);
        assert!(dir.containing(1024).is_none());
    }

    #[test]
    fn largest_free_ignores_allocated_blocks() {
        let mut dir = BlockDirectory::new(1024, DS);
        assert_eq!(dir.largest_free(), 1000);
        dir.split(0, 200).unwrap();
        dir.set_state(224, BlockState::Allocated { requested: 776 });
        assert_eq!(dir.largest_free(), 200);
        dir.set_state(0, BlockState::Allocated { requested: 200 });
        assert_eq!(dir.largest_free(), 0);
    }

    #[test]
    fn set_state_returns_previous() {
        let mut dir = BlockDirectory::new(64, DS);
        let prev = dir.set_state(0, BlockState::Allocated { requested: 1 });
        assert_eq!(prev, Some(BlockState::Free));
        assert_eq!(dir.set_state(7, BlockState::Free), None);
    }

    #[test]
    fn reset_restores_single_block() {
        let mut dir = BlockDirectory::new(1024, DS);
        dir.split(0, 100).unwrap();
        dir.split(124, 100).unwrap();
        assert_eq!(dir.len(), 3);
        dir.reset();
        assert_eq!(sizes(&dir), vec![(1000, true)]);
    }
}

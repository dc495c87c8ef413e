//! Block descriptors: the per-block metadata record.
//!
//! A [`BlockDescriptor`] describes one span of the arena: `descriptor_size`
//! reserved header bytes starting at `offset`, followed by `size` payload
//! bytes. The `next` link is the offset of the following descriptor in
//! address order. It is a traversal aid only and confers no ownership.

/// Allocation state of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockState {
    /// Available for allocation.
    Free,
    /// Handed out to a caller.
    Allocated {
        /// Bytes the caller most recently asked for. Never exceeds the
        /// block's payload size.
        requested: usize,
    },
}

impl BlockState {
    /// Whether the block is free.
    pub fn is_free(self) -> bool {
        matches!(self, Self::Free)
    }
}

/// Metadata for one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockDescriptor {
    /// Byte offset of the descriptor within the arena.
    pub offset: usize,
    /// Payload size in bytes, excluding the descriptor.
    pub size: usize,
    /// Free or allocated.
    pub state: BlockState,
    /// Offset of the next descriptor in address order, or `None` for the
    /// last block.
    pub next: Option<usize>,
}

impl BlockDescriptor {
    /// A free block with no successor.
    pub fn free(offset: usize, size: usize) -> Self {
        Self {
            offset,
            size,
            state: BlockState::Free,
            next: None,
        }
    }

    /// Whether the block is free.
    pub fn is_free(&self) -> bool {
        self.state.is_free()
    }

    /// Offset of the first payload byte.
    pub fn payload_start(&self, descriptor_size: usize) -> usize {
        self.offset + descriptor_size
    }

    /// Offset one past the last payload byte; also where the next block's
    /// descriptor begins.
    pub fn end(&self, descriptor_size: usize) -> usize {
        self.offset + descriptor_size + self.size
    }

    /// Bytes this block occupies in the arena, header included.
    pub fn span(&self, descriptor_size: usize) -> usize {
        descriptor_size + self.size
    }

    /// Whether `offset` falls anywhere in this block, header included.
    pub fn contains(&self, offset: usize, descriptor_size: usize) -> bool {
        (self.offset..self.end(descriptor_size)).contains(&offset)
    }
}

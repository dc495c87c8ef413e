//! The heap: arena, directory and counters owned together.
//!
//! [`Heap`] is the value every operation is called on. It is constructed
//! once from a [`HeapConfig`], owns its [`Arena`] and [`BlockDirectory`]
//! exclusively, and releases the arena when dropped. Allocation, freeing
//! and inspection live in [`alloc`](crate::alloc), [`free`](crate::free)
//! and [`inspect`](crate::inspect) as further `impl Heap` blocks.

use tracing::{debug, error};

use crate::arena::Arena;
use crate::coalesce;
use crate::config::HeapConfig;
use crate::descriptor::{BlockDescriptor, BlockState};
use crate::directory::BlockDirectory;
use crate::error::{HeapError, InvalidFreeKind};
use crate::handle::Addr;
use crate::stats::HeapStats;

/// A fixed-capacity block heap.
///
/// All mutation goes through `&mut self`, so a `Heap` is serially
/// accessed by construction. Wrap it in a lock to share it across threads.
pub struct Heap {
    pub(crate) config: HeapConfig,
    pub(crate) arena: Arena,
    pub(crate) directory: BlockDirectory,
    pub(crate) stats: HeapStats,
}

impl Heap {
    /// Validate `config`, acquire the arena and lay down a single free
    /// block spanning it.
    ///
    /// # Errors
    ///
    /// `HeapError::InvalidConfig` if the config cannot host one block;
    /// `HeapError::RegionUnavailable` if the arena cannot be acquired.
    /// No heap state exists after either failure.
    pub fn new(config: HeapConfig) -> Result<Self, HeapError> {
        config.validate()?;
        let arena = Arena::acquire(config.capacity).inspect_err(|e| {
            error!(capacity = config.capacity, error = %e, "heap initialisation failed");
        })?;
        let directory = BlockDirectory::new(config.capacity, config.descriptor_size);
        debug!(
            capacity = config.capacity,
            descriptor_size = config.descriptor_size,
            policy = ?config.coalesce,
            "heap initialised"
        );
        Ok(Self {
            config,
            arena,
            directory,
            stats: HeapStats::default(),
        })
    }

    /// Shorthand for `Heap::new(HeapConfig::new(capacity))`.
    pub fn with_capacity(capacity: usize) -> Result<Self, HeapError> {
        Self::new(HeapConfig::new(capacity))
    }

    /// The configuration this heap was built with.
    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    /// Arena size in bytes.
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Bytes reserved in front of every payload.
    pub fn descriptor_size(&self) -> usize {
        self.config.descriptor_size
    }

    /// Read-only access to the block directory.
    pub fn directory(&self) -> &BlockDirectory {
        &self.directory
    }

    /// Cumulative operation counters.
    pub fn stats(&self) -> &HeapStats {
        &self.stats
    }

    /// Number of blocks currently in the directory.
    pub fn block_count(&self) -> usize {
        self.directory.len()
    }

    /// Run a full coalescing pass and return the number of merges.
    ///
    /// Every successful [`free`](Self::free) already coalesces, so on a
    /// heap that is only driven through the public API this returns 0.
    pub fn coalesce(&mut self) -> usize {
        let merges = coalesce::coalesce_all(&mut self.directory);
        self.stats.merges += merges as u64;
        merges
    }

    /// Return to the post-construction state: one free block, zeroed
    /// arena, cleared counters. The arena storage is reused.
    pub fn reset(&mut self) {
        self.directory.reset();
        self.arena.clear();
        self.stats = HeapStats::default();
    }

    /// Translate an external address to the block it names.
    ///
    /// The address is bounds-checked against `[0, capacity)` before any
    /// directory lookup. An address that is not the payload start of some
    /// block is classified by the block that contains it: inside a free
    /// block it is reported as a double free (the block it named has
    /// already been released and absorbed), anywhere else as an invalid
    /// free. A zero-payload block has no payload start of its own; its
    /// nominal one is the header of the following block.
    pub fn locate(&self, addr: Addr) -> Result<&BlockDescriptor, HeapError> {
        if !self.arena.contains(addr.0) {
            return Err(HeapError::InvalidFree {
                addr,
                kind: InvalidFreeKind::OutOfBounds,
            });
        }
        let ds = self.config.descriptor_size;
        let exact = addr
            .0
            .checked_sub(ds)
            .and_then(|offset| self.directory.get(offset))
            .filter(|block| block.contains(addr.0, ds));
        if let Some(block) = exact {
            return Ok(block);
        }
        match self.directory.containing(addr.0) {
            Some(block) if block.is_free() => Err(HeapError::DoubleFree { addr }),
            _ => Err(HeapError::InvalidFree {
                addr,
                kind: InvalidFreeKind::NotBlockStart,
            }),
        }
    }

    /// Payload bytes of the live allocation at `addr`.
    ///
    /// Returns `None` unless `addr` is the payload start of an allocated
    /// block. The slice covers the whole granted payload, which may be
    /// longer than the original request.
    pub fn payload(&self, addr: Addr) -> Option<&[u8]> {
        let block = self.locate(addr).ok().filter(|b| !b.is_free())?;
        let start = block.payload_start(self.config.descriptor_size);
        self.arena.bytes(start..start + block.size)
    }

    /// Mutable payload bytes of the live allocation at `addr`.
    pub fn payload_mut(&mut self, addr: Addr) -> Option<&mut [u8]> {
        let block = self.locate(addr).ok().filter(|b| !b.is_free())?;
        let start = block.payload_start(self.config.descriptor_size);
        let end = start + block.size;
        self.arena.bytes_mut(start..end)
    }

    /// Bytes the caller asked for when `addr` was allocated.
    pub fn requested_size(&self, addr: Addr) -> Option<usize> {
        match self.locate(addr).ok()?.state {
            BlockState::Allocated { requested } => Some(requested),
            BlockState::Free => None,
        }
    }
}

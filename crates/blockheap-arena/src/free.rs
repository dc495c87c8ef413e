//! Deallocation: address validation, double-free detection, coalescing.

use tracing::{debug, warn};

use crate::coalesce;
use crate::config::CoalescePolicy;
use crate::descriptor::BlockState;
use crate::error::HeapError;
use crate::handle::Addr;
use crate::heap::Heap;

impl Heap {
    /// Release the allocation whose payload starts at `addr`.
    ///
    /// On success the block is marked free and merged with any free
    /// neighbours according to the configured
    /// [`CoalescePolicy`](crate::CoalescePolicy).
    ///
    /// # Errors
    ///
    /// `HeapError::InvalidFree` if `addr` is outside the arena or does not
    /// name an allocated block; `HeapError::DoubleFree` if the block it
    /// names is already free. The directory is unchanged on error.
    pub fn free(&mut self, addr: Addr) -> Result<(), HeapError> {
        let located = match self.locate(addr) {
            Ok(block) if block.is_free() => Err(HeapError::DoubleFree { addr }),
            Ok(block) => Ok(block.offset),
            Err(e) => Err(e),
        };
        let offset = match located {
            Ok(offset) => offset,
            Err(e) => {
                self.reject_free(&e);
                return Err(e);
            }
        };

        self.directory.set_state(offset, BlockState::Free);
        let merges = match self.config.coalesce {
            CoalescePolicy::FullScan => coalesce::coalesce_all(&mut self.directory),
            CoalescePolicy::Neighbors => coalesce::coalesce_around(&mut self.directory, offset),
        };
        self.stats.frees += 1;
        self.stats.merges += merges as u64;
        debug!(addr = addr.0, merges, "block freed");
        Ok(())
    }

    fn reject_free(&mut self, error: &HeapError) {
        match error {
            HeapError::DoubleFree { addr } => {
                self.stats.double_frees += 1;
                warn!(addr = addr.0, "double free detected");
            }
            HeapError::InvalidFree { addr, kind } => {
                self.stats.invalid_frees += 1;
                warn!(addr = addr.0, %kind, "invalid free request");
            }
            _ => {}
        }
    }
}

//! Heap error types.

use std::error::Error;
use std::fmt;

use crate::handle::Addr;

/// Why an address passed to [`Heap::free`](crate::Heap::free) was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidFreeKind {
    /// The address lies outside `[0, capacity)`.
    OutOfBounds,
    /// The address lies inside the arena but is not the payload start of
    /// any allocated block (it points into a header or mid-payload).
    NotBlockStart,
}

impl fmt::Display for InvalidFreeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds => f.write_str("outside the arena"),
            Self::NotBlockStart => f.write_str("not the start of an allocated block"),
        }
    }
}

/// Errors that can occur during heap operations.
///
/// Everything except [`RegionUnavailable`](Self::RegionUnavailable) and
/// [`InvalidConfig`](Self::InvalidConfig) is recoverable: the directory is
/// left exactly as it was before the failing call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeapError {
    /// The configuration cannot describe a usable heap.
    InvalidConfig {
        /// Description of which constraint was violated.
        reason: String,
    },
    /// The backing region could not be acquired at construction.
    RegionUnavailable {
        /// Number of bytes requested for the arena.
        capacity: usize,
        /// Reason reported by the system allocator.
        reason: String,
    },
    /// The request exceeds the payload of an entirely empty heap.
    OversizeRequest {
        /// Number of bytes requested.
        requested: usize,
        /// Largest request the heap could ever satisfy.
        max: usize,
    },
    /// No free block is large enough for the request.
    ExhaustedPool {
        /// Number of bytes requested.
        requested: usize,
        /// Payload size of the largest free block (0 if none).
        largest_free: usize,
    },
    /// The address cannot be freed.
    InvalidFree {
        /// The rejected address.
        addr: Addr,
        /// Why it was rejected.
        kind: InvalidFreeKind,
    },
    /// The address belongs to a block that is already free.
    DoubleFree {
        /// The rejected address.
        addr: Addr,
    },
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => write!(f, "invalid heap config: {reason}"),
            Self::RegionUnavailable { capacity, reason } => {
                write!(f, "heap initialization failed for {capacity} bytes: {reason}")
            }
            Self::OversizeRequest { requested, max } => {
                write!(
                    f,
                    "requested {requested} bytes exceeds available heap size of {max} bytes"
                )
            }
            Self::ExhaustedPool {
                requested,
                largest_free,
            } => {
                write!(
                    f,
                    "no free block for {requested} bytes, largest free block is {largest_free} bytes"
                )
            }
            Self::InvalidFree { addr, kind } => {
                write!(f, "invalid free of {addr}: {kind}")
            }
            Self::DoubleFree { addr } => write!(f, "double free detected at {addr}"),
        }
    }
}

impl Error for HeapError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_sizes() {
        let e = HeapError::OversizeRequest {
            requested: 2000,
            max: 1000,
        };
        let msg = e.to_string();
        assert!(msg.contains("2000"));
        assert!(msg.contains("1000"));
    }

    #[test]
    fn display_invalid_free_includes_kind() {
        let e = HeapError::InvalidFree {
            addr: Addr(4096),
            kind: InvalidFreeKind::OutOfBounds,
        };
        assert_eq!(e.to_string(), "invalid free of @4096: outside the arena");
    }

    #[test]
    fn errors_are_comparable() {
        let a = HeapError::DoubleFree { addr: Addr(24) };
        assert_eq!(a.clone(), a);
        assert_ne!(a, HeapError::DoubleFree { addr: Addr(48) });
    }
}

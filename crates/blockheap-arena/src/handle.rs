//! External addresses and allocation handles.
//!
//! An [`Addr`] is what callers hold on to: the byte offset of a payload
//! from the start of the arena. It is never a raw pointer, so a stale or
//! forged address can be validated instead of dereferenced.

use std::fmt;
use std::ops::Range;

/// Byte offset of a payload within the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Addr(pub usize);

impl Addr {
    /// The raw byte offset.
    pub fn offset(self) -> usize {
        self.0
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl From<usize> for Addr {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

/// A successful allocation.
///
/// `len` is the payload actually granted, which may exceed `requested`
/// when the chosen block was too small to split.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct Allocation {
    pub(crate) addr: Addr,
    pub(crate) len: usize,
    pub(crate) requested: usize,
}

impl Allocation {
    pub(crate) fn new(addr: Addr, len: usize, requested: usize) -> Self {
        debug_assert!(len >= requested);
        Self {
            addr,
            len,
            requested,
        }
    }

    /// Address of the first payload byte.
    pub fn addr(&self) -> Addr {
        self.addr
    }

    /// Payload bytes granted.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the granted payload is empty. Never true for an allocation
    /// returned by the heap.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes the caller asked for.
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Surplus bytes awarded because the block could not be split.
    pub fn fragmentation(&self) -> usize {
        self.len - self.requested
    }

    /// Byte range of the payload within the arena.
    pub fn range(&self) -> Range<usize> {
        self.addr.0..self.addr.0 + self.len
    }

    /// Whether this allocation's payload shares any byte with `other`'s.
    pub fn overlaps(&self, other: &Allocation) -> bool {
        let (a, b) = (self.range(), other.range());
        a.start < b.end && b.start < a.end
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Allocation({}, len={}, requested={})",
            self.addr, self.len, self.requested
        )
    }
}

//! Thread identifier type

use core::fmt;

/// Opaque handle for a thread created through the compatibility layer.
///
/// Packs a registry slot index and a generation counter into one 64-bit
/// value. Slots are reused after a thread is reclaimed, but each reuse bumps
/// the generation, so a stale handle misses cleanly instead of aliasing
/// whatever thread occupies the slot now. Generation 0 is never issued; the
/// all-zero value is reserved as the "no thread" sentinel.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ThreadId(u64);

impl ThreadId {
    /// Sentinel value indicating no thread
    pub const NONE: ThreadId = ThreadId(0);

    /// Create a handle from a slot index and generation
    #[inline]
    pub const fn new(slot: u32, generation: u32) -> Self {
        ThreadId(((generation as u64) << 32) | slot as u64)
    }

    /// Registry slot index
    #[inline]
    pub const fn slot(self) -> u32 {
        self.0 as u32
    }

    /// Generation the slot had when this handle was issued
    #[inline]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Get the packed u64 value
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Rebuild a handle from its packed u64 value
    #[inline]
    pub const fn from_u64(raw: u64) -> Self {
        ThreadId(raw)
    }

    /// Check if this is the NONE sentinel
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Check if this is a valid thread handle
    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != 0
    }

    /// Convert to Option
    #[inline]
    pub const fn to_option(self) -> Option<ThreadId> {
        if self.is_none() {
            None
        } else {
            Some(self)
        }
    }
}

impl From<u64> for ThreadId {
    #[inline]
    fn from(raw: u64) -> Self {
        ThreadId(raw)
    }
}

impl From<ThreadId> for u64 {
    #[inline]
    fn from(id: ThreadId) -> Self {
        id.0
    }
}

impl fmt::Debug for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "ThreadId(NONE)")
        } else {
            write!(f, "ThreadId(slot={}, gen={})", self.slot(), self.generation())
        }
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "none")
        } else {
            write!(f, "{}.{}", self.slot(), self.generation())
        }
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        ThreadId::NONE
    }
}

//! Error types for heap operations
use thiserror::Error;

use crate::Addr;

/// Result type for heap operations
pub type Result<T> = std::result::Result<T, HeapError>;

/// Everything that can go wrong while initializing or using a heap.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeapError {
  /// No free space large enough for the (aligned) request
  #[error("out of memory: requested {requested} bytes, {available} available")]
  OutOfMemory {
    /// Aligned size of the failed request
    requested: u32,
    /// Largest request that would have succeeded
    available: u32,
  },

  /// The region handed to `init` cannot back a heap
  #[error("invalid heap region {start:#010x}+{size:#x}: {reason}")]
  InvalidRegion {
    start: Addr,
    size: u32,
    reason: &'static str,
  },

  /// An accessor touched bytes outside `[start, end)`
  #[error("access of {len} bytes at {addr:#010x} is outside the heap region")]
  OutOfBounds { addr: Addr, len: u32 },

  /// The pointer handed to `free` cannot have come from this heap
  #[error("invalid free of {addr:#010x}")]
  InvalidFree { addr: Addr },

  /// The block is already on the free list
  #[error("double free of {addr:#010x}")]
  DoubleFree { addr: Addr },

  /// A free-list walk hit a link that cannot be a valid header
  #[error("free list corrupted at {addr:#010x}")]
  CorruptFreeList { addr: Addr },

  /// Size arithmetic does not fit in 32 bits
  #[error("allocation size overflows the 32-bit address space")]
  SizeOverflow,
}

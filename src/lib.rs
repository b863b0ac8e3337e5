//! # heap32 - Heap Allocators for a Fixed 32-bit Memory Region
//!
//! This crate hands out pieces of a single, pre-declared memory range, the
//! way a freestanding runtime without an OS-provided `malloc` does. Two
//! independent policies are offered over the same kind of region:
//!
//! - [`BumpAllocator`]: a monotonic cursor, O(1) allocation, no per-block
//!   metadata, reclaim only by resetting the whole heap.
//! - [`FreeListAllocator`]: an intrusive singly-linked list of free blocks with
//!   first-fit search, block splitting and individual `free`.
//!
//! ## Overview
//!
//! ```text
//!   Bump Allocator:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                         HEAP REGION                                  │
//!   │                                                                      │
//!   │   ┌─────┬─────┬─────┬─────┬───────────────────────────────────────┐  │
//!   │   │ A1  │ A2  │ A3  │ A4  │            Free Space                 │  │
//!   │   └─────┴─────┴─────┴─────┴───────────────────────────────────────┘  │
//!   │   ▲                       ▲                                       ▲  │
//!   │   │                       │                                       │  │
//!   │ start                  cursor                                   end  │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   Free-List Allocator:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │ ┌────┬──────┐┌────┬──────────┐┌────┬──────┐┌────┬─────────────────┐  │
//!   │ │ hdr│ used ││ hdr│  free    ││ hdr│ used ││ hdr│  free           │  │
//!   │ └────┴──────┘└────┴──────────┘└────┴──────┘└────┴─────────────────┘  │
//!   │                 ▲      │                      ▲                      │
//!   │        head ────┘      └──────── next ────────┘                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   heap32
//!   ├── align      - align! macro and checked 4-byte rounding
//!   ├── block      - 8-byte on-heap block header
//!   ├── config     - HeapConfig region descriptor
//!   ├── region     - HeapRegion, the bounds-checked backing bytes
//!   ├── error      - HeapError
//!   ├── heap       - Heap trait shared by both policies
//!   ├── bump       - BumpAllocator
//!   ├── free_list  - FreeListAllocator and free-list inspection
//!   └── sync       - Locked<A> for callers on several threads
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use heap32::{BumpAllocator, FreeListAllocator, HeapConfig};
//!
//! let mut bump = BumpAllocator::init(HeapConfig::new(0x0002_0000, 64)).unwrap();
//! let counters = bump.calloc(4, 4).unwrap();
//! bump.region_mut().write_u32(counters, 42).unwrap();
//! assert_eq!(bump.remaining(), 48);
//!
//! let mut heap = FreeListAllocator::init(HeapConfig::new(0x0002_0000, 64)).unwrap();
//! let name = heap.alloc(10).unwrap();
//! assert_eq!(name, 0x0002_0008);
//! heap.free(name).unwrap();
//! assert_eq!(heap.alloc(8).unwrap(), name);
//! ```
//!
//! ## How It Works
//!
//! The heap is an owned byte buffer standing in for the memory at
//! `[start, start + size)`. Addresses are plain `u32` values, block links
//! are addresses stored inside the buffer, and every access goes through
//! [`HeapRegion`], which checks bounds. Address zero is the null link, so a
//! region can never start there.
//!
//! Free-list blocks carry a header that any tool reading raw heap memory
//! sees verbatim:
//!
//! ```text
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Block Header       │         Payload                │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ size: u32 LE    │  │  ┌──────────────────────────┐  │
//!   │  │ next: u32 LE    │  │  │     size bytes usable    │  │
//!   │  └─────────────────┘  │  └──────────────────────────┘  │
//!   │      8 bytes          │                                │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Address returned to the caller
//! ```
//!
//! Allocation takes the first block that fits. When the block is at least
//! 16 bytes bigger than the request, it is split and the remainder takes the
//! old block's place in the list; otherwise the caller gets the whole block.
//! `free` pushes the block on the head of the list.
//!
//! ## Limitations
//!
//! - **No coalescing**: adjacent free blocks are never merged, so the
//!   free-list heap fragments over time.
//! - **Unchecked frees**: [`FreeListAllocator::free`] trusts its argument the
//!   way C's `free` does. Freeing twice corrupts the list; walks detect the
//!   resulting cycle, and [`FreeListAllocator::free_checked`] refuses it up front.
//! - **Single-threaded**: wrap an allocator in [`Locked`] to share it.
//!
//! ## Logging
//!
//! Operations emit `tracing` events (`debug` for init, reset and exhaustion,
//! `trace` per allocation and free). Install any subscriber to see them.

pub mod align;
mod block;
mod bump;
mod config;
mod error;
mod free_list;
mod heap;
mod region;
mod sync;

/// An address inside the 32-bit address space.
pub type Addr = u32;

pub use block::{Block, HEADER_SIZE, MIN_REMAINDER};
pub use bump::BumpAllocator;
pub use config::{DEFAULT_HEAP_SIZE, DEFAULT_HEAP_START, HeapConfig};
pub use error::{HeapError, Result};
pub use free_list::{FreeBlock, FreeBlocks, FreeListAllocator};
pub use heap::Heap;
pub use region::HeapRegion;
pub use sync::Locked;

use tracing::{debug, trace};

use crate::{
  Addr,
  align::align_up,
  config::HeapConfig,
  error::{HeapError, Result},
  heap::Heap,
  region::HeapRegion,
};

/// Monotonic-cursor allocator with no per-allocation bookkeeping.
///
/// ```text
///   start                cursor                         end
///   │                    │                              │
///   ▼                    ▼                              ▼
///   ┌────┬──────┬────────┬──────────────────────────────┐
///   │ A1 │  A2  │   A3   │         remaining            │
///   └────┴──────┴────────┴──────────────────────────────┘
/// ```
///
/// Individual frees are impossible by construction; [`reset`](Self::reset)
/// reclaims everything at once.
#[derive(Debug, Clone)]
pub struct BumpAllocator {
  region: HeapRegion,
  cursor: Addr,
}

impl BumpAllocator {
  /// Binds a new allocator to the region described by `config`.
  pub fn init(config: HeapConfig) -> Result<Self> {
    let region = HeapRegion::new(config)?;

    debug!(
      start = region.start(),
      size = region.size(),
      "bump allocator initialized"
    );

    Ok(Self {
      cursor: region.start(),
      region,
    })
  }

  /// Returns the current cursor and advances it by `size` rounded up to 4.
  ///
  /// On failure the cursor does not move.
  pub fn alloc(
    &mut self,
    size: u32,
  ) -> Result<Addr> {
    let aligned = align_up(size).ok_or(HeapError::SizeOverflow)?;

    if aligned > self.remaining() {
      debug!(
        requested = aligned,
        remaining = self.remaining(),
        "bump allocator out of memory"
      );

      return Err(HeapError::OutOfMemory {
        requested: aligned,
        available: self.remaining(),
      });
    }

    let addr = self.cursor;
    self.cursor += aligned;

    trace!(addr, size = aligned, "bump alloc");

    Ok(addr)
  }

  /// Allocates `count * size` bytes and zeroes them.
  pub fn calloc(
    &mut self,
    count: u32,
    size: u32,
  ) -> Result<Addr> {
    let total = count.checked_mul(size).ok_or(HeapError::SizeOverflow)?;
    let addr = self.alloc(total)?;

    self.region.fill(addr, total, 0)?;

    Ok(addr)
  }

  /// Does nothing: a bump allocator cannot give back single allocations.
  pub fn free(
    &mut self,
    _addr: Addr,
  ) {
  }

  /// Moves the cursor back to `start`.
  ///
  /// Every address handed out so far becomes invalid; nothing detects
  /// later use of them.
  pub fn reset(&mut self) {
    debug!(
      reclaimed = self.used(),
      "bump allocator reset"
    );

    self.cursor = self.region.start();
  }

  pub fn remaining(&self) -> u32 {
    self.region.end() - self.cursor
  }

  pub fn used(&self) -> u32 {
    self.cursor - self.region.start()
  }

  pub fn capacity(&self) -> u32 {
    self.region.size()
  }

  pub fn start(&self) -> Addr {
    self.region.start()
  }

  pub fn cursor(&self) -> Addr {
    self.cursor
  }

  pub fn end(&self) -> Addr {
    self.region.end()
  }

  pub fn region(&self) -> &HeapRegion {
    &self.region
  }

  pub fn region_mut(&mut self) -> &mut HeapRegion {
    &mut self.region
  }
}

impl Heap for BumpAllocator {
  fn alloc(
    &mut self,
    size: u32,
  ) -> Result<Addr> {
    BumpAllocator::alloc(self, size)
  }

  fn free(
    &mut self,
    addr: Addr,
  ) -> Result<()> {
    BumpAllocator::free(self, addr);
    Ok(())
  }

  fn remaining(&self) -> u32 {
    BumpAllocator::remaining(self)
  }

  fn region(&self) -> &HeapRegion {
    &self.region
  }

  fn region_mut(&mut self) -> &mut HeapRegion {
    &mut self.region
  }
}

use crate::{Addr, error::Result, region::HeapRegion};

/// An allocation policy bound to one [`HeapRegion`].
///
/// Addresses returned by [`alloc`](Heap::alloc) point into the region; use
/// [`region`](Heap::region) / [`region_mut`](Heap::region_mut) to touch the
/// payload.
pub trait Heap {
  /// Hands out at least `size` bytes, rounded up to a multiple of 4.
  fn alloc(
    &mut self,
    size: u32,
  ) -> Result<Addr>;

  /// Gives memory back. Freeing address 0 is a no-op.
  fn free(
    &mut self,
    addr: Addr,
  ) -> Result<()>;

  /// Bytes still available for allocation.
  fn remaining(&self) -> u32;

  fn region(&self) -> &HeapRegion;

  fn region_mut(&mut self) -> &mut HeapRegion;
}

use parking_lot::{Mutex, MutexGuard};

use crate::{Addr, error::Result, heap::Heap};

/// Serializes access to an allocator: every call holds the lock for its
/// whole duration.
///
/// ```rust
/// use heap32::{FreeListAllocator, HeapConfig, Locked};
///
/// let heap = Locked::new(FreeListAllocator::init(HeapConfig::new(0x1000, 64)).unwrap());
///
/// let addr = heap.alloc(10).unwrap();
/// heap.free(addr).unwrap();
/// ```
#[derive(Debug)]
pub struct Locked<A> {
  inner: Mutex<A>,
}

impl<A: Heap> Locked<A> {
  pub fn new(allocator: A) -> Self {
    Self {
      inner: Mutex::new(allocator),
    }
  }

  pub fn alloc(
    &self,
    size: u32,
  ) -> Result<Addr> {
    self.inner.lock().alloc(size)
  }

  pub fn free(
    &self,
    addr: Addr,
  ) -> Result<()> {
    self.inner.lock().free(addr)
  }

  pub fn remaining(&self) -> u32 {
    self.inner.lock().remaining()
  }

  /// Holds the lock across several operations, e.g. allocating and then
  /// writing the payload.
  pub fn lock(&self) -> MutexGuard<'_, A> {
    self.inner.lock()
  }

  pub fn into_inner(self) -> A {
    self.inner.into_inner()
  }
}

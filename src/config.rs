use crate::{
  Addr,
  align::is_aligned,
  error::{HeapError, Result},
};

/// First byte of the heap window on the reference machine; it sits right
/// above code and data.
pub const DEFAULT_HEAP_START: Addr = 0x0002_0000;

/// Size of the heap window on the reference machine (up to `0x0008_0000`,
/// where the stack area begins).
pub const DEFAULT_HEAP_SIZE: u32 = 0x0006_0000;

/// Describes the `[start, start + size)` range a heap is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
  pub start: Addr,
  pub size: u32,
}

impl HeapConfig {
  pub const fn new(
    start: Addr,
    size: u32,
  ) -> Self {
    Self { start, size }
  }

  /// One past the last byte of the region. Only meaningful after
  /// [`validate`](Self::validate) succeeded.
  pub const fn end(&self) -> Addr {
    self.start.wrapping_add(self.size)
  }

  /// Rejects regions no allocator can be bound to.
  ///
  /// Address zero is the null link on the heap, so no region may start there.
  pub fn validate(&self) -> Result<()> {
    if self.start == 0 {
      return Err(self.invalid("region may not start at the null address"));
    }

    if !is_aligned(self.start) {
      return Err(self.invalid("start is not 4-byte aligned"));
    }

    if self.start.checked_add(self.size).is_none() {
      return Err(self.invalid("region extends past the 32-bit address space"));
    }

    Ok(())
  }

  pub(crate) fn invalid(
    &self,
    reason: &'static str,
  ) -> HeapError {
    HeapError::InvalidRegion {
      start: self.start,
      size: self.size,
      reason,
    }
  }
}

impl Default for HeapConfig {
  fn default() -> Self {
    Self::new(DEFAULT_HEAP_START, DEFAULT_HEAP_SIZE)
  }
}

use tracing::{debug, trace};

use crate::{
  Addr,
  align::{align_up, is_aligned},
  block::{Block, HEADER_SIZE, MIN_REMAINDER},
  config::HeapConfig,
  error::{HeapError, Result},
  heap::Heap,
  region::HeapRegion,
};

/// A free block as seen by walking the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBlock {
  /// Header address
  pub addr: Addr,
  /// Payload bytes, excluding the header
  pub size: u32,
  pub next: Option<Addr>,
}

impl FreeBlock {
  /// One past the last payload byte.
  pub fn end(&self) -> u64 {
    Block::new(self.size, self.next).end(self.addr)
  }
}

/// First-fit allocator over an intrusive, singly-linked list of free blocks.
///
/// ```text
///   head
///    │
///    ▼
///   ┌──────┬─────────┐      ┌──────┬──────────────────┐
///   │ 12 ● │ payload │ ───► │ 36 ∅ │ payload          │
///   └──────┴─────────┘      └──────┴──────────────────┘
/// ```
///
/// Freed blocks are pushed on the head and never merged with their
/// neighbours, so they keep their (possibly split-down) size forever.
#[derive(Debug, Clone)]
pub struct FreeListAllocator {
  region: HeapRegion,
  head: Option<Addr>,
}

impl FreeListAllocator {
  /// Binds a new allocator to `config`, turning the whole region into a
  /// single free block.
  pub fn init(config: HeapConfig) -> Result<Self> {
    let mut region = HeapRegion::new(config)?;

    let size = region.size() & !3;
    if size < HEADER_SIZE {
      return Err(config.invalid("region too small for a block header"));
    }

    let start = region.start();
    Block::new(size - HEADER_SIZE, None).write(&mut region, start)?;

    debug!(
      start,
      size = size - HEADER_SIZE,
      "free-list allocator initialized"
    );

    Ok(Self {
      region,
      head: Some(start),
    })
  }

  /// Returns the first free block that fits `size` rounded up to 4 bytes,
  /// splitting it when the leftover can hold a header plus a useful payload.
  ///
  /// On failure the list is left untouched.
  pub fn alloc(
    &mut self,
    size: u32,
  ) -> Result<Addr> {
    let aligned = align_up(size).ok_or(HeapError::SizeOverflow)?;

    let mut prev = None;
    let mut found = None;

    for block in self.free_blocks() {
      let block = block?;

      if block.size >= aligned {
        found = Some(block);
        break;
      }

      prev = Some(block.addr);
    }

    let Some(block) = found else {
      let available = self.largest_free_block();

      debug!(
        requested = aligned,
        available,
        "free-list allocator out of memory"
      );

      return Err(HeapError::OutOfMemory {
        requested: aligned,
        available,
      });
    };

    let split_at = u64::from(aligned) + u64::from(HEADER_SIZE + MIN_REMAINDER);

    // The remainder takes over the consumed node's place in the list.
    let replacement = if u64::from(block.size) >= split_at {
      let remainder_addr = block.addr + HEADER_SIZE + aligned;
      let remainder = Block::new(block.size - aligned - HEADER_SIZE, block.next);

      remainder.write(&mut self.region, remainder_addr)?;
      Block::set_size(&mut self.region, block.addr, aligned)?;

      trace!(
        addr = block.addr,
        size = aligned,
        remainder_addr,
        remainder_size = remainder.size,
        "split free block"
      );

      Some(remainder_addr)
    } else {
      trace!(
        addr = block.addr,
        size = block.size,
        "took whole free block"
      );

      block.next
    };

    self.relink(prev, replacement)?;

    Ok(Block::payload(block.addr))
  }

  /// Pushes the block owning `addr` on the head of the free list.
  ///
  /// `addr` must come from a successful [`alloc`](Self::alloc) on this heap
  /// and must not have been freed since. Addresses that cannot belong to the
  /// region are rejected; freeing a live block twice corrupts the list (see
  /// [`free_checked`](Self::free_checked)).
  pub fn free(
    &mut self,
    addr: Addr,
  ) -> Result<()> {
    if addr == 0 {
      return Ok(());
    }

    let header = self.header_for(addr)?;

    Block::set_next(&mut self.region, header, self.head)?;
    self.head = Some(header);

    trace!(addr = header, "freed block");

    Ok(())
  }

  /// Like [`free`](Self::free), but refuses blocks already on the free list.
  pub fn free_checked(
    &mut self,
    addr: Addr,
  ) -> Result<()> {
    if addr == 0 {
      return Ok(());
    }

    let header = self.header_for(addr)?;

    for block in self.free_blocks() {
      if block?.addr == header {
        return Err(HeapError::DoubleFree { addr });
      }
    }

    self.free(addr)
  }

  /// Size field of the block behind an allocated address.
  pub fn block_size(
    &self,
    addr: Addr,
  ) -> Result<u32> {
    let header = self.header_for(addr)?;
    Ok(Block::read(&self.region, header)?.size)
  }

  pub fn head(&self) -> Option<Addr> {
    self.head
  }

  /// Walks the free list in list order.
  pub fn free_blocks(&self) -> FreeBlocks<'_> {
    FreeBlocks {
      region: &self.region,
      current: self.head,
      steps_left: self.max_blocks(),
    }
  }

  /// Payload bytes on the free list.
  pub fn free_bytes(&self) -> u32 {
    self
      .free_blocks()
      .map_while(Result::ok)
      .fold(0u32, |total, block| total.saturating_add(block.size))
  }

  /// Largest request the next [`alloc`](Self::alloc) can satisfy.
  pub fn largest_free_block(&self) -> u32 {
    self
      .free_blocks()
      .map_while(Result::ok)
      .map(|block| block.size)
      .max()
      .unwrap_or(0)
  }

  /// Checks that the free list is well formed: every link stays inside
  /// the region, sizes are aligned, blocks are pairwise disjoint and the
  /// chain terminates. Returns the number of free blocks.
  pub fn validate(&self) -> Result<usize> {
    let mut blocks = self.free_blocks().collect::<Result<Vec<_>>>()?;

    blocks.sort_by_key(|block| block.addr);

    for pair in blocks.windows(2) {
      if pair[0].end() > u64::from(pair[1].addr) {
        return Err(HeapError::CorruptFreeList { addr: pair[1].addr });
      }
    }

    Ok(blocks.len())
  }

  pub fn region(&self) -> &HeapRegion {
    &self.region
  }

  pub fn region_mut(&mut self) -> &mut HeapRegion {
    &mut self.region
  }

  /// Most headers the region could possibly hold; a longer walk means a cycle.
  fn max_blocks(&self) -> u32 {
    self.region.size() / HEADER_SIZE
  }

  /// Header address for a payload address, rejecting anything that cannot
  /// be a block of this region.
  fn header_for(
    &self,
    addr: Addr,
  ) -> Result<Addr> {
    let invalid = HeapError::InvalidFree { addr };

    let header = Block::header_of(addr).ok_or(invalid.clone())?;
    if !is_aligned(header) {
      return Err(invalid);
    }

    let block = Block::read(&self.region, header).map_err(|_| invalid.clone())?;
    if block.end(header) > u64::from(self.region.end()) {
      return Err(invalid);
    }

    Ok(header)
  }

  fn relink(
    &mut self,
    prev: Option<Addr>,
    next: Option<Addr>,
  ) -> Result<()> {
    match prev {
      None => self.head = next,
      Some(prev) => Block::set_next(&mut self.region, prev, next)?,
    }

    Ok(())
  }
}

impl Heap for FreeListAllocator {
  fn alloc(
    &mut self,
    size: u32,
  ) -> Result<Addr> {
    FreeListAllocator::alloc(self, size)
  }

  fn free(
    &mut self,
    addr: Addr,
  ) -> Result<()> {
    FreeListAllocator::free(self, addr)
  }

  fn remaining(&self) -> u32 {
    self.free_bytes()
  }

  fn region(&self) -> &HeapRegion {
    &self.region
  }

  fn region_mut(&mut self) -> &mut HeapRegion {
    &mut self.region
  }
}

/// Iterator returned by [`FreeListAllocator::free_blocks`].
///
/// Yields one `Err(CorruptFreeList)` and stops when a link cannot be a valid
/// header or the chain is longer than the region could hold.
pub struct FreeBlocks<'a> {
  region: &'a HeapRegion,
  current: Option<Addr>,
  steps_left: u32,
}

impl Iterator for FreeBlocks<'_> {
  type Item = Result<FreeBlock>;

  fn next(&mut self) -> Option<Self::Item> {
    let addr = self.current.take()?;
    let corrupt = HeapError::CorruptFreeList { addr };

    if self.steps_left == 0 || !is_aligned(addr) {
      return Some(Err(corrupt));
    }
    self.steps_left -= 1;

    let block = match Block::read(self.region, addr) {
      Ok(block) => block,
      Err(_) => return Some(Err(corrupt)),
    };

    if !is_aligned(block.size) || block.end(addr) > u64::from(self.region.end()) {
      return Some(Err(corrupt));
    }

    self.current = block.next;

    Some(Ok(FreeBlock {
      addr,
      size: block.size,
      next: block.next,
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const START: Addr = 0x0002_0000;

  fn allocator(size: u32) -> FreeListAllocator {
    FreeListAllocator::init(HeapConfig::new(START, size)).unwrap()
  }

  fn sizes(allocator: &FreeListAllocator) -> Vec<(Addr, u32)> {
    allocator
      .free_blocks()
      .map(|block| block.map(|block| (block.addr, block.size)))
      .collect::<Result<_>>()
      .unwrap()
  }

  #[test]
  fn test_init() {
    let allocator = allocator(64);

    assert_eq!(allocator.head(), Some(START));
    assert_eq!(sizes(&allocator), vec![(START, 56)]);
    assert_eq!(allocator.region().bytes(START, 8).unwrap(), &[56, 0, 0, 0, 0, 0, 0, 0]);
  }

  #[test]
  fn test_init_rounds_size_down() {
    let allocator = allocator(66);

    assert_eq!(sizes(&allocator), vec![(START, 56)]);
  }

  #[test]
  fn test_init_rejects_tiny_region() {
    assert!(matches!(
      FreeListAllocator::init(HeapConfig::new(START, 7)),
      Err(HeapError::InvalidRegion { .. })
    ));

    let empty = allocator(8);
    assert_eq!(sizes(&empty), vec![(START, 0)]);
  }

  #[test]
  fn test_split() {
    let mut allocator = allocator(64);

    let addr = allocator.alloc(10).unwrap();

    assert_eq!(addr, START + 8);
    assert_eq!(allocator.block_size(addr).unwrap(), 12);
    assert_eq!(allocator.head(), Some(START + 20));
    assert_eq!(sizes(&allocator), vec![(START + 20, 36)]);
  }

  #[test]
  fn test_whole_block_is_taken_without_split() {
    let mut allocator = allocator(64);

    // 56 < 44 + 16, so the caller gets all 56 bytes.
    let addr = allocator.alloc(44).unwrap();

    assert_eq!(addr, START + 8);
    assert_eq!(allocator.block_size(addr).unwrap(), 56);
    assert_eq!(allocator.head(), None);
    assert_eq!(allocator.alloc(0), Err(HeapError::OutOfMemory { requested: 0, available: 0 }));
  }

  #[test]
  fn test_exact_split_threshold() {
    let mut allocator = allocator(64);

    // 56 == 40 + 16: split, leaving a remainder with an 8-byte payload.
    allocator.alloc(40).unwrap();

    assert_eq!(sizes(&allocator), vec![(START + 48, 8)]);
  }

  #[test]
  fn test_out_of_memory_leaves_list() {
    let mut allocator = allocator(64);

    allocator.alloc(10).unwrap();
    let before = allocator.region().clone();

    assert_eq!(
      allocator.alloc(40),
      Err(HeapError::OutOfMemory {
        requested: 40,
        available: 36
      })
    );
    assert_eq!(allocator.region(), &before);
    assert_eq!(allocator.head(), Some(START + 20));
  }

  #[test]
  fn test_free_then_reuse() {
    let mut allocator = allocator(64);

    let first = allocator.alloc(10).unwrap();
    allocator.free(first).unwrap();

    assert_eq!(sizes(&allocator), vec![(START, 12), (START + 20, 36)]);

    let again = allocator.alloc(8).unwrap();

    assert_eq!(again, first);
    assert_eq!(allocator.block_size(again).unwrap(), 12);
    assert_eq!(sizes(&allocator), vec![(START + 20, 36)]);
  }

  #[test]
  fn test_first_fit_follows_list_order() {
    let mut allocator = allocator(128);

    let a = allocator.alloc(32).unwrap();
    let b = allocator.alloc(16).unwrap();
    allocator.free(b).unwrap();
    allocator.free(a).unwrap();

    // a (32 bytes) is at the head, so it wins over the better-fitting b.
    let c = allocator.alloc(12).unwrap();

    assert_eq!(c, a);
    assert_eq!(allocator.block_size(c).unwrap(), 12);
  }

  #[test]
  fn test_unlink_from_middle_of_list() {
    let mut allocator = allocator(128);

    let a = allocator.alloc(8).unwrap();
    let b = allocator.alloc(40).unwrap();
    allocator.free(a).unwrap();
    allocator.free(b).unwrap();

    // list: b(40) -> a(8) -> tail(56)
    let tail = START + 64;
    assert_eq!(sizes(&allocator), vec![(b - 8, 40), (a - 8, 8), (tail, 56)]);

    // b is first and 40 >= 8 + 16, so it is split in place at the head.
    let c = allocator.alloc(8).unwrap();
    assert_eq!(c, b);
    assert_eq!(sizes(&allocator), vec![(b + 8, 24), (a - 8, 8), (tail, 56)]);

    // 44 skips the 24- and 8-byte blocks and takes the tail whole.
    let d = allocator.alloc(44).unwrap();
    assert_eq!(d, tail + 8);
    assert_eq!(allocator.block_size(d).unwrap(), 56);
    assert_eq!(sizes(&allocator), vec![(b + 8, 24), (a - 8, 8)]);
  }

  #[test]
  fn test_free_null_is_noop() {
    let mut allocator = allocator(64);

    allocator.free(0).unwrap();
    allocator.free_checked(0).unwrap();

    assert_eq!(sizes(&allocator), vec![(START, 56)]);
  }

  #[test]
  fn test_invalid_free() {
    let mut allocator = allocator(64);

    assert_eq!(allocator.free(4), Err(HeapError::InvalidFree { addr: 4 }));
    assert_eq!(allocator.free(START + 10), Err(HeapError::InvalidFree { addr: START + 10 }));
    assert_eq!(allocator.free(START + 68), Err(HeapError::InvalidFree { addr: START + 68 }));
    assert_eq!(allocator.head(), Some(START));
  }

  #[test]
  fn test_free_checked_detects_double_free() {
    let mut allocator = allocator(64);

    let addr = allocator.alloc(10).unwrap();

    allocator.free_checked(addr).unwrap();

    assert_eq!(allocator.free_checked(addr), Err(HeapError::DoubleFree { addr }));
    assert_eq!(allocator.validate(), Ok(2));
  }

  #[test]
  fn test_double_free_is_caught_by_walks() {
    let mut allocator = allocator(64);

    let addr = allocator.alloc(10).unwrap();
    allocator.free(addr).unwrap();
    allocator.free(addr).unwrap();

    // The header now links to itself.
    assert_eq!(allocator.validate(), Err(HeapError::CorruptFreeList { addr: START }));
    assert_eq!(allocator.alloc(20), Err(HeapError::CorruptFreeList { addr: START }));
  }

  #[test]
  fn test_no_coalescing() {
    let mut allocator = allocator(64);

    let a = allocator.alloc(4).unwrap();
    let b = allocator.alloc(4).unwrap();
    allocator.free(a).unwrap();
    allocator.free(b).unwrap();

    // a and b are physically adjacent but stay two 4-byte blocks.
    assert_eq!(b, a + 12);
    assert_eq!(sizes(&allocator), vec![(b - 8, 4), (a - 8, 4), (START + 24, 32)]);
    assert_eq!(allocator.free_bytes(), 40);
    assert_eq!(allocator.largest_free_block(), 32);
  }
}

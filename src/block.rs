use crate::{Addr, error::Result, region::HeapRegion};

/// Bytes taken by the header in front of every block.
pub const HEADER_SIZE: u32 = 8;

/// Smallest payload worth leaving behind as a free block when splitting.
pub const MIN_REMAINDER: u32 = 8;

/// Block header as it is laid out in heap memory:
///
/// ```text
///   addr      addr + 4   addr + 8
///   ┌─────────┬──────────┬───────────────────────┐
///   │ size    │ next     │ payload (size bytes)  │
///   │ u32 LE  │ u32 LE   │                       │
///   └─────────┴──────────┴───────────────────────┘
/// ```
///
/// `next` is zero for the end of the list. Allocated blocks keep the header
/// but their `next` is meaningless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
  pub size: u32,
  pub next: Option<Addr>,
}

impl Block {
  pub fn new(
    size: u32,
    next: Option<Addr>,
  ) -> Self {
    Self { size, next }
  }

  pub fn encode(&self) -> [u8; HEADER_SIZE as usize] {
    let mut raw = [0; HEADER_SIZE as usize];
    raw[..4].copy_from_slice(&self.size.to_le_bytes());
    raw[4..].copy_from_slice(&self.next.unwrap_or(0).to_le_bytes());
    raw
  }

  pub fn decode(raw: [u8; HEADER_SIZE as usize]) -> Self {
    let size = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
    let next = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);

    Self {
      size,
      next: (next != 0).then_some(next),
    }
  }

  pub fn read(
    region: &HeapRegion,
    addr: Addr,
  ) -> Result<Self> {
    let mut raw = [0; HEADER_SIZE as usize];
    raw.copy_from_slice(region.bytes(addr, HEADER_SIZE)?);
    Ok(Self::decode(raw))
  }

  pub fn write(
    &self,
    region: &mut HeapRegion,
    addr: Addr,
  ) -> Result<()> {
    region
      .bytes_mut(addr, HEADER_SIZE)?
      .copy_from_slice(&self.encode());
    Ok(())
  }

  /// Rewrites only the `size` word of the header at `addr`.
  pub fn set_size(
    region: &mut HeapRegion,
    addr: Addr,
    size: u32,
  ) -> Result<()> {
    region.write_u32(addr, size)
  }

  /// Rewrites only the `next` word of the header at `addr`.
  pub fn set_next(
    region: &mut HeapRegion,
    addr: Addr,
    next: Option<Addr>,
  ) -> Result<()> {
    region.write_u32(addr.wrapping_add(4), next.unwrap_or(0))
  }

  /// Address handed to the caller for the block whose header is at `addr`.
  pub fn payload(addr: Addr) -> Addr {
    addr + HEADER_SIZE
  }

  /// Header address for a payload address, if there is room for one.
  pub fn header_of(payload: Addr) -> Option<Addr> {
    payload.checked_sub(HEADER_SIZE)
  }

  /// One past the last payload byte of the block at `addr`.
  pub fn end(
    &self,
    addr: Addr,
  ) -> u64 {
    u64::from(addr) + u64::from(HEADER_SIZE) + u64::from(self.size)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::HeapConfig;

  #[test]
  fn test_layout() {
    let block = Block::new(56, Some(0x1014));

    assert_eq!(block.encode(), [56, 0, 0, 0, 0x14, 0x10, 0, 0]);
    assert_eq!(Block::decode(block.encode()), block);
  }

  #[test]
  fn test_null_next() {
    let block = Block::new(12, None);

    assert_eq!(block.encode()[4..], [0, 0, 0, 0]);
    assert_eq!(Block::decode(block.encode()).next, None);
  }

  #[test]
  fn test_read_write_in_region() {
    let mut region = HeapRegion::new(HeapConfig::new(0x1000, 64)).unwrap();

    Block::new(36, None).write(&mut region, 0x1014).unwrap();

    assert_eq!(region.read_u32(0x1014).unwrap(), 36);
    assert_eq!(region.read_u32(0x1018).unwrap(), 0);
    assert_eq!(Block::read(&region, 0x1014).unwrap(), Block::new(36, None));
    assert!(Block::read(&region, 0x103C).is_err());

    Block::set_next(&mut region, 0x1014, Some(0x1000)).unwrap();
    Block::set_size(&mut region, 0x1014, 20).unwrap();

    assert_eq!(Block::read(&region, 0x1014).unwrap(), Block::new(20, Some(0x1000)));
  }

  #[test]
  fn test_payload_offsets() {
    assert_eq!(Block::payload(0x1000), 0x1008);
    assert_eq!(Block::header_of(0x1008), Some(0x1000));
    assert_eq!(Block::header_of(4), None);
    assert_eq!(Block::new(12, None).end(0x1000), 0x1014);
  }
}

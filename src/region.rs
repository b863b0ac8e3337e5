use std::ops::Range;

use crate::{
  Addr,
  config::HeapConfig,
  error::{HeapError, Result},
};

/// The bytes a heap manages, addressed by absolute 32-bit addresses.
///
/// ```text
///   address:  start                                     end
///             │                                          │
///             ▼                                          ▼
///   bytes:    [0] [1] [2] ...                    [size - 1]
/// ```
///
/// Every read and write is checked against `[start, end)`.
#[derive(Clone, PartialEq, Eq)]
pub struct HeapRegion {
  start: Addr,
  bytes: Vec<u8>,
}

impl HeapRegion {
  /// Allocates a zeroed buffer standing in for the memory described by `config`.
  pub fn new(config: HeapConfig) -> Result<Self> {
    config.validate()?;

    Ok(Self {
      start: config.start,
      bytes: vec![0; config.size as usize],
    })
  }

  pub fn start(&self) -> Addr {
    self.start
  }

  pub fn end(&self) -> Addr {
    self.start + self.size()
  }

  pub fn size(&self) -> u32 {
    self.bytes.len() as u32
  }

  pub fn contains(
    &self,
    addr: Addr,
    len: u32,
  ) -> bool {
    self.range(addr, len).is_ok()
  }

  fn range(
    &self,
    addr: Addr,
    len: u32,
  ) -> Result<Range<usize>> {
    let out_of_bounds = HeapError::OutOfBounds { addr, len };

    let offset = addr.checked_sub(self.start).ok_or(out_of_bounds.clone())?;

    if u64::from(offset) + u64::from(len) > self.bytes.len() as u64 {
      return Err(out_of_bounds);
    }

    let offset = offset as usize;
    Ok(offset..offset + len as usize)
  }

  pub fn bytes(
    &self,
    addr: Addr,
    len: u32,
  ) -> Result<&[u8]> {
    let range = self.range(addr, len)?;
    Ok(&self.bytes[range])
  }

  pub fn bytes_mut(
    &mut self,
    addr: Addr,
    len: u32,
  ) -> Result<&mut [u8]> {
    let range = self.range(addr, len)?;
    Ok(&mut self.bytes[range])
  }

  /// Reads a little-endian word.
  pub fn read_u32(
    &self,
    addr: Addr,
  ) -> Result<u32> {
    let mut word = [0; 4];
    word.copy_from_slice(self.bytes(addr, 4)?);
    Ok(u32::from_le_bytes(word))
  }

  /// Writes a little-endian word.
  pub fn write_u32(
    &mut self,
    addr: Addr,
    value: u32,
  ) -> Result<()> {
    self.bytes_mut(addr, 4)?.copy_from_slice(&value.to_le_bytes());
    Ok(())
  }

  pub fn fill(
    &mut self,
    addr: Addr,
    len: u32,
    value: u8,
  ) -> Result<()> {
    self.bytes_mut(addr, len)?.fill(value);
    Ok(())
  }

  /// The whole region, byte 0 being `start`.
  pub fn as_bytes(&self) -> &[u8] {
    &self.bytes
  }
}

impl std::fmt::Debug for HeapRegion {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    f.debug_struct("HeapRegion")
      .field("start", &format_args!("{:#010x}", self.start))
      .field("end", &format_args!("{:#010x}", self.end()))
      .finish()
  }
}

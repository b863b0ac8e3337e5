/// Granularity every request is rounded to, in bytes.
pub const WORD_SIZE: u32 = 4;

/// Rounds a byte count up to the next multiple of [`WORD_SIZE`].
///
/// Wraps on overflow, the same way the raw `(n + 3) & !3` expression does.
/// Allocation paths use [`align_up`] instead.
///
/// # Examples
///
/// ```rust
/// use heap32::align;
///
/// assert_eq!(align!(10u32), 12);
/// assert_eq!(align!(12u32), 12);
/// assert_eq!(align!(0u32), 0);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value).wrapping_add($crate::align::WORD_SIZE - 1) & !($crate::align::WORD_SIZE - 1)
  };
}

/// Checked version of [`align!`]: `None` if rounding would overflow `u32`.
pub const fn align_up(value: u32) -> Option<u32> {
  match value.checked_add(WORD_SIZE - 1) {
    Some(v) => Some(v & !(WORD_SIZE - 1)),
    None => None,
  }
}

pub const fn is_aligned(value: u32) -> bool {
  value & (WORD_SIZE - 1) == 0
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_align() {
    let mut alignments = Vec::new();

    for i in 0..10u32 {
      let sizes = (WORD_SIZE * i + 1)..=(WORD_SIZE * (i + 1));

      let expected_alignment = WORD_SIZE * (i + 1);

      alignments.push((sizes, expected_alignment));
    }

    for (sizes, expected) in alignments {
      for size in sizes {
        assert_eq!(expected, align!(size));
        assert_eq!(Some(expected), align_up(size));
      }
    }
  }

  #[test]
  fn test_align_up_overflow() {
    assert_eq!(align_up(u32::MAX), None);
    assert_eq!(align_up(u32::MAX - 2), None);
    assert_eq!(align_up(u32::MAX - 3), Some(u32::MAX - 3));
    assert_eq!(align_up(u32::MAX - 6), Some(u32::MAX - 3));
  }

  #[test]
  fn test_is_aligned() {
    assert!(is_aligned(0));
    assert!(is_aligned(0x0002_0000));
    assert!(!is_aligned(6));
  }
}

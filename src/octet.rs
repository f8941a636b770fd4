//! Small bounds-checked octet helpers shared by the tag, length and TLV
//! codecs. Nothing here is part of the public API.

use crate::{Result, TlvError};

/// Reads a big-endian 16-bit value at `off`.
pub(crate) fn read_u16_be(buf: &[u8], off: usize) -> Result<u16> {
  let b = buf.get(off..off + 2).ok_or(TlvError::OutOfBounds)?;
  Ok(u16::from_be_bytes([b[0], b[1]]))
}

/// Writes a big-endian 16-bit value at `off`.
pub(crate) fn write_u16_be(val: u16, out: &mut [u8], off: usize) -> Result<()> {
  let b = out.get_mut(off..off + 2).ok_or(TlvError::OutOfBounds)?;
  b.copy_from_slice(&val.to_be_bytes());
  Ok(())
}

/// Copies `len` bytes from `src[src_off..]` into `dst[dst_off..]`,
/// reporting an out-of-bounds error instead of panicking if either side
/// is too short.
pub(crate) fn copy_bounded(
  src: &[u8],
  src_off: usize,
  dst: &mut [u8],
  dst_off: usize,
  len: usize,
) -> Result<()> {
  let from = src.get(src_off..src_off + len).ok_or(TlvError::OutOfBounds)?;
  let to = dst.get_mut(dst_off..dst_off + len).ok_or(TlvError::OutOfBounds)?;
  to.copy_from_slice(from);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn u16_round_trip() {
    let mut buf = [0u8; 4];
    write_u16_be(0x1234, &mut buf, 1).unwrap();
    assert_eq!([0, 0x12, 0x34, 0], buf);
    assert_eq!(0x1234, read_u16_be(&buf, 1).unwrap());
  }

  #[test]
  fn out_of_bounds_reads_and_writes() {
    let buf = [0u8; 1];
    assert_eq!(Err(TlvError::OutOfBounds), read_u16_be(&buf, 0));
    let mut out = [0u8; 1];
    assert_eq!(Err(TlvError::OutOfBounds), write_u16_be(1, &mut out, 0));
  }

  #[test]
  fn copy_bounded_checks_both_sides() {
    let src = [1u8, 2, 3];
    let mut dst = [0u8; 2];
    assert_eq!(Err(TlvError::OutOfBounds), copy_bounded(&src, 0, &mut dst, 0, 3));
    copy_bounded(&src, 1, &mut dst, 0, 2).unwrap();
    assert_eq!([2, 3], dst);
  }
}

//! Little-endian integer helpers.
//!
//! Everything multi-byte in a BMP is little-endian. These give back host
//! integers no matter the host's byte order (`from_le_bytes` is a no-op on a
//! little-endian host and a byte swap elsewhere).
//!
//! The slice helpers read the first `size_of::<T>()` bytes and return `None`
//! if the slice is shorter than that, rather than panicking.

use crate::{BmpIoError, BmpSource};
use bytemuck::{bytes_of_mut, Pod, Zeroable};

macro_rules! le_slice_fn {
  ($(#[$m:meta])* $name:ident => $t:ty) => {
    $(#[$m])*
    #[inline]
    #[must_use]
    pub fn $name(bytes: &[u8]) -> Option<$t> {
      const N: usize = core::mem::size_of::<$t>();
      let head: [u8; N] = bytes.get(..N)?.try_into().ok()?;
      Some(<$t>::from_le_bytes(head))
    }
  };
}
le_slice_fn!(
  /// Reads a little-endian `u16` from the start of the slice.
  u16_le => u16
);
le_slice_fn!(
  /// Reads a little-endian `u32` from the start of the slice.
  u32_le => u32
);

/// Assembles up to four bytes into one pixel word.
///
/// Byte 0 (lowest address) lands in the least significant 8 bits. Anything
/// past the fourth byte is ignored.
#[inline]
#[must_use]
pub fn le_pixel_word(bytes: &[u8]) -> u32 {
  u32_le(bytes).unwrap_or_else(|| {
    let low = match u16_le(bytes) {
      Some(half) => u32::from(half),
      None => bytes.first().map_or(0, |&b| u32::from(b)),
    };
    let high = bytes.get(2).map_or(0, |&b| u32::from(b) << 16);
    low | high
  })
}

/// Reads a plain-old-data value from the current position of the source.
#[inline]
pub(crate) fn read_pod<T: Pod, S: BmpSource + ?Sized>(src: &mut S) -> Result<T, BmpIoError> {
  let mut t = T::zeroed();
  src.read_exact(bytes_of_mut(&mut t))?;
  Ok(t)
}

/// Reads one little-endian `u32` from the current position of the source.
#[inline]
pub(crate) fn read_u32_le<S: BmpSource + ?Sized>(src: &mut S) -> Result<u32, BmpIoError> {
  let bytes: [u8; 4] = read_pod(src)?;
  // a full array always converts
  Ok(u32_le(&bytes).unwrap_or_default())
}

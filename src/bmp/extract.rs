//! Turning the rows of the pixel array into RGBA pixels.

use super::{BmpDecodeOptions, BmpInfoHeader, ChannelMasks, ChannelScaling};
use crate::{util::le_pixel_word, BmpError, BmpFormatError, BmpIoError, BmpSource};
use alloc::vec::Vec;
use bitfrob::u8_replicate_bits;
use pixel_formats::r8g8b8a8_Srgb;

/// Bytes per row of pixel data, including the padding out to 4 bytes.
///
/// `None` on overflow.
#[inline]
#[must_use]
pub const fn row_stride(bits_per_pixel: u16, width: u32) -> Option<u64> {
  match (bits_per_pixel as u64).checked_mul(width as u64) {
    Some(bits) => Some(((bits + 31) / 32) * 4),
    None => None,
  }
}

/// Bytes per row of pixel data, *without* the padding.
#[inline]
#[must_use]
const fn row_data_len(bits_per_pixel: u16, width: u32) -> u64 {
  (bits_per_pixel as u64 * width as u64 + 7) / 8
}

/// The right shift that moves a channel mask's lowest set bit down to bit 0.
///
/// An empty mask has no set bits and gets a shift of 0.
#[inline]
#[must_use]
pub const fn mask_shift(mask: u32) -> u32 {
  if mask == 0 {
    0
  } else {
    mask.trailing_zeros()
  }
}

/// One channel's mask, pre-shifted, plus everything needed to pull it out of
/// a pixel word.
#[derive(Debug, Clone, Copy)]
struct Channel {
  mask: u32,
  shift: u32,
  bits: u32,
}
impl Channel {
  #[inline]
  const fn new(mask: u32) -> Self {
    let shift = mask_shift(mask);
    Self { mask, shift, bits: 32 - (mask >> shift).leading_zeros() }
  }

  #[inline]
  fn extract(self, word: u32, scaling: ChannelScaling) -> u8 {
    if self.mask == 0 {
      return 0;
    }
    let v = (word & self.mask) >> self.shift;
    match scaling {
      ChannelScaling::Raw => v as u8,
      ChannelScaling::Expand if self.bits <= 8 => u8_replicate_bits(self.bits, v as u8),
      ChannelScaling::Expand => (v >> (self.bits - 8)) as u8,
    }
  }
}

/// Where each output row (bottom to top) lives in the source.
struct RowPlan {
  pixel_data_offset: u64,
  stride: u64,
  height: u32,
  top_down: bool,
  row_len: usize,
}
impl RowPlan {
  fn new(info: &BmpInfoHeader, pixel_data_offset: u32) -> Result<Self, BmpError> {
    let stride =
      row_stride(info.bits_per_pixel, info.abs_width()).ok_or(BmpFormatError::SizeOverflow)?;
    let row_len = usize::try_from(row_data_len(info.bits_per_pixel, info.abs_width()))
      .map_err(|_| BmpFormatError::SizeOverflow)?;
    Ok(Self {
      pixel_data_offset: u64::from(pixel_data_offset),
      stride,
      height: info.abs_height(),
      top_down: info.is_top_down(),
      row_len,
    })
  }

  /// Offset of the bytes for output row `y`.
  ///
  /// A top-down file stores the bottom row last, so it gets read first.
  #[inline]
  fn offset_of(&self, y: u32) -> Result<u64, BmpFormatError> {
    let file_row = if self.top_down { self.height - 1 - y } else { y };
    u64::from(file_row)
      .checked_mul(self.stride)
      .and_then(|o| o.checked_add(self.pixel_data_offset))
      .ok_or(BmpFormatError::SizeOverflow)
  }

  /// One past the last byte of pixel data that will be read.
  fn end(&self) -> Result<u64, BmpFormatError> {
    match self.height {
      0 => Ok(self.pixel_data_offset),
      h => {
        let last_row = u64::from(h - 1)
          .checked_mul(self.stride)
          .and_then(|o| o.checked_add(self.pixel_data_offset));
        last_row
          .and_then(|o| o.checked_add(self.row_len as u64))
          .ok_or(BmpFormatError::SizeOverflow)
      }
    }
  }

  /// Calls `f` once per row, bottom row first, with that row's unpadded
  /// bytes. The row buffer is reused between calls.
  fn for_each_row<S, F>(&self, src: &mut S, mut f: F) -> Result<(), BmpError>
  where
    S: BmpSource + ?Sized,
    F: FnMut(&[u8]) -> Result<(), BmpError>,
  {
    let mut row: Vec<u8> = Vec::new();
    row.try_reserve_exact(self.row_len)?;
    row.resize(self.row_len, 0);
    for y in 0..self.height {
      src.seek_to(self.offset_of(y)?)?;
      src.read_exact(&mut row)?;
      f(&row)?;
    }
    Ok(())
  }
}

/// Checks that the source is long enough to hold every row of pixel data.
///
/// Done before the output is allocated, so a tiny file can't ask for a huge
/// allocation.
pub(crate) fn check_pixel_data_fits<S: BmpSource + ?Sized>(
  src: &S, info: &BmpInfoHeader, pixel_data_offset: u32,
) -> Result<(), BmpError> {
  let plan = RowPlan::new(info, pixel_data_offset)?;
  let end = plan.end()?;
  if end > src.len() {
    let wanted = usize::try_from(end - plan.pixel_data_offset).unwrap_or(usize::MAX);
    return Err(BmpIoError::UnexpectedEof { offset: plan.pixel_data_offset, wanted }.into());
  }
  Ok(())
}

/// Unpacks indexed pixels, looking each one up in the palette.
///
/// `out` must already have room for `width * height` more pixels.
pub(crate) fn extract_paletted<P, S>(
  src: &mut S, info: &BmpInfoHeader, pixel_data_offset: u32, bits_per_pixel: u8,
  palette: &[r8g8b8a8_Srgb], out: &mut Vec<P>,
) -> Result<(), BmpError>
where
  P: From<r8g8b8a8_Srgb>,
  S: BmpSource + ?Sized,
{
  let plan = RowPlan::new(info, pixel_data_offset)?;
  let width = info.abs_width() as usize;
  let bpp = usize::from(bits_per_pixel);
  let indexes_per_byte = 8 / bpp;
  let index_mask: u8 = ((1_u16 << bpp) - 1) as u8;
  plan.for_each_row(src, |row| {
    for x in 0..width {
      let byte = row[x / indexes_per_byte];
      // leftmost pixel is in the high bits
      let shift = bpp * (indexes_per_byte - 1 - (x % indexes_per_byte));
      let index = (byte >> shift) & index_mask;
      let color = palette.get(usize::from(index)).copied().ok_or(
        BmpFormatError::PaletteIndexOutOfRange { index, palette_len: palette.len() },
      )?;
      out.push(P::from(color));
    }
    Ok(())
  })
}

/// Splits direct color pixels apart into channels according to `masks`.
///
/// `out` must already have room for `width * height` more pixels.
pub(crate) fn extract_direct<P, S>(
  src: &mut S, info: &BmpInfoHeader, pixel_data_offset: u32, bytes_per_pixel: u8,
  masks: ChannelMasks, options: &BmpDecodeOptions, out: &mut Vec<P>,
) -> Result<(), BmpError>
where
  P: From<r8g8b8a8_Srgb>,
  S: BmpSource + ?Sized,
{
  let plan = RowPlan::new(info, pixel_data_offset)?;
  let [r, g, b, a] = masks.to_array().map(Channel::new);
  let scaling = options.channel_scaling;
  plan.for_each_row(src, |row| {
    for px in row.chunks_exact(usize::from(bytes_per_pixel)) {
      let word = le_pixel_word(px);
      out.push(P::from(r8g8b8a8_Srgb {
        r: r.extract(word, scaling),
        g: g.extract(word, scaling),
        b: b.extract(word, scaling),
        a: a.extract(word, scaling),
      }));
    }
    Ok(())
  })
}

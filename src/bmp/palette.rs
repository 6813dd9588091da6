use super::{BmpDecodeOptions, BmpInfoHeader, PaletteAlpha};
use crate::{BmpError, BmpSource};
use alloc::vec::Vec;
use log::{trace, warn};
use pixel_formats::r8g8b8a8_Srgb;

/// How many color table entries an indexed image has.
///
/// `colors_used == 0` means the full table, and anything past the full table
/// can't ever be indexed, so it's not read.
#[inline]
#[must_use]
pub(crate) fn palette_len(info: &BmpInfoHeader, bits_per_pixel: u8) -> usize {
  let full = 1_usize << bits_per_pixel;
  match info.colors_used as usize {
    0 => full,
    n if n > full => {
      warn!("{n} palette entries declared, but {bits_per_pixel}bpp can only index {full}");
      full
    }
    n => n,
  }
}

/// Reads the `[b, g, r, a]` color table that follows the info header.
pub(crate) fn read_palette<S: BmpSource + ?Sized>(
  src: &mut S, info: &BmpInfoHeader, bits_per_pixel: u8, options: &BmpDecodeOptions,
) -> Result<Vec<r8g8b8a8_Srgb>, BmpError> {
  let count = palette_len(info, bits_per_pixel);
  let mut raw: Vec<u8> = Vec::new();
  raw.try_reserve_exact(count * 4)?;
  raw.resize(count * 4, 0);
  src.seek_to(info.palette_offset())?;
  src.read_exact(&mut raw)?;

  let mut palette: Vec<r8g8b8a8_Srgb> = Vec::new();
  palette.try_reserve_exact(count)?;
  palette.extend(raw.chunks_exact(4).map(|entry| match *entry {
    [b, g, r, a] => r8g8b8a8_Srgb { r, g, b, a },
    _ => r8g8b8a8_Srgb::default(),
  }));
  if options.palette_alpha == PaletteAlpha::OpaqueIfAllZero && palette.iter().all(|c| c.a == 0)
  {
    palette.iter_mut().for_each(|c| c.a = 0xFF);
  }
  trace!("palette: {count} entries at offset {}", info.palette_offset());
  Ok(palette)
}

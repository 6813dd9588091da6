use super::{
  extract::{check_pixel_data_fits, extract_direct, extract_paletted},
  palette::read_palette,
  BmpFileHeader, BmpInfoHeader, PixelLayout,
};
use crate::{image::Bitmap, BmpError, BmpFormatError, BmpSource, SliceSource};
use alloc::vec::Vec;
use log::{debug, trace, warn};
use pixel_formats::r8g8b8a8_Srgb;

/// How the decoder turns a masked channel value into an 8-bit channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ChannelScaling {
  /// `(pixel & mask) >> shift`, truncated to 8 bits. A 5-bit channel stays in
  /// `0 ..= 31`.
  #[default]
  Raw,
  /// Like `Raw`, but channels narrower than 8 bits have their bits repeated
  /// to fill all 8 (so a 5-bit 31 becomes 255), and wider channels keep their
  /// top 8 bits.
  Expand,
}

/// What to do with the alpha bytes of the color table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PaletteAlpha {
  /// Use each entry's alpha byte exactly as stored.
  #[default]
  AsStored,
  /// If *every* entry has alpha 0, the file was almost certainly written by
  /// something that doesn't know about alpha, so make them all opaque.
  OpaqueIfAllZero,
}

/// Settings for a [`BmpDecoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BmpDecodeOptions {
  /// Largest width that will be decoded.
  pub max_width: u32,
  /// Largest height that will be decoded.
  pub max_height: u32,
  #[allow(missing_docs)]
  pub channel_scaling: ChannelScaling,
  #[allow(missing_docs)]
  pub palette_alpha: PaletteAlpha,
}
impl BmpDecodeOptions {
  /// Default limit on each of width and height.
  pub const DEFAULT_MAX_DIMENSION: u32 = 1 << 14;

  /// The defaults: raw channel values, palette alpha as stored, and each
  /// dimension limited to [`DEFAULT_MAX_DIMENSION`](Self::DEFAULT_MAX_DIMENSION).
  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self {
      max_width: Self::DEFAULT_MAX_DIMENSION,
      max_height: Self::DEFAULT_MAX_DIMENSION,
      channel_scaling: ChannelScaling::Raw,
      palette_alpha: PaletteAlpha::AsStored,
    }
  }
  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub const fn with_max_dimensions(self, max_width: u32, max_height: u32) -> Self {
    Self { max_width, max_height, ..self }
  }
  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub const fn with_channel_scaling(self, channel_scaling: ChannelScaling) -> Self {
    Self { channel_scaling, ..self }
  }
  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub const fn with_palette_alpha(self, palette_alpha: PaletteAlpha) -> Self {
    Self { palette_alpha, ..self }
  }
}
impl Default for BmpDecodeOptions {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

/// Everything learned from the headers of a BMP, without touching the
/// pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct BmpHeaderInfo {
  pub file_header: BmpFileHeader,
  pub info_header: BmpInfoHeader,
  pub layout: PixelLayout,
}
impl BmpHeaderInfo {
  /// Width in pixels.
  #[inline]
  #[must_use]
  pub const fn width(&self) -> u32 {
    self.info_header.abs_width()
  }
  /// Height in pixels.
  #[inline]
  #[must_use]
  pub const fn height(&self) -> u32 {
    self.info_header.abs_height()
  }
}

/// Decodes BMP data into a [`Bitmap`].
///
/// Decoding is one straight pass: parse the headers, resolve the pixel
/// layout, then extract every row. A decoder holds only its options, so one
/// value can be shared and reused freely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BmpDecoder {
  options: BmpDecodeOptions,
}
impl BmpDecoder {
  /// A decoder with the default options.
  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self { options: BmpDecodeOptions::new() }
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub const fn with_options(options: BmpDecodeOptions) -> Self {
    Self { options }
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub const fn options(&self) -> &BmpDecodeOptions {
    &self.options
  }

  /// Reads and checks the headers, starting from offset 0 of the source.
  pub fn probe<S: BmpSource + ?Sized>(&self, src: &mut S) -> Result<BmpHeaderInfo, BmpError> {
    src.seek_to(0)?;
    let file_header = BmpFileHeader::read_from(src)?;
    let info_header = BmpInfoHeader::read_from(src)?;
    if u64::from(file_header.total_file_size) != src.len() {
      warn!(
        "file header declares {} bytes, source has {}",
        file_header.total_file_size,
        src.len()
      );
    }
    let layout = PixelLayout::resolve(&info_header)?;
    Ok(BmpHeaderInfo { file_header, info_header, layout })
  }

  /// Decodes the whole image.
  ///
  /// The output's row 0 is the bottom row of the image.
  ///
  /// ## Failure
  /// * [`BmpError::Io`] if the source comes up short or a header offset
  ///   points outside of it.
  /// * [`BmpError::Format`] if the headers describe something this decoder
  ///   doesn't support, the image is larger than the configured limits, or a
  ///   pixel references a missing palette entry.
  pub fn decode<P, S>(&self, src: &mut S) -> Result<Bitmap<P>, BmpError>
  where
    P: From<r8g8b8a8_Srgb>,
    S: BmpSource + ?Sized,
  {
    let BmpHeaderInfo { file_header, info_header, layout } = self.probe(src)?;
    let width = info_header.abs_width();
    let height = info_header.abs_height();
    if width > self.options.max_width || height > self.options.max_height {
      return Err(BmpFormatError::DimensionsTooLarge { width, height }.into());
    }
    let pixel_count =
      (width as usize).checked_mul(height as usize).ok_or(BmpFormatError::SizeOverflow)?;
    debug!("decoding {width}x{height} bmp, {layout:?}");

    let mut pixels: Vec<P> = Vec::new();
    if pixel_count == 0 {
      return Ok(Bitmap { width, height, pixels });
    }
    let offset = file_header.pixel_data_offset;
    check_pixel_data_fits(src, &info_header, offset)?;
    pixels.try_reserve_exact(pixel_count)?;
    match layout {
      PixelLayout::Paletted { bits_per_pixel } => {
        let palette = read_palette(src, &info_header, bits_per_pixel, &self.options)?;
        extract_paletted(src, &info_header, offset, bits_per_pixel, &palette, &mut pixels)?;
      }
      PixelLayout::Direct { bytes_per_pixel, masks } => {
        trace!("channel masks: {:08X?}", masks.to_array());
        extract_direct(
          src,
          &info_header,
          offset,
          bytes_per_pixel,
          masks,
          &self.options,
          &mut pixels,
        )?;
      }
    }
    debug_assert_eq!(pixels.len(), pixel_count);
    Ok(Bitmap { width, height, pixels })
  }
}

/// Reads just the headers of a BMP.
#[inline]
pub fn probe_bmp_header<S: BmpSource + ?Sized>(src: &mut S) -> Result<BmpHeaderInfo, BmpError> {
  BmpDecoder::new().probe(src)
}

/// Decodes BMP bytes that are already in memory, with the default options.
#[inline]
pub fn decode_bmp_bytes<P: From<r8g8b8a8_Srgb>>(bytes: &[u8]) -> Result<Bitmap<P>, BmpError> {
  BmpDecoder::new().decode(&mut SliceSource::new(bytes))
}

/// Decodes a BMP from any `Read + Seek` value, with the default options.
#[cfg(feature = "std")]
#[cfg_attr(docs_rs, doc(cfg(feature = "std")))]
pub fn decode_bmp_reader<P, R>(reader: R) -> Result<Bitmap<P>, BmpError>
where
  P: From<r8g8b8a8_Srgb>,
  R: std::io::Read + std::io::Seek,
{
  BmpDecoder::new().decode(&mut crate::IoSource::new(reader)?)
}

/// Opens and decodes a BMP file, with the default options.
#[cfg(feature = "std")]
#[cfg_attr(docs_rs, doc(cfg(feature = "std")))]
pub fn decode_bmp_file<P, Q>(path: Q) -> Result<Bitmap<P>, BmpError>
where
  P: From<r8g8b8a8_Srgb>,
  Q: AsRef<std::path::Path>,
{
  let file = std::fs::File::open(path)?;
  decode_bmp_reader(std::io::BufReader::new(file))
}

impl<P> Bitmap<P>
where
  P: From<r8g8b8a8_Srgb>,
{
  /// Attempts to parse the bytes of a BMP file into a bitmap.
  ///
  /// This is [`decode_bmp_bytes`] as a constructor.
  #[inline]
  pub fn try_from_bmp_bytes(bytes: &[u8]) -> Result<Self, BmpError> {
    decode_bmp_bytes(bytes)
  }
}

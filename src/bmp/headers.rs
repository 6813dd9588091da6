use super::{BI_BITFIELDS, BI_RGB, FILE_HEADER_SIZE, LCS_sRGB};
use crate::{
  util::{read_pod, read_u32_le},
  AsciiArray, BmpError, BmpFormatError, BmpSource,
};
use log::{trace, warn};
use pack1::*;

#[derive(Debug, Clone, Copy, bytemuck::Zeroable, bytemuck::Pod)]
#[repr(C)]
#[allow(dead_code)]
struct RawFileHeader {
  tag: [u8; 2],
  file_size: U32LE,
  reserved1: U16LE,
  reserved2: U16LE,
  pixel_data_offset: U32LE,
}

/// The fields common to every Windows info header, minus the leading size.
#[derive(Debug, Clone, Copy, bytemuck::Zeroable, bytemuck::Pod)]
#[repr(C)]
struct RawInfoFields {
  width: I32LE,
  height: I32LE,
  planes: U16LE,
  bits_per_pixel: U16LE,
  compression: U32LE,
  image_size: U32LE,
  pixels_per_meter_x: I32LE,
  pixels_per_meter_y: I32LE,
  colors_used: U32LE,
  important_colors: U32LE,
}

/// The header at the very start of a BMP file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BmpFileHeader {
  /// Always `BM` for a file that parsed.
  pub tag: AsciiArray<2>,
  /// Declared size of the whole file.
  pub total_file_size: u32,
  /// Offset from the start of the file to the pixel array.
  pub pixel_data_offset: u32,
}
impl BmpFileHeader {
  /// Reads the file header from the current position of the source.
  ///
  /// ## Failure
  /// * The source doesn't have 14 bytes.
  /// * The tag isn't `BM`.
  pub fn read_from<S: BmpSource + ?Sized>(src: &mut S) -> Result<Self, BmpError> {
    let raw: RawFileHeader = read_pod(src)?;
    let tag = AsciiArray(raw.tag);
    if tag.0 != *b"BM" {
      return Err(BmpFormatError::BadMagic(tag).into());
    }
    let out = Self {
      tag,
      total_file_size: raw.file_size.get(),
      pixel_data_offset: raw.pixel_data_offset.get(),
    };
    trace!("{out:?}");
    Ok(out)
  }
}

/// The Windows info header versions, named by their declared byte size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InfoHeaderVersion {
  /// `BITMAPINFOHEADER`, 40 bytes.
  V1,
  /// `BITMAPV2INFOHEADER`, 52 bytes. Adds the RGB masks.
  V2,
  /// `BITMAPV3INFOHEADER`, 56 bytes. Adds the alpha mask.
  V3,
  /// `BITMAPV4HEADER`, 108 bytes. Adds color space info.
  V4,
  /// `BITMAPV5HEADER`, 124 bytes. Adds rendering intent and ICC profile info.
  V5,
}
impl InfoHeaderVersion {
  /// The declared size at which this version starts.
  #[inline]
  #[must_use]
  pub const fn min_size(self) -> u32 {
    match self {
      Self::V1 => 40,
      Self::V2 => 52,
      Self::V3 => 56,
      Self::V4 => 108,
      Self::V5 => 124,
    }
  }

  /// Picks the version from a declared info header size.
  ///
  /// Sizes under 40 are the OS/2 headers, and 64 is the OS/2 2.x header, which
  /// this decoder doesn't handle.
  #[inline]
  pub const fn from_header_size(size: u32) -> Result<Self, BmpFormatError> {
    Ok(match size {
      64 => return Err(BmpFormatError::UnsupportedHeaderSize(size)),
      s if s >= 124 => Self::V5,
      s if s >= 108 => Self::V4,
      s if s >= 56 => Self::V3,
      s if s >= 52 => Self::V2,
      s if s >= 40 => Self::V1,
      _ => return Err(BmpFormatError::UnsupportedHeaderSize(size)),
    })
  }
}

/// The compression modes this decoder handles.
///
/// Every other compression code gets rejected while parsing the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BmpCompression {
  /// `BI_RGB`: uncompressed, fixed channel layout.
  Rgb,
  /// `BI_BITFIELDS`: uncompressed, with explicit channel bitmasks.
  Bitfields,
}
impl TryFrom<u32> for BmpCompression {
  type Error = BmpFormatError;
  #[inline]
  fn try_from(value: u32) -> Result<Self, Self::Error> {
    match value {
      BI_RGB => Ok(Self::Rgb),
      BI_BITFIELDS => Ok(Self::Bitfields),
      other => Err(BmpFormatError::UnsupportedCompression(other)),
    }
  }
}
impl From<BmpCompression> for u32 {
  #[inline]
  fn from(c: BmpCompression) -> Self {
    match c {
      BmpCompression::Rgb => BI_RGB,
      BmpCompression::Bitfields => BI_BITFIELDS,
    }
  }
}

/// The info header, with the version-dependent parts as `Option` fields.
///
/// An extension field is `Some` exactly when the file actually carried it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BmpInfoHeader {
  /// The size the header declared for itself.
  pub header_size: u32,
  /// The version implied by `header_size`.
  pub version: InfoHeaderVersion,
  /// Width in pixels. Never negative once parsed.
  pub width: i32,
  /// Height in pixels. Negative means the rows are stored top to bottom.
  pub height: i32,
  /// Should be 1, but nobody checks.
  pub planes: u16,
  /// Bits per pixel.
  pub bits_per_pixel: u16,
  /// How the pixel data is stored.
  pub compression: BmpCompression,
  /// Size of the pixel data in bytes. Often 0 for uncompressed images.
  pub image_size: u32,
  #[allow(missing_docs)]
  pub pixels_per_meter_x: i32,
  #[allow(missing_docs)]
  pub pixels_per_meter_y: i32,
  /// Palette entries used. 0 means the full `2**bits_per_pixel`.
  pub colors_used: u32,
  /// Ignored.
  pub important_colors: u32,
  /// Red, green, and blue masks, if the file had them.
  pub rgb_masks: Option<[u32; 3]>,
  /// The alpha mask, if the header is V3 or later.
  pub alpha_mask: Option<u32>,
  /// The color space tag, if the header is V4 or later.
  pub colorspace: Option<u32>,
}
impl BmpInfoHeader {
  /// Reads the info header (and any masks appended to it) from the current
  /// position of the source, which must be just after the file header.
  ///
  /// ## Failure
  /// * Any read comes up short.
  /// * The header size isn't a Windows info header size.
  /// * The width is negative.
  /// * The compression isn't `BI_RGB` or `BI_BITFIELDS`.
  /// * A V4+ header has a color space other than sRGB.
  pub fn read_from<S: BmpSource + ?Sized>(src: &mut S) -> Result<Self, BmpError> {
    let header_size = read_u32_le(src)?;
    let version = InfoHeaderVersion::from_header_size(header_size)?;
    let raw: RawInfoFields = read_pod(src)?;
    trace!("info header: size={header_size}, {version:?}, {raw:?}");

    let width = raw.width.get();
    if width < 0 {
      return Err(BmpFormatError::NegativeWidth(width).into());
    }
    let compression = BmpCompression::try_from(raw.compression.get())?;
    let planes = raw.planes.get();
    if planes != 1 {
      warn!("info header declares {planes} color planes, expected 1");
    }

    // The extensions follow in a fixed order, so each one is only read if the
    // one before it was. A plain 40 byte header can be followed by 12 bytes of
    // BI_BITFIELDS masks.
    let appended_masks =
      header_size == InfoHeaderVersion::V1.min_size() && compression == BmpCompression::Bitfields;
    let rgb_masks = if version >= InfoHeaderVersion::V2 || appended_masks {
      let r = read_u32_le(src)?;
      let g = read_u32_le(src)?;
      let b = read_u32_le(src)?;
      Some([r, g, b])
    } else {
      None
    };
    let alpha_mask =
      if version >= InfoHeaderVersion::V3 { Some(read_u32_le(src)?) } else { None };
    let colorspace =
      if version >= InfoHeaderVersion::V4 { Some(read_u32_le(src)?) } else { None };
    trace!("masks: rgb={rgb_masks:X?}, a={alpha_mask:X?}, colorspace={colorspace:X?}");
    if let Some(cs) = colorspace {
      if cs != LCS_sRGB {
        return Err(BmpFormatError::ColorspaceNotSrgb(cs).into());
      }
    }

    Ok(Self {
      header_size,
      version,
      width,
      height: raw.height.get(),
      planes,
      bits_per_pixel: raw.bits_per_pixel.get(),
      compression,
      image_size: raw.image_size.get(),
      pixels_per_meter_x: raw.pixels_per_meter_x.get(),
      pixels_per_meter_y: raw.pixels_per_meter_y.get(),
      colors_used: raw.colors_used.get(),
      important_colors: raw.important_colors.get(),
      rgb_masks,
      alpha_mask,
      colorspace,
    })
  }

  /// If the rows are stored top row first.
  #[inline]
  #[must_use]
  pub const fn is_top_down(&self) -> bool {
    self.height < 0
  }

  /// Width in pixels.
  #[inline]
  #[must_use]
  pub const fn abs_width(&self) -> u32 {
    self.width.unsigned_abs()
  }

  /// Height in pixels, regardless of row order.
  #[inline]
  #[must_use]
  pub const fn abs_height(&self) -> u32 {
    self.height.unsigned_abs()
  }

  /// If the RGB masks live in 12 extra bytes after a 40 byte header, rather
  /// than inside the header.
  #[inline]
  #[must_use]
  pub const fn has_appended_masks(&self) -> bool {
    self.header_size == 40 && self.rgb_masks.is_some()
  }

  /// Where the color table starts, in bytes from the start of the file.
  ///
  /// Only paletted images have a color table, and those never carry masks.
  #[inline]
  #[must_use]
  pub const fn palette_offset(&self) -> u64 {
    FILE_HEADER_SIZE as u64 + self.header_size as u64
  }
}

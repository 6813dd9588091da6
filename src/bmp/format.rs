use super::{BmpCompression, BmpInfoHeader, InfoHeaderVersion};
use crate::BmpFormatError;
use log::{trace, warn};

/// Bitmasks locating each channel within a direct color pixel.
///
/// A zero mask means the channel isn't stored, and it decodes as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct ChannelMasks {
  pub r: u32,
  pub g: u32,
  pub b: u32,
  pub a: u32,
}
impl ChannelMasks {
  /// `[b,g,r]` bytes, no alpha.
  pub const BGR24: Self = Self { r: 0x00FF_0000, g: 0x0000_FF00, b: 0x0000_00FF, a: 0 };

  /// The masks as `[r, g, b, a]`.
  #[inline]
  #[must_use]
  pub const fn to_array(self) -> [u32; 4] {
    [self.r, self.g, self.b, self.a]
  }

  /// The masks to use when a 16 or 32 bit image doesn't give any.
  ///
  /// Alpha only gets a default for headers older than V3, since a V3+ header
  /// could have declared an alpha mask and chose not to.
  #[inline]
  #[must_use]
  pub const fn default_for(bits_per_pixel: u16, version: InfoHeaderVersion) -> Self {
    let legacy_alpha = (version as u8) < (InfoHeaderVersion::V3 as u8);
    match bits_per_pixel {
      16 => Self {
        r: 0x7C00,
        g: 0x03E0,
        b: 0x001F,
        a: if legacy_alpha { 0x8000 } else { 0 },
      },
      32 => Self {
        r: 0x00FF_0000,
        g: 0x0000_FF00,
        b: 0x0000_00FF,
        a: if legacy_alpha { 0xFF00_0000 } else { 0 },
      },
      _ => Self::BGR24,
    }
  }
}

/// How the pixel data of an image is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelLayout {
  /// 1, 2, 4, or 8 bit indexes into the color table.
  Paletted {
    /// Bits per index.
    bits_per_pixel: u8,
  },
  /// 2, 3, or 4 byte little-endian pixels split apart by channel masks.
  Direct {
    /// Bytes per pixel.
    bytes_per_pixel: u8,
    /// The finished channel masks.
    masks: ChannelMasks,
  },
}
impl PixelLayout {
  /// Decides how to extract the pixels described by an info header.
  ///
  /// ## Failure
  /// * The bit depth isn't one of 1, 2, 4, 8, 16, 24, or 32.
  /// * `BI_BITFIELDS` on an indexed color depth.
  /// * `BI_BITFIELDS` on a 16 or 32 bit image whose header carried no masks.
  pub fn resolve(info: &BmpInfoHeader) -> Result<Self, BmpFormatError> {
    let bpp = info.bits_per_pixel;
    let layout = match (bpp, info.compression) {
      (1 | 2 | 4 | 8, BmpCompression::Bitfields) => {
        return Err(BmpFormatError::UnsupportedCompression(BmpCompression::Bitfields.into()))
      }
      (1 | 2 | 4 | 8, BmpCompression::Rgb) => Self::Paletted { bits_per_pixel: bpp as u8 },
      (24, compression) => {
        if compression == BmpCompression::Bitfields {
          warn!("24bpp image declares BI_BITFIELDS, ignoring the masks");
        }
        Self::Direct { bytes_per_pixel: 3, masks: ChannelMasks::BGR24 }
      }
      (16 | 32, BmpCompression::Rgb) => Self::Direct {
        bytes_per_pixel: (bpp / 8) as u8,
        masks: ChannelMasks::default_for(bpp, info.version),
      },
      (16 | 32, BmpCompression::Bitfields) => {
        // only a 40 byte header has masks appended after it
        let Some([r, g, b]) = info.rgb_masks else {
          return Err(BmpFormatError::UnsupportedCompression(BmpCompression::Bitfields.into()));
        };
        let a = info.alpha_mask.unwrap_or(0);
        Self::Direct { bytes_per_pixel: (bpp / 8) as u8, masks: ChannelMasks { r, g, b, a } }
      }
      _ => return Err(BmpFormatError::UnsupportedBitDepth(bpp)),
    };
    trace!("pixel layout: {layout:X?}");
    Ok(layout)
  }

  /// Bits per pixel of this layout.
  #[inline]
  #[must_use]
  pub const fn bits_per_pixel(&self) -> u16 {
    match self {
      Self::Paletted { bits_per_pixel } => *bits_per_pixel as u16,
      Self::Direct { bytes_per_pixel, .. } => *bytes_per_pixel as u16 * 8,
    }
  }
}

use crate::AsciiArray;
use core::fmt;

/// The byte source couldn't give us the bytes we asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum BmpIoError {
  /// A read ran off the end of the source.
  UnexpectedEof {
    /// Absolute position the read started at.
    offset: u64,
    /// How many bytes the read wanted.
    wanted: usize,
  },

  /// An absolute seek went past the end of the source.
  SeekOutOfBounds {
    /// The requested position.
    offset: u64,
    /// The length of the source.
    len: u64,
  },

  /// Any other failure from the operating system (opening a file, a reader
  /// returning an error, and so on).
  #[cfg(feature = "std")]
  #[cfg_attr(docs_rs, doc(cfg(feature = "std")))]
  Os(std::io::ErrorKind),
}

/// The bytes were readable, but they aren't a BMP that this crate decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum BmpFormatError {
  /// The file doesn't start with `BM`.
  BadMagic(AsciiArray<2>),

  /// The info header declares a size that isn't one of the Windows header
  /// versions (this includes all of the OS/2 headers).
  UnsupportedHeaderSize(u32),

  /// Compression other than `BI_RGB` or `BI_BITFIELDS`, or `BI_BITFIELDS`
  /// paired with an indexed color bit depth.
  UnsupportedCompression(u32),

  /// A V4 or V5 header named a color space other than sRGB.
  ColorspaceNotSrgb(u32),

  /// The bits per pixel isn't 1, 2, 4, 8, 16, 24, or 32.
  UnsupportedBitDepth(u16),

  /// The header declared a negative width.
  NegativeWidth(i32),

  /// A pixel referenced a palette entry that the file doesn't have.
  PaletteIndexOutOfRange {
    /// The index found in the pixel data.
    index: u8,
    /// How many entries the palette has.
    palette_len: usize,
  },

  /// The image is larger than the decoder is configured to allow.
  DimensionsTooLarge {
    /// Width in pixels.
    width: u32,
    /// Height in pixels.
    height: u32,
  },

  /// An offset or size computed from header fields overflowed.
  SizeOverflow,

  /// The allocator couldn't give us enough space for the output.
  Alloc,
}

/// An error from decoding a BMP.
///
/// Every error is one of two broad kinds. The decoder never hands back
/// partial pixel data alongside an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BmpError {
  /// Reading or seeking the source failed.
  Io(BmpIoError),
  /// The file content is malformed or unsupported.
  Format(BmpFormatError),
}
impl BmpError {
  /// If this is an [`Io`](BmpError::Io) error.
  #[inline]
  #[must_use]
  pub const fn is_io(&self) -> bool {
    matches!(self, Self::Io(_))
  }
  /// If this is a [`Format`](BmpError::Format) error.
  #[inline]
  #[must_use]
  pub const fn is_format(&self) -> bool {
    matches!(self, Self::Format(_))
  }
}

impl From<BmpIoError> for BmpError {
  #[inline]
  fn from(e: BmpIoError) -> Self {
    Self::Io(e)
  }
}
impl From<BmpFormatError> for BmpError {
  #[inline]
  fn from(e: BmpFormatError) -> Self {
    Self::Format(e)
  }
}
impl From<alloc::collections::TryReserveError> for BmpError {
  #[inline]
  fn from(_: alloc::collections::TryReserveError) -> Self {
    Self::Format(BmpFormatError::Alloc)
  }
}
#[cfg(feature = "std")]
impl From<std::io::Error> for BmpIoError {
  #[inline]
  fn from(e: std::io::Error) -> Self {
    Self::Os(e.kind())
  }
}
#[cfg(feature = "std")]
impl From<std::io::Error> for BmpError {
  #[inline]
  fn from(e: std::io::Error) -> Self {
    Self::Io(e.into())
  }
}

impl fmt::Display for BmpIoError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::UnexpectedEof { offset, wanted } => {
        write!(f, "unexpected end of input reading {wanted} bytes at offset {offset}")
      }
      Self::SeekOutOfBounds { offset, len } => {
        write!(f, "seek to offset {offset} is past the end of the source ({len} bytes)")
      }
      #[cfg(feature = "std")]
      Self::Os(kind) => write!(f, "i/o error: {kind}"),
    }
  }
}
impl fmt::Display for BmpFormatError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::BadMagic(tag) => write!(f, "not a BMP file (tag {tag:?})"),
      Self::UnsupportedHeaderSize(size) => write!(f, "unsupported info header size: {size}"),
      Self::UnsupportedCompression(c) => write!(f, "unsupported compression: {c}"),
      Self::ColorspaceNotSrgb(cs) => write!(f, "unsupported color space: {cs:#010X}"),
      Self::UnsupportedBitDepth(bpp) => write!(f, "unsupported bits per pixel: {bpp}"),
      Self::NegativeWidth(w) => write!(f, "negative width: {w}"),
      Self::PaletteIndexOutOfRange { index, palette_len } => {
        write!(f, "palette index {index} out of range (palette has {palette_len} entries)")
      }
      Self::DimensionsTooLarge { width, height } => {
        write!(f, "image dimensions {width}x{height} exceed the configured limit")
      }
      Self::SizeOverflow => f.write_str("image size calculation overflowed"),
      Self::Alloc => f.write_str("allocation failed"),
    }
  }
}
impl fmt::Display for BmpError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Io(e) => fmt::Display::fmt(e, f),
      Self::Format(e) => fmt::Display::fmt(e, f),
    }
  }
}

#[cfg(feature = "std")]
impl std::error::Error for BmpIoError {}
#[cfg(feature = "std")]
impl std::error::Error for BmpFormatError {}
#[cfg(feature = "std")]
impl std::error::Error for BmpError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Io(e) => Some(e),
      Self::Format(e) => Some(e),
    }
  }
}

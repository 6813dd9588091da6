#![allow(non_upper_case_globals)]

//! Module for Windows Bitmap files (BMP).
//!
//! ## Parsing The Format
//!
//! Note: All multi-byte values in BMP are always little-endian encoded.
//!
//! * A bitmap file always starts with a "file header". This is always 14 bytes.
//!   * A tag for the kind of bitmap you're expected to find (`BM`).
//!   * A total size of the file, to check if a file was unexpectedly
//!     truncated.
//!   * Two reserved `u16` values.
//!   * The position of the pixel data within the file.
//! * Next is an "info header". There's many versions of this header. The first
//!   4 bytes are always the size of the full info header, and each version is a
//!   different size, so this lets you figure out what version is being used for
//!   this file. See [InfoHeaderVersion] for the sizes this decoder accepts.
//! * Newer versions of the info header carry the channel bitmasks inside the
//!   header itself. A V1 header with [BmpCompression::Bitfields] instead has
//!   three `u32` masks (R, G, B) appended right after it.
//! * Next there **might** be a color table. This is mandatory if the bit depth
//!   is 8 (or less) bits per pixel. The default number of entries is
//!   `2**bits_per_pixel`, though the header can declare a smaller table. Each
//!   entry is `[b, g, r, a]`.
//! * Next there **might** be a gap in the data. The offset of the pixel array
//!   was given in the file header, use that to skip past the gap (if any).
//! * Next there is the pixel array. Each row is padded to a multiple of 4
//!   bytes. A positive height means the first row stored is the bottom row of
//!   the image, a negative height means the first row stored is the top row.
//!
//! When the bits per pixel is less than 8 the pixels will be packed within a
//! byte. In this case, the leftmost pixel is the highest bits of the byte.
//! * 1, 2, 4, and 8 bits per pixel are indexed color.
//! * 16 and 32 bits per pixel is direct color, with the bitmasks defining the
//!   location of each channel within a (little-endian) `u16` or `u32`.
//! * 24 bits per pixel is direct color and the channel order is always implied
//!   to be `[b,g,r]` within `[u8; 3]`.
//!
//! ## What This Decoder Supports
//!
//! Only the uncompressed encodings (`BI_RGB` and `BI_BITFIELDS`) of the Windows
//! header family, V1 through V5. V4 and V5 headers must declare the sRGB color
//! space. Everything else is rejected with a [BmpFormatError](crate::BmpFormatError).

mod decoder;
mod extract;
mod format;
mod headers;
mod palette;

pub use decoder::*;
pub use extract::{mask_shift, row_stride};
pub use format::*;
pub use headers::*;

/// Size of the file header, in bytes.
pub const FILE_HEADER_SIZE: u32 = 14;

pub(crate) const BI_RGB: u32 = 0;
pub(crate) const BI_BITFIELDS: u32 = 3;
pub(crate) const LCS_sRGB: u32 = 0x7352_4742;

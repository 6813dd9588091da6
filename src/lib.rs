#![no_std]
#![cfg_attr(docs_rs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! A crate for decoding Windows Bitmap (BMP) files.
//!
//! The decoder reads from any [`BmpSource`] (an in-memory slice, or with the
//! `std` feature anything that's `Read + Seek`) and produces a [`Bitmap`] of
//! RGBA pixels. Output row 0 is always the *bottom* row of the image, no
//! matter which scan direction the file itself used.
//!
//! ```no_run
//! # fn main() -> Result<(), bmpload::BmpError> {
//! let bytes: &[u8] = &[];
//! let bitmap: bmpload::Bitmap = bmpload::decode_bmp_bytes(bytes)?;
//! println!("{}x{}", bitmap.width, bitmap.height);
//! # Ok(())
//! # }
//! ```

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

pub mod ascii_array;
pub use ascii_array::*;

mod error;
pub use error::*;

pub mod util;

mod source;
pub use source::*;

pub mod image;
pub use image::*;

pub mod bmp;
pub use bmp::{
  decode_bmp_bytes, probe_bmp_header, BmpDecodeOptions, BmpDecoder, ChannelScaling, PaletteAlpha,
};
#[cfg(feature = "std")]
pub use bmp::{decode_bmp_file, decode_bmp_reader};

/// The 8-bit sRGB color type that the decoder produces.
pub use pixel_formats::r8g8b8a8_Srgb as Rgba8;

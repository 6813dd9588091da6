use crate::BmpIoError;

/// A seekable, byte-addressable source of BMP file data.
///
/// The decoder reads the palette and pixel rows from absolute offsets given
/// by header fields, so it needs random access rather than a plain stream. If
/// you've only got a stream, read the whole thing into a buffer and use
/// [`SliceSource`].
pub trait BmpSource {
  /// Moves the read position to `offset` bytes from the start.
  ///
  /// Seeking past the end of the source is an error.
  fn seek_to(&mut self, offset: u64) -> Result<(), BmpIoError>;

  /// Fills all of `buf` from the current position, advancing it.
  fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), BmpIoError>;

  /// The total length of the source in bytes.
  fn len(&self) -> u64;

  /// If the source has no bytes at all.
  #[inline]
  fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl<S: BmpSource + ?Sized> BmpSource for &mut S {
  #[inline]
  fn seek_to(&mut self, offset: u64) -> Result<(), BmpIoError> {
    (**self).seek_to(offset)
  }
  #[inline]
  fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), BmpIoError> {
    (**self).read_exact(buf)
  }
  #[inline]
  fn len(&self) -> u64 {
    (**self).len()
  }
}

/// A [`BmpSource`] over bytes that are already in memory.
#[derive(Debug, Clone)]
pub struct SliceSource<'b> {
  bytes: &'b [u8],
  pos: usize,
}
impl<'b> SliceSource<'b> {
  /// Starts reading at the beginning of `bytes`.
  #[inline]
  #[must_use]
  pub const fn new(bytes: &'b [u8]) -> Self {
    Self { bytes, pos: 0 }
  }
}
impl BmpSource for SliceSource<'_> {
  #[inline]
  fn seek_to(&mut self, offset: u64) -> Result<(), BmpIoError> {
    match usize::try_from(offset) {
      Ok(pos) if pos <= self.bytes.len() => {
        self.pos = pos;
        Ok(())
      }
      _ => Err(BmpIoError::SeekOutOfBounds { offset, len: self.len() }),
    }
  }
  #[inline]
  fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), BmpIoError> {
    let end = self.pos.checked_add(buf.len());
    match end.and_then(|end| self.bytes.get(self.pos..end)) {
      Some(src) => {
        buf.copy_from_slice(src);
        self.pos += buf.len();
        Ok(())
      }
      None => Err(BmpIoError::UnexpectedEof { offset: self.pos as u64, wanted: buf.len() }),
    }
  }
  #[inline]
  fn len(&self) -> u64 {
    self.bytes.len() as u64
  }
}

#[cfg(feature = "std")]
pub use io_source::IoSource;

#[cfg(feature = "std")]
mod io_source {
  use super::BmpSource;
  use crate::BmpIoError;
  use std::io::{ErrorKind, Read, Seek, SeekFrom};

  /// A [`BmpSource`] over any `Read + Seek` value, such as a
  /// [`File`](std::fs::File) or a [`Cursor`](std::io::Cursor).
  ///
  /// Offsets are relative to the reader's position when the source was
  /// made, so a BMP embedded partway into a larger stream works too.
  #[derive(Debug)]
  #[cfg_attr(docs_rs, doc(cfg(feature = "std")))]
  pub struct IoSource<R> {
    reader: R,
    base: u64,
    pos: u64,
    len: u64,
  }
  impl<R: Read + Seek> IoSource<R> {
    /// Wraps a reader, measuring how many bytes remain in it.
    pub fn new(mut reader: R) -> Result<Self, BmpIoError> {
      let base = reader.stream_position()?;
      let end = reader.seek(SeekFrom::End(0))?;
      reader.seek(SeekFrom::Start(base))?;
      Ok(Self { reader, base, pos: 0, len: end.saturating_sub(base) })
    }

    /// Unwraps the reader.
    #[inline]
    pub fn into_inner(self) -> R {
      self.reader
    }
  }
  impl<R: Read + Seek> BmpSource for IoSource<R> {
    fn seek_to(&mut self, offset: u64) -> Result<(), BmpIoError> {
      if offset > self.len {
        return Err(BmpIoError::SeekOutOfBounds { offset, len: self.len });
      }
      let abs = self.base.checked_add(offset).ok_or(BmpIoError::SeekOutOfBounds {
        offset,
        len: self.len,
      })?;
      self.reader.seek(SeekFrom::Start(abs))?;
      self.pos = offset;
      Ok(())
    }
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), BmpIoError> {
      match self.reader.read_exact(buf) {
        Ok(()) => {
          self.pos += buf.len() as u64;
          Ok(())
        }
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
          Err(BmpIoError::UnexpectedEof { offset: self.pos, wanted: buf.len() })
        }
        Err(e) => Err(e.into()),
      }
    }
    #[inline]
    fn len(&self) -> u64 {
      self.len
    }
  }
}

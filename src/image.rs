//! Provides the heap-allocated image type that decoding produces.

use alloc::vec::Vec;
use pixel_formats::r8g8b8a8_Srgb;

/// Converts an `(x,y)` position within a given `width` 2D space into a linear
/// index.
///
/// This is how [`Bitmap`] turns 2d coordinates into index values within its
/// pixel vector. If you'd like to use the exact same function for some reason,
/// you can.
#[inline]
#[must_use]
pub const fn xy_width_to_index(x: u32, y: u32, width: u32) -> usize {
  (y as usize).wrapping_mul(width as usize).wrapping_add(x as usize)
}

/// An owned direct-color image.
///
/// Pixels are row-major and **row 0 is the bottom row**, the way BMP files
/// think about things. Use [`to_top_down`](Self::to_top_down) if you want the
/// other way around.
///
/// The fields are public, but if you put them together weirdly the methods of
/// this type might return `None` or do nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub struct Bitmap<P = r8g8b8a8_Srgb> {
  pub width: u32,
  pub height: u32,
  pub pixels: Vec<P>,
}
impl<P> Bitmap<P> {
  /// Gets the pixel at the position, or `None` if the position is out of
  /// bounds. `y = 0` is the bottom row.
  #[inline]
  #[must_use]
  pub fn get(&self, x: u32, y: u32) -> Option<&P> {
    if x < self.width && y < self.height {
      self.pixels.get(xy_width_to_index(x, y, self.width))
    } else {
      None
    }
  }

  /// Gets the pixel at the position, or `None` if the position is out of
  /// bounds.
  #[inline]
  #[must_use]
  pub fn get_mut(&mut self, x: u32, y: u32) -> Option<&mut P> {
    if x < self.width && y < self.height {
      let i = xy_width_to_index(x, y, self.width);
      self.pixels.get_mut(i)
    } else {
      None
    }
  }

  /// One full row of pixels, or `None` if `y` is out of bounds.
  #[inline]
  #[must_use]
  pub fn row(&self, y: u32) -> Option<&[P]> {
    if y < self.height {
      let start = xy_width_to_index(0, y, self.width);
      self.pixels.get(start..start + self.width as usize)
    } else {
      None
    }
  }

  /// Flips the image top to bottom.
  ///
  /// If the buffer contains less pixels than `width * height` would indicate,
  /// this will do nothing.
  #[inline]
  pub fn vertical_flip(&mut self) {
    let w = self.width as usize;
    let num_pixels = w.saturating_mul(self.height as usize);
    if w == 0 {
      return;
    }
    if let Some(mut data) = self.pixels.get_mut(..num_pixels) {
      let mut temp_height = self.height;
      while temp_height > 1 {
        let (low, mid) = data.split_at_mut(w);
        let (mid, high) = mid.split_at_mut(mid.len() - w);
        low.swap_with_slice(high);
        data = mid;
        temp_height -= 2;
      }
    }
  }
}
impl<P: Clone> Bitmap<P> {
  /// A copy of this image with row 0 as the *top* row, for display code that
  /// wants a top-left origin.
  #[inline]
  #[must_use]
  pub fn to_top_down(&self) -> Self {
    let mut out = self.clone();
    out.vertical_flip();
    out
  }
}

/// Converts an 8-bit color into `[r, g, b, a]` floats in `0.0 ..= 1.0`.
#[inline]
#[must_use]
pub fn rgba8_to_unit_f32(c: r8g8b8a8_Srgb) -> [f32; 4] {
  let f = |u: u8| f32::from(u) / 255.0;
  [f(c.r), f(c.g), f(c.b), f(c.a)]
}

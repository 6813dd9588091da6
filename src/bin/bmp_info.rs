//! Prints the headers of each BMP file given on the command line, then tries
//! to decode it.

use bmpload::{bmp::PixelLayout, BmpDecoder, BmpError, IoSource};
use std::{fs::File, io::BufReader, path::Path};

fn main() {
  let args: Vec<String> = std::env::args().skip(1).collect();
  if args.is_empty() {
    println!("usage: bmp_info FILE...");
    return;
  }
  for arg in &args {
    if let Err(e) = print_bmp_info(arg) {
      println!("{arg}: {e}");
    }
  }
}

fn print_bmp_info<P: AsRef<Path>>(path: P) -> Result<(), BmpError> {
  let mut src = IoSource::new(BufReader::new(File::open(path.as_ref())?))?;
  let decoder = BmpDecoder::new();
  let info = decoder.probe(&mut src)?;
  println!("{}:", path.as_ref().display());
  println!("  {:?}", info.file_header);
  println!("  {:?}", info.info_header);
  match info.layout {
    PixelLayout::Paletted { bits_per_pixel } => println!("  paletted, {bits_per_pixel}bpp"),
    PixelLayout::Direct { bytes_per_pixel, masks } => {
      println!("  direct, {bytes_per_pixel} bytes per pixel, masks: {masks:08X?}")
    }
  }
  let bitmap: bmpload::Bitmap = decoder.decode(&mut src)?;
  let opaque = bitmap.pixels.iter().filter(|c| c.a == 0xFF).count();
  println!("  decoded {}x{}, {opaque} opaque pixels", bitmap.width, bitmap.height);
  Ok(())
}

use bmpload::{
  bmp::{BmpHeaderInfo, InfoHeaderVersion, PixelLayout},
  decode_bmp_bytes, probe_bmp_header, Bitmap, BmpDecodeOptions, BmpDecoder, BmpError,
  BmpFormatError, BmpIoError, ChannelScaling, PaletteAlpha, Rgba8, SliceSource,
};
use pixel_formats::r32g32b32a32_Sfloat;
use walkdir::WalkDir;

const BI_RGB: u32 = 0;
const BI_BITFIELDS: u32 = 3;
const LCS_sRGB: u32 = 0x7352_4742;

const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Rgba8 {
  Rgba8 { r, g, b, a }
}

/// Assembles a BMP file in memory.
///
/// `rows` are the already-encoded rows *in file order* and without padding;
/// padding is added here (filled with `0xAA` so that any accidental use of it
/// shows up in the decoded colors).
struct BmpBuilder {
  header_size: u32,
  width: i32,
  height: i32,
  bpp: u16,
  compression: u32,
  colors_used: u32,
  masks: Option<[u32; 3]>,
  alpha_mask: u32,
  colorspace: u32,
  palette: Vec<[u8; 4]>,
  rows: Vec<Vec<u8>>,
}
impl BmpBuilder {
  fn new(width: i32, height: i32, bpp: u16) -> Self {
    Self {
      header_size: 40,
      width,
      height,
      bpp,
      compression: BI_RGB,
      colors_used: 0,
      masks: None,
      alpha_mask: 0,
      colorspace: LCS_sRGB,
      palette: Vec::new(),
      rows: Vec::new(),
    }
  }

  fn palette(mut self, palette: &[[u8; 4]]) -> Self {
    self.palette = palette.to_vec();
    self.colors_used = palette.len() as u32;
    self
  }

  fn bitfields(mut self, masks: [u32; 3]) -> Self {
    self.compression = BI_BITFIELDS;
    self.masks = Some(masks);
    self
  }

  fn rows(mut self, rows: &[&[u8]]) -> Self {
    self.rows = rows.iter().map(|r| r.to_vec()).collect();
    self
  }

  fn build(&self) -> Vec<u8> {
    let stride = ((self.bpp as usize * self.width.unsigned_abs() as usize + 31) / 32) * 4;
    let mut info = Vec::new();
    info.extend_from_slice(&self.header_size.to_le_bytes());
    info.extend_from_slice(&self.width.to_le_bytes());
    info.extend_from_slice(&self.height.to_le_bytes());
    info.extend_from_slice(&1_u16.to_le_bytes());
    info.extend_from_slice(&self.bpp.to_le_bytes());
    info.extend_from_slice(&self.compression.to_le_bytes());
    info.extend_from_slice(&((stride * self.rows.len()) as u32).to_le_bytes());
    info.extend_from_slice(&2835_i32.to_le_bytes());
    info.extend_from_slice(&2835_i32.to_le_bytes());
    info.extend_from_slice(&self.colors_used.to_le_bytes());
    info.extend_from_slice(&0_u32.to_le_bytes());
    let v2 = self.header_size >= 52;
    if v2 || self.masks.is_some() {
      for m in self.masks.unwrap_or_default() {
        info.extend_from_slice(&m.to_le_bytes());
      }
    }
    if self.header_size >= 56 {
      info.extend_from_slice(&self.alpha_mask.to_le_bytes());
    }
    if self.header_size >= 108 {
      info.extend_from_slice(&self.colorspace.to_le_bytes());
    }
    let min_len = if v2 { self.header_size as usize } else { info.len() };
    info.resize(info.len().max(min_len), 0);

    let mut body = Vec::new();
    for entry in &self.palette {
      body.extend_from_slice(entry);
    }
    let pixel_offset = 14 + info.len() + body.len();
    for row in &self.rows {
      let start = body.len();
      body.extend_from_slice(row);
      body.resize(start + stride, 0xAA);
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&((14 + info.len() + body.len()) as u32).to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&(pixel_offset as u32).to_le_bytes());
    out.extend_from_slice(&info);
    out.extend_from_slice(&body);
    out
  }
}

fn decode(bytes: &[u8]) -> Result<Bitmap, BmpError> {
  decode_bmp_bytes(bytes)
}

fn decode_with(bytes: &[u8], options: BmpDecodeOptions) -> Result<Bitmap, BmpError> {
  BmpDecoder::with_options(options).decode(&mut SliceSource::new(bytes))
}

const PAL4: [[u8; 4]; 4] =
  [[0x00, 0x00, 0xFF, 0xFF], [0x00, 0xFF, 0x00, 0xFF], [0xFF, 0x00, 0x00, 0xFF], [1, 2, 3, 4]];
const RED: Rgba8 = rgba(0xFF, 0, 0, 0xFF);
const GREEN: Rgba8 = rgba(0, 0xFF, 0, 0xFF);
const BLUE: Rgba8 = rgba(0, 0, 0xFF, 0xFF);
const ODD: Rgba8 = rgba(3, 2, 1, 4);

#[test]
fn test_decode_1bpp() {
  let bytes = BmpBuilder::new(10, 2, 1)
    .palette(&PAL4[..2])
    .rows(&[&[0b1010_0000, 0b0100_0000], &[0b1111_1111, 0b1100_0000]])
    .build();
  let bm = decode(&bytes).unwrap();
  assert_eq!((bm.width, bm.height), (10, 2));
  let bottom: Vec<Rgba8> = bm.row(0).unwrap().to_vec();
  assert_eq!(bottom, [GREEN, RED, GREEN, RED, RED, RED, RED, RED, RED, GREEN]);
  assert!(bm.row(1).unwrap().iter().all(|&c| c == GREEN));
}

#[test]
fn test_decode_2bpp_packing_order() {
  // indexes 0,1,2,3,3,2,1,0 across one row
  let bytes =
    BmpBuilder::new(8, 1, 2).palette(&PAL4).rows(&[&[0b00_01_10_11, 0b11_10_01_00]]).build();
  let bm = decode(&bytes).unwrap();
  assert_eq!(bm.pixels, vec![RED, GREEN, BLUE, ODD, ODD, BLUE, GREEN, RED]);
}

#[test]
fn test_decode_4bpp() {
  let bytes = BmpBuilder::new(3, 1, 4).palette(&PAL4).rows(&[&[0x21, 0x30]]).build();
  let bm = decode(&bytes).unwrap();
  assert_eq!(bm.pixels, vec![BLUE, GREEN, ODD]);
}

#[test]
fn test_decode_8bpp_row_padding() {
  // width 5 at 8bpp is a stride of 8, so every row has 3 bytes of padding
  let bytes = BmpBuilder::new(5, 2, 8)
    .palette(&PAL4)
    .rows(&[&[0, 1, 2, 3, 0], &[3, 2, 1, 0, 3]])
    .build();
  assert_eq!(bytes.len(), 14 + 40 + 16 + 16);
  let bm = decode(&bytes).unwrap();
  assert_eq!(bm.row(0).unwrap(), &[RED, GREEN, BLUE, ODD, RED]);
  assert_eq!(bm.row(1).unwrap(), &[ODD, BLUE, GREEN, RED, ODD]);
}

#[test]
fn test_decode_full_palette_when_colors_used_is_zero() {
  let mut b = BmpBuilder::new(2, 1, 1).palette(&PAL4[..2]).rows(&[&[0b0100_0000]]);
  b.colors_used = 0;
  let bm = decode(&b.build()).unwrap();
  assert_eq!(bm.pixels, vec![RED, GREEN]);
}

#[test]
fn test_palette_index_out_of_range() {
  let bytes = BmpBuilder::new(3, 1, 8).palette(&PAL4[..2]).rows(&[&[0, 1, 2]]).build();
  assert_eq!(
    decode(&bytes),
    Err(BmpError::Format(BmpFormatError::PaletteIndexOutOfRange { index: 2, palette_len: 2 }))
  );
}

#[test]
fn test_palette_alpha_options() {
  let pal = [[0x00, 0x00, 0xFF, 0x00], [0x00, 0xFF, 0x00, 0x00]];
  let bytes = BmpBuilder::new(2, 1, 8).palette(&pal).rows(&[&[0, 1]]).build();
  let stored = decode(&bytes).unwrap();
  assert_eq!(stored.pixels, vec![rgba(0xFF, 0, 0, 0), rgba(0, 0xFF, 0, 0)]);
  let opaque = decode_with(
    &bytes,
    BmpDecodeOptions::new().with_palette_alpha(PaletteAlpha::OpaqueIfAllZero),
  )
  .unwrap();
  assert_eq!(opaque.pixels, vec![RED, GREEN]);
}

#[test]
fn test_decode_16bpp_default_masks() {
  // 0x7FFF and 0x8000 in the 1-5-5-5 default layout, V1 header so the high
  // bit is alpha
  let bytes = BmpBuilder::new(2, 1, 16).rows(&[&[0xFF, 0x7F, 0x00, 0x80]]).build();
  let bm = decode(&bytes).unwrap();
  assert_eq!(bm.pixels, vec![rgba(31, 31, 31, 0), rgba(0, 0, 0, 1)]);
}

#[test]
fn test_mask_shift_raw_and_expanded() {
  let bytes =
    BmpBuilder::new(1, 1, 16).bitfields([0x7C00, 0x03E0, 0x001F]).rows(&[&[0xFF, 0x7F]]).build();
  let raw = decode(&bytes).unwrap();
  assert_eq!(raw.pixels, vec![rgba(31, 31, 31, 0)]);
  let expanded =
    decode_with(&bytes, BmpDecodeOptions::new().with_channel_scaling(ChannelScaling::Expand))
      .unwrap();
  assert_eq!(expanded.pixels, vec![rgba(255, 255, 255, 0)]);
}

#[test]
fn test_decode_16bpp_565_bitfields() {
  // pure red, pure green, pure blue in 5-6-5
  let bytes = BmpBuilder::new(3, 1, 16)
    .bitfields([0xF800, 0x07E0, 0x001F])
    .rows(&[&[0x00, 0xF8, 0xE0, 0x07, 0x1F, 0x00]])
    .build();
  let bm =
    decode_with(&bytes, BmpDecodeOptions::new().with_channel_scaling(ChannelScaling::Expand))
      .unwrap();
  assert_eq!(bm.pixels, vec![rgba(255, 0, 0, 0), rgba(0, 255, 0, 0), rgba(0, 0, 255, 0)]);
}

#[test]
fn test_decode_24bpp() {
  // width 1: 3 bytes of pixel, 1 byte of padding per row
  let bytes = BmpBuilder::new(1, 2, 24).rows(&[&[0x01, 0x02, 0x03], &[0xFF, 0x00, 0x80]]).build();
  let bm = decode(&bytes).unwrap();
  assert_eq!(bm.pixels, vec![rgba(0x03, 0x02, 0x01, 0), rgba(0x80, 0x00, 0xFF, 0)]);
}

#[test]
fn test_decode_32bpp() {
  let px = [0x10, 0x20, 0x30, 0x40];
  // V1 header, no masks: top byte is alpha
  let v1 = BmpBuilder::new(1, 1, 32).rows(&[&px]).build();
  assert_eq!(decode(&v1).unwrap().pixels, vec![rgba(0x30, 0x20, 0x10, 0x40)]);
  // V5 header with BI_RGB: no alpha default
  let mut v5 = BmpBuilder::new(1, 1, 32).rows(&[&px]);
  v5.header_size = 124;
  assert_eq!(decode(&v5.build()).unwrap().pixels, vec![rgba(0x30, 0x20, 0x10, 0)]);
  // V3 header with explicit masks, including alpha
  let mut v3 = BmpBuilder::new(1, 1, 32).bitfields([0xFF, 0xFF00, 0xFF_0000]).rows(&[&px]);
  v3.header_size = 56;
  v3.alpha_mask = 0xFF00_0000;
  assert_eq!(decode(&v3.build()).unwrap().pixels, vec![rgba(0x10, 0x20, 0x30, 0x40)]);
}

#[test]
fn test_orientation() {
  let bottom_up = BmpBuilder::new(2, 2, 8)
    .palette(&PAL4)
    .rows(&[&[0, 1], &[2, 3]])
    .build();
  let top_down = BmpBuilder::new(2, -2, 8)
    .palette(&PAL4)
    .rows(&[&[2, 3], &[0, 1]])
    .build();
  let a = decode(&bottom_up).unwrap();
  let b = decode(&top_down).unwrap();
  assert_eq!(a, b);
  assert_eq!(a.get(0, 0), Some(&RED));
  assert_eq!(a.get(1, 1), Some(&ODD));
  assert_eq!(a.to_top_down().pixels, vec![BLUE, ODD, RED, GREEN]);

  let bottom_up = BmpBuilder::new(1, 3, 24).rows(&[&[1, 1, 1], &[2, 2, 2], &[3, 3, 3]]).build();
  let top_down = BmpBuilder::new(1, -3, 24).rows(&[&[3, 3, 3], &[2, 2, 2], &[1, 1, 1]]).build();
  assert_eq!(decode(&bottom_up).unwrap(), decode(&top_down).unwrap());
}

#[test]
fn test_idempotent() {
  let bytes = BmpBuilder::new(3, 2, 4)
    .palette(&PAL4)
    .rows(&[&[0x01, 0x20], &[0x32, 0x10]])
    .build();
  assert_eq!(decode(&bytes).unwrap(), decode(&bytes).unwrap());
}

#[test]
fn test_float_output() {
  let bytes = BmpBuilder::new(1, 1, 8).palette(&PAL4).rows(&[&[0]]).build();
  let bm: Bitmap<r32g32b32a32_Sfloat> = decode_bmp_bytes(&bytes).unwrap();
  assert_eq!(bm.pixels.len(), 1);
  let px = bm.pixels[0];
  assert_eq!([px.r, px.g, px.b, px.a], [1.0, 0.0, 0.0, 1.0]);

  let bytes = BmpBuilder::new(2, 1, 16).rows(&[&[0x00, 0x7C, 0x1F, 0x80]]).build();
  let bm = decode_with(&bytes, BmpDecodeOptions::new().with_channel_scaling(ChannelScaling::Expand))
    .unwrap();
  assert_eq!(bm.pixels, vec![rgba(255, 0, 0, 0), rgba(0, 0, 255, 255)]);
  let floats: Vec<[f32; 4]> =
    bm.pixels.iter().copied().map(bmpload::image::rgba8_to_unit_f32).collect();
  assert_eq!(floats, vec![[1.0, 0.0, 0.0, 0.0], [0.0, 0.0, 1.0, 1.0]]);
}

#[test]
fn test_rejections() {
  let good = BmpBuilder::new(1, 1, 24).rows(&[&[0, 0, 0]]).build();

  let mut bad_magic = good.clone();
  bad_magic[..2].copy_from_slice(b"MB");
  let e = decode(&bad_magic).unwrap_err();
  assert!(e.is_format());

  let mut rle = BmpBuilder::new(1, 1, 8).palette(&PAL4).rows(&[&[0]]);
  rle.compression = 1;
  assert_eq!(
    decode(&rle.build()),
    Err(BmpError::Format(BmpFormatError::UnsupportedCompression(1)))
  );

  // BI_BITFIELDS is only for direct color
  let bitfields_8bpp =
    BmpBuilder::new(1, 1, 8).palette(&PAL4).bitfields([1, 2, 4]).rows(&[&[0]]).build();
  assert_eq!(
    decode(&bitfields_8bpp),
    Err(BmpError::Format(BmpFormatError::UnsupportedCompression(3)))
  );

  let mut not_srgb = BmpBuilder::new(1, 1, 24).rows(&[&[0, 0, 0]]);
  not_srgb.header_size = 108;
  not_srgb.colorspace = 0;
  assert_eq!(decode(&not_srgb.build()), Err(BmpError::Format(BmpFormatError::ColorspaceNotSrgb(0))));

  let odd_depth = BmpBuilder::new(1, 1, 12).rows(&[&[0, 0]]).build();
  assert_eq!(decode(&odd_depth), Err(BmpError::Format(BmpFormatError::UnsupportedBitDepth(12))));

  let negative_width = BmpBuilder::new(-1, 1, 24).build();
  assert_eq!(decode(&negative_width), Err(BmpError::Format(BmpFormatError::NegativeWidth(-1))));

  let mut os2 = BmpBuilder::new(1, 1, 24).rows(&[&[0, 0, 0]]);
  os2.header_size = 12;
  assert_eq!(
    decode(&os2.build()),
    Err(BmpError::Format(BmpFormatError::UnsupportedHeaderSize(12)))
  );
}

#[test]
fn test_io_errors() {
  let row: &[u8] = &[0; 12];
  let good = BmpBuilder::new(4, 4, 24).rows(&[row; 4]).build();
  assert!(decode(&good).is_ok());

  assert_eq!(
    decode(&good[..10]),
    Err(BmpError::Io(BmpIoError::UnexpectedEof { offset: 0, wanted: 14 }))
  );
  let e = decode(&good[..good.len() - 5]).unwrap_err();
  assert!(e.is_io(), "{e:?}");

  // pixel data offset past the end of the data
  let mut far_pixels = BmpBuilder::new(1, 1, 8).palette(&PAL4).rows(&[&[0]]).build();
  far_pixels[10..14].copy_from_slice(&4000_u32.to_le_bytes());
  let e = decode(&far_pixels).unwrap_err();
  assert!(e.is_io(), "{e:?}");
}

#[test]
fn test_final_row_without_padding() {
  let mut bytes = BmpBuilder::new(1, 2, 8).palette(&PAL4).rows(&[&[1], &[2]]).build();
  bytes.truncate(bytes.len() - 3);
  let bm = decode(&bytes).unwrap();
  assert_eq!(bm.pixels, vec![GREEN, BLUE]);
}

#[test]
fn test_zero_sized_and_limits() {
  let empty = BmpBuilder::new(0, 0, 24).build();
  let bm = decode(&empty).unwrap();
  assert_eq!((bm.width, bm.height, bm.pixels.len()), (0, 0, 0));

  let row: &[u8] = &[0; 15];
  let bytes = BmpBuilder::new(5, 5, 24).rows(&[row; 5]).build();
  assert_eq!(
    decode_with(&bytes, BmpDecodeOptions::new().with_max_dimensions(4, 100)),
    Err(BmpError::Format(BmpFormatError::DimensionsTooLarge { width: 5, height: 5 }))
  );
  assert!(decode_with(&bytes, BmpDecodeOptions::new().with_max_dimensions(5, 5)).is_ok());

  // claims to be huge, but has no data behind the claim
  let huge = BmpBuilder::new(16000, 16000, 32).build();
  let e = decode(&huge).unwrap_err();
  assert!(e.is_io(), "{e:?}");
}

#[test]
fn test_probe_bmp_header() {
  let mut b = BmpBuilder::new(7, -3, 16).bitfields([0xF800, 0x07E0, 0x001F]);
  b.header_size = 124;
  let bytes = b.build();
  let BmpHeaderInfo { file_header, info_header, layout } =
    probe_bmp_header(&mut SliceSource::new(&bytes)).unwrap();
  assert_eq!(file_header.tag.0, *b"BM");
  assert_eq!(file_header.pixel_data_offset, 14 + 124);
  assert_eq!(info_header.version, InfoHeaderVersion::V5);
  assert_eq!(info_header.colorspace, Some(LCS_sRGB));
  assert!(info_header.is_top_down());
  assert!(matches!(layout, PixelLayout::Direct { bytes_per_pixel: 2, .. }));
}

#[test]
fn test_decode_reader() {
  let bytes = BmpBuilder::new(2, 1, 8).palette(&PAL4).rows(&[&[2, 1]]).build();
  let bm: Bitmap = bmpload::decode_bmp_reader(std::io::Cursor::new(&bytes)).unwrap();
  assert_eq!(bm.pixels, vec![BLUE, GREEN]);
  assert_eq!(bm, Bitmap::<Rgba8>::try_from_bmp_bytes(&bytes).unwrap());
}

#[test]
fn test_random_bytes_do_not_panic() {
  for _ in 0..200 {
    let mut v = crate::rand_bytes(256);
    let _ = decode(&v);
    // with a real tag and header size, to get further into the decoder
    v[..2].copy_from_slice(b"BM");
    v[14..18].copy_from_slice(&40_u32.to_le_bytes());
    let _ = decode(&v);
  }
}

#[test]
fn test_walked_files_decode_without_panic() {
  let dir = std::env::temp_dir().join(format!("bmpload_walk_{}", std::process::id()));
  std::fs::create_dir_all(dir.join("nested")).unwrap();
  let files = [
    ("pal8.bmp", BmpBuilder::new(2, 2, 8).palette(&PAL4).rows(&[&[0, 1], &[2, 3]]).build()),
    ("rgb24.bmp", BmpBuilder::new(1, -2, 24).rows(&[&[1, 2, 3], &[4, 5, 6]]).build()),
    (
      "nested/rgb565.bmp",
      BmpBuilder::new(1, 1, 16).bitfields([0xF800, 0x07E0, 0x001F]).rows(&[&[0x1F, 0x00]]).build(),
    ),
  ];
  for (name, bytes) in &files {
    std::fs::write(dir.join(name), bytes).unwrap();
  }
  std::fs::write(dir.join("notes.txt"), b"not a bitmap").unwrap();
  let mut truncated = files[0].1.clone();
  truncated.truncate(60);
  std::fs::write(dir.join("nested/truncated.bmp"), truncated).unwrap();

  let mut decoded = 0;
  let mut failed = 0;
  for entry in WalkDir::new(&dir).into_iter().filter_map(|e| e.ok()) {
    if entry.file_type().is_dir() {
      continue;
    }
    println!("{}", entry.path().display());
    match bmpload::decode_bmp_file::<r32g32b32a32_Sfloat, _>(entry.path()) {
      Ok(bm) => {
        assert_eq!(bm.pixels.len(), (bm.width * bm.height) as usize);
        decoded += 1;
      }
      Err(_) => failed += 1,
    }
  }
  std::fs::remove_dir_all(&dir).unwrap();
  assert_eq!(decoded, 3);
  assert_eq!(failed, 2);
}

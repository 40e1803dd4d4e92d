//! 24-bit uncompressed BMP encoding.
//!
//! # Layout
//!
//! ```text
//! offset  size  field
//!      0     2  'B' 'M'
//!      2     4  file size (u32 LE)
//!      6     4  reserved (0)
//!     10     4  pixel data offset (54)
//!     14     4  info header size (40)
//!     18     4  width (i32 LE)
//!     22     4  height (i32 LE)
//!     26     2  planes (1)
//!     28     2  bits per pixel (24)
//!     30     4  compression (0)
//!     34     4  image size (0)
//!     38     8  pixels per meter x/y (0)
//!     46     8  palette fields (0)
//!     54     -  pixels, bottom row first, B G R per pixel
//! ```
//!
//! Rows are written back to back with no 4-byte padding. Images whose row
//! length is not a multiple of four bytes are therefore not readable by
//! strict BMP decoders; [`encode`] logs a warning for them.

use std::fs;
use std::path::{Path, PathBuf};

use nom::{
    bytes::complete::{tag, take},
    number::complete::{le_i32, le_u16, le_u32},
    sequence::tuple,
    IResult,
};

use crate::animation::FrameSink;
use crate::error::{BmpError, RenderError};
use crate::framebuffer::{Framebuffer, Rgb};

pub const FILE_HEADER_SIZE: usize = 14;
pub const INFO_HEADER_SIZE: usize = 40;
pub const PIXEL_DATA_OFFSET: usize = FILE_HEADER_SIZE + INFO_HEADER_SIZE;

/// File size, width and height as stored in the headers.
fn header_fields(width: usize, height: usize) -> Result<(u32, i32, i32), BmpError> {
    let too_large = || BmpError::TooLarge { width, height };
    let size = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(3))
        .and_then(|n| n.checked_add(PIXEL_DATA_OFFSET))
        .ok_or_else(too_large)?;
    Ok((
        u32::try_from(size).map_err(|_| too_large())?,
        i32::try_from(width).map_err(|_| too_large())?,
        i32::try_from(height).map_err(|_| too_large())?,
    ))
}

/// Encode a framebuffer as BMP bytes.
///
/// Fails with [`BmpError::TooLarge`] when the file size or a dimension does
/// not fit its header field.
pub fn encode(frame: &Framebuffer) -> Result<Vec<u8>, BmpError> {
    let (width, height) = (frame.width(), frame.height());
    let (size, stored_width, stored_height) = header_fields(width, height)?;
    if (width * 3) % 4 != 0 {
        log::warn!(
            "{}x{} BMP rows are {} bytes and not padded to a 4-byte stride",
            width,
            height,
            width * 3
        );
    }

    let mut out = Vec::with_capacity(size as usize);

    // File header
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(PIXEL_DATA_OFFSET as u32).to_le_bytes());

    // Info header
    out.extend_from_slice(&(INFO_HEADER_SIZE as u32).to_le_bytes());
    out.extend_from_slice(&stored_width.to_le_bytes());
    out.extend_from_slice(&stored_height.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&24u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // compression
    out.extend_from_slice(&0u32.to_le_bytes()); // image size
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());

    for row in frame.rows().rev() {
        for &[r, g, b] in row {
            out.extend_from_slice(&[b, g, r]);
        }
    }
    Ok(out)
}

/// Encode `frame` and write it to `path`.
pub fn write(path: impl AsRef<Path>, frame: &Framebuffer) -> Result<(), RenderError> {
    let path = path.as_ref();
    let bytes = encode(frame)?;
    fs::write(path, bytes).map_err(|e| RenderError::io(path, e))
}

struct Header {
    file_size: u32,
    pixel_offset: u32,
    info_size: u32,
    width: i32,
    height: i32,
    planes: u16,
    bits_per_pixel: u16,
    compression: u32,
}

fn parse_header(input: &[u8]) -> IResult<&[u8], Header> {
    let (input, _) = tag(&b"BM"[..])(input)?;
    let (input, (file_size, _reserved, pixel_offset)) = tuple((le_u32, le_u32, le_u32))(input)?;
    let (input, (info_size, width, height, planes, bits_per_pixel, compression)) =
        tuple((le_u32, le_i32, le_i32, le_u16, le_u16, le_u32))(input)?;
    // image size, resolution and palette fields are not needed
    let (input, _) = take(20usize)(input)?;
    Ok((
        input,
        Header {
            file_size,
            pixel_offset,
            info_size,
            width,
            height,
            planes,
            bits_per_pixel,
            compression,
        },
    ))
}

/// Decode a BMP produced by [`encode`] back into a framebuffer.
pub fn decode(data: &[u8]) -> Result<Framebuffer, BmpError> {
    if !data.starts_with(b"BM") {
        return Err(BmpError::InvalidMagic);
    }
    let (_, header) = parse_header(data).map_err(|_| BmpError::UnexpectedEnd)?;

    if header.info_size as usize != INFO_HEADER_SIZE
        || header.planes != 1
        || header.bits_per_pixel != 24
        || header.compression != 0
    {
        return Err(BmpError::Unsupported(format!(
            "info header {} bytes, {} planes, {} bpp, compression {}",
            header.info_size, header.planes, header.bits_per_pixel, header.compression
        )));
    }
    if header.width <= 0 || header.height <= 0 {
        return Err(BmpError::Unsupported(format!(
            "dimensions {}x{}",
            header.width, header.height
        )));
    }

    let (width, height) = (header.width as usize, header.height as usize);
    let start = header.pixel_offset as usize;
    let end = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(3))
        .and_then(|n| n.checked_add(start))
        .ok_or(BmpError::UnexpectedEnd)?;
    if data.len() < end || (header.file_size as usize) < end {
        return Err(BmpError::UnexpectedEnd);
    }

    let mut pixels: Vec<Rgb> = vec![[0; 3]; width * height];
    for (i, row) in data[start..end].chunks_exact(width * 3).enumerate() {
        let y = height - 1 - i;
        for (x, bgr) in row.chunks_exact(3).enumerate() {
            pixels[y * width + x] = [bgr[2], bgr[1], bgr[0]];
        }
    }
    Framebuffer::from_pixels(width, height, pixels)
        .map_err(|e| BmpError::Unsupported(e.to_string()))
}

/// Writes frames as `{prefix}{index:05}.bmp` into a directory.
#[derive(Debug, Clone)]
pub struct BmpSequence {
    dir: PathBuf,
    prefix: String,
    written: Vec<PathBuf>,
}

impl BmpSequence {
    /// The directory must already exist.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            written: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}{:05}.bmp", self.prefix, index))
    }

    /// Glob matching every frame this sequence writes, for external assembly.
    pub fn glob_pattern(&self) -> String {
        self.dir
            .join(format!("{}*.bmp", self.prefix))
            .to_string_lossy()
            .into_owned()
    }

    /// Paths written so far, in frame order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl FrameSink for BmpSequence {
    fn emit(&mut self, index: usize, frame: Framebuffer) -> Result<(), RenderError> {
        let path = self.frame_path(index);
        write(&path, &frame)?;
        log::debug!("wrote frame {} to {}", index, path.display());
        self.written.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize) -> Framebuffer {
        let pixels = (0..width * height)
            .map(|i| [i as u8, (i * 7) as u8, 255 - i as u8])
            .collect();
        Framebuffer::from_pixels(width, height, pixels).unwrap()
    }

    #[test]
    fn test_header_fields() {
        let bytes = encode(&gradient(4, 3)).unwrap();
        assert_eq!(bytes.len(), 54 + 4 * 3 * 3);
        assert_eq!(&bytes[0..2], b"BM");
        assert_eq!(u32::from_le_bytes(bytes[2..6].try_into().unwrap()), 90);
        assert_eq!(u32::from_le_bytes(bytes[6..10].try_into().unwrap()), 0);
        assert_eq!(u32::from_le_bytes(bytes[10..14].try_into().unwrap()), 54);
        assert_eq!(u32::from_le_bytes(bytes[14..18].try_into().unwrap()), 40);
        assert_eq!(i32::from_le_bytes(bytes[18..22].try_into().unwrap()), 4);
        assert_eq!(i32::from_le_bytes(bytes[22..26].try_into().unwrap()), 3);
        assert_eq!(u16::from_le_bytes(bytes[26..28].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(bytes[28..30].try_into().unwrap()), 24);
        assert!(bytes[30..54].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_pixels_are_bgr_bottom_up() {
        let mut frame = Framebuffer::new(2, 2).unwrap();
        frame.set_pixel(0, 0, [1, 2, 3]); // top-left
        frame.set_pixel(1, 1, [4, 5, 6]); // bottom-right
        let bytes = encode(&frame).unwrap();
        let pixels = &bytes[PIXEL_DATA_OFFSET..];
        // First stored row is the bottom row
        assert_eq!(&pixels[0..6], &[0, 0, 0, 6, 5, 4]);
        assert_eq!(&pixels[6..12], &[3, 2, 1, 0, 0, 0]);
    }

    #[test]
    fn test_decode_round_trip() {
        let frame = gradient(5, 3);
        assert_eq!(decode(&encode(&frame).unwrap()).unwrap(), frame);
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert_eq!(decode(b"PNG...").unwrap_err(), BmpError::InvalidMagic);
        assert_eq!(decode(b"BM\x00\x00").unwrap_err(), BmpError::UnexpectedEnd);

        let mut bytes = encode(&gradient(2, 2)).unwrap();
        bytes.truncate(bytes.len() - 1);
        assert_eq!(decode(&bytes).unwrap_err(), BmpError::UnexpectedEnd);

        let mut bytes = encode(&gradient(2, 2)).unwrap();
        bytes[28] = 32;
        assert!(matches!(decode(&bytes), Err(BmpError::Unsupported(_))));
    }

    #[test]
    fn test_header_fields_reject_oversized_images() {
        assert_eq!(header_fields(4, 3), Ok((90, 4, 3)));
        // 4 GiB of pixel data wraps a u32 file size
        assert_eq!(
            header_fields(65_536, 21_846),
            Err(BmpError::TooLarge {
                width: 65_536,
                height: 21_846
            })
        );
        // Empty image, but the width overflows the i32 field
        assert!(header_fields(i32::MAX as usize + 1, 0).is_err());
        assert!(header_fields(usize::MAX, 2).is_err());
    }

    #[test]
    fn test_sequence_writes_numbered_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut sequence = BmpSequence::new(dir.path(), "frame_");
        sequence.emit(0, gradient(2, 2)).unwrap();
        sequence.emit(1, gradient(2, 2)).unwrap();

        assert_eq!(sequence.written().len(), 2);
        assert!(dir.path().join("frame_00000.bmp").exists());
        assert!(dir.path().join("frame_00001.bmp").exists());
        assert!(sequence.glob_pattern().ends_with("frame_*.bmp"));
    }

    #[test]
    fn test_write_to_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.bmp");
        let err = write(&path, &gradient(1, 1)).unwrap_err();
        assert!(matches!(err, RenderError::Io { .. }));
    }
}

use image::RgbaImage;

use crate::codec::{pixels_from_bytes, pixels_to_bytes, Pixel};
use crate::error::{Error, Result};

/// Caller-owned canvas that frames are drawn into.
///
/// Decoding only touches the rectangle covered by the frame's image, so the
/// buffer keeps whatever earlier frames left outside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    pub fn from_rgba_image(image: &RgbaImage) -> Result<Self> {
        let pixels = pixels_from_bytes(image.as_raw())?;
        Ok(Self {
            width: image.width(),
            height: image.height(),
            pixels,
        })
    }

    pub fn to_rgba_image(&self) -> Result<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, pixels_to_bytes(&self.pixels)).ok_or(
            Error::DestinationTooSmall {
                needed: self.width as usize * self.height as usize,
                available: self.pixels.len(),
            },
        )
    }
}

/// Copy a `width`-wide block of rows into `dest` at `(x, y)`.
///
/// `src` rows are `width` pixels apart, `dest` rows are `stride` apart. The
/// caller has already checked that the block fits.
pub(crate) fn blit(
    dest: &mut [Pixel],
    stride: usize,
    x: usize,
    y: usize,
    width: usize,
    src: &[Pixel],
) {
    if width == 0 {
        return;
    }
    if x == 0 && width == stride {
        let start = y * stride;
        dest[start..start + src.len()].copy_from_slice(src);
        return;
    }
    for (row, line) in src.chunks_exact(width).enumerate() {
        let start = (y + row) * stride + x;
        dest[start..start + width].copy_from_slice(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn blit_sub_rectangle() {
        let mut dest = vec![0u32; 4 * 3];
        blit(&mut dest, 4, 1, 1, 2, &[1, 2, 3, 4]);
        assert_eq!(dest, vec![0, 0, 0, 0, 0, 1, 2, 0, 0, 3, 4, 0]);
    }

    #[test]
    fn blit_full_rows() {
        let mut dest = vec![9u32; 2 * 3];
        blit(&mut dest, 2, 0, 1, 2, &[1, 2, 3, 4]);
        assert_eq!(dest, vec![9, 9, 1, 2, 3, 4]);
    }

    #[test]
    fn rgba_image_roundtrip() {
        let mut buffer = FrameBuffer::new(2, 1);
        buffer.pixels_mut().copy_from_slice(&[0xff00_00ff, 0x8000_ff00]);
        let image = buffer.to_rgba_image().unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [0xff, 0, 0, 0xff]);
        assert_eq!(image.get_pixel(1, 0).0, [0, 0xff, 0, 0x80]);
        assert_eq!(FrameBuffer::from_rgba_image(&image).unwrap(), buffer);
    }

    #[test]
    fn pixel_lookup_and_clear() {
        let mut buffer = FrameBuffer::new(3, 2);
        buffer.pixels_mut()[5] = 42;
        assert_eq!(buffer.pixel(2, 1), Some(42));
        assert_eq!(buffer.pixel(3, 0), None);
        buffer.clear();
        assert_eq!(buffer.pixel(2, 1), Some(0));
    }
}

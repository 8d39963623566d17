//! Playback side: locate a frame's record and draw it into a canvas buffer.

use crate::codec::{pixels_from_bytes, word, Pixel};
use crate::error::{Error, Result};
use crate::frame::{blit, FrameBuffer};
use crate::pack::{GlobalHeader, ImageFormat, ImageHeader, GLOBAL_HEADER_SIZE};

/// Decodes `ping` payloads.
///
/// Returns the image size and its pixels, row-major.
pub trait PngDecoder: Send + Sync {
    fn decode(&self, data: &[u8]) -> Result<(u32, u32, Vec<Pixel>)>;
}

/// [`PngDecoder`] backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImagePngDecoder;

impl PngDecoder for ImagePngDecoder {
    fn decode(&self, data: &[u8]) -> Result<(u32, u32, Vec<Pixel>)> {
        let image =
            image::load_from_memory_with_format(data, image::ImageFormat::Png)?.to_rgba8();
        let pixels = pixels_from_bytes(image.as_raw())?;
        Ok((image.width(), image.height(), pixels))
    }
}

/// One image record inside a container.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub index: usize,
    /// Byte offset of the image header.
    pub offset: usize,
    pub header: ImageHeader,
    pub payload: &'a [u8],
}

/// Read-only view over a container held in memory.
///
/// The container bytes are borrowed, never copied. Records are located by
/// walking from the first one on every lookup, so all methods take `&self`
/// and an `Animation` can be shared between threads.
pub struct Animation<'a> {
    data: &'a [u8],
    header: GlobalHeader,
    png: Box<dyn PngDecoder>,
}

impl<'a> Animation<'a> {
    /// Validate the global header. Frame payloads are not touched until
    /// they are decoded.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let header = GlobalHeader::parse(data)?;
        log::debug!(
            "animation {}x{}, {} frame(s) at {} fps",
            header.width,
            header.height,
            header.frame_count,
            header.frame_rate
        );
        Ok(Self {
            data,
            header,
            png: Box::new(ImagePngDecoder),
        })
    }

    pub fn with_png_decoder(mut self, decoder: Box<dyn PngDecoder>) -> Self {
        self.png = decoder;
        self
    }

    pub fn header(&self) -> &GlobalHeader {
        &self.header
    }

    pub fn width(&self) -> u32 {
        self.header.width
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    pub fn frame_rate(&self) -> u32 {
        self.header.frame_rate
    }

    /// Locate record `index`.
    pub fn frame(&self, index: usize) -> Result<Frame<'a>> {
        let count = self.frame_count();
        if index >= count {
            return Err(Error::FrameIndexOutOfRange { index, count });
        }
        let mut records = self.frames();
        loop {
            let frame = records
                .next()
                .ok_or(Error::FrameIndexOutOfRange { index, count })??;
            if frame.index == index {
                return Ok(frame);
            }
        }
    }

    /// Walk every record in order. The iterator ends after the first error.
    pub fn frames(&self) -> Frames<'a> {
        Frames {
            data: self.data,
            offset: GLOBAL_HEADER_SIZE,
            index: 0,
            count: self.frame_count(),
            failed: false,
        }
    }

    /// Decode frame `index` into `dest`, a canvas-sized row-major buffer.
    ///
    /// Only the rectangle covered by the frame's image is written, and only
    /// once the whole record has been validated and decoded. On error `dest`
    /// is left as it was.
    pub fn decode_frame(&self, index: usize, dest: &mut [Pixel]) -> Result<()> {
        let frame = self.frame(index)?;
        self.decode_record(&frame, dest)
    }

    /// [`Animation::decode_frame`] into a [`FrameBuffer`] of canvas size.
    pub fn draw_frame(&self, index: usize, buffer: &mut FrameBuffer) -> Result<()> {
        if buffer.width() != self.width() || buffer.height() != self.height() {
            return Err(Error::CanvasMismatch {
                width: self.width(),
                height: self.height(),
                buffer_width: buffer.width(),
                buffer_height: buffer.height(),
            });
        }
        self.decode_frame(index, buffer.pixels_mut())
    }

    pub fn decode_record(&self, frame: &Frame<'_>, dest: &mut [Pixel]) -> Result<()> {
        let needed = self.header.pixel_count();
        if dest.len() < needed {
            return Err(Error::DestinationTooSmall {
                needed,
                available: dest.len(),
            });
        }
        let image = &frame.header;
        image.check_placement(&self.header)?;

        let pixels = match image.format()? {
            ImageFormat::UncompressedPixels => {
                let expected = image.pixel_count() * 4;
                if frame.payload.len() != expected {
                    return Err(Error::PayloadLengthMismatch {
                        expected,
                        actual: frame.payload.len(),
                    });
                }
                pixels_from_bytes(frame.payload)?
            }
            ImageFormat::RunLengthCompressedPixels => {
                word::decode(frame.payload, image.pixel_count())?
            }
            ImageFormat::Png => {
                let (width, height, pixels) = self.png.decode(frame.payload)?;
                if width != image.width || height != image.height {
                    return Err(Error::PayloadLengthMismatch {
                        expected: image.pixel_count() * 4,
                        actual: width as usize * height as usize * 4,
                    });
                }
                if pixels.len() != image.pixel_count() {
                    return Err(Error::PayloadLengthMismatch {
                        expected: image.pixel_count() * 4,
                        actual: pixels.len() * 4,
                    });
                }
                pixels
            }
        };

        log::trace!(
            "frame {}: {}x{} at ({}, {})",
            frame.index,
            image.width,
            image.height,
            image.xoffset,
            image.yoffset
        );
        blit(
            dest,
            self.header.width as usize,
            image.xoffset as usize,
            image.yoffset as usize,
            image.width as usize,
            &pixels,
        );
        Ok(())
    }
}

impl std::fmt::Debug for Animation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animation")
            .field("header", &self.header)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Iterator over the records of an [`Animation`].
pub struct Frames<'a> {
    data: &'a [u8],
    offset: usize,
    index: usize,
    count: usize,
    failed: bool,
}

impl<'a> Iterator for Frames<'a> {
    type Item = Result<Frame<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.index >= self.count {
            return None;
        }
        let data = self.data;
        let record = ImageHeader::parse(data, self.offset).and_then(|(header, payload_offset)| {
            let payload = header.payload(data, payload_offset)?;
            Ok((header, payload_offset, payload))
        });
        match record {
            Ok((header, payload_offset, payload)) => {
                let frame = Frame {
                    index: self.index,
                    offset: self.offset,
                    header,
                    payload,
                };
                log::trace!(
                    "record {} at {}: {} byte(s) of {:#010x}",
                    self.index,
                    self.offset,
                    header.data_length,
                    header.format
                );
                self.offset = header.next_record_offset(payload_offset);
                self.index += 1;
                Some(Ok(frame))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::IMAGE_HEADER_SIZE;
    use crate::writer::ContainerWriter;
    use pretty_assertions::assert_eq;

    fn record(header: ImageHeader, payload: &[u8]) -> Vec<u8> {
        let mut out = header.to_bytes().unwrap();
        out.extend_from_slice(payload);
        out.resize(out.len() + crate::pack::padding_bytes(payload.len()), 0);
        out
    }

    fn container(width: u32, height: u32, records: &[Vec<u8>]) -> Vec<u8> {
        let mut out = GlobalHeader::new(width, height, 12, records.len() as u32)
            .to_bytes()
            .unwrap();
        for r in records {
            out.extend_from_slice(r);
        }
        out
    }

    fn header(format: ImageFormat, w: u32, h: u32, x: u32, y: u32, len: usize) -> ImageHeader {
        ImageHeader {
            width: w,
            height: h,
            xoffset: x,
            yoffset: y,
            format: format.tag(),
            data_length: len as u32,
        }
    }

    #[test]
    fn uncompressed_sub_image_is_placed() {
        let payload = crate::codec::pixels_to_bytes(&[1, 2, 3, 4]);
        let bytes = container(
            3,
            3,
            &[record(header(ImageFormat::UncompressedPixels, 2, 2, 1, 1, 16), &payload)],
        );
        let animation = Animation::new(&bytes).unwrap();
        let mut dest = vec![0; 9];
        animation.decode_frame(0, &mut dest).unwrap();
        assert_eq!(dest, vec![0, 0, 0, 0, 1, 2, 0, 3, 4]);
    }

    #[test]
    fn padding_is_skipped_without_inspection() {
        let rle = word::encode(&[5, 5, 5]);
        let first = header(ImageFormat::Png, 1, 1, 0, 0, 3);
        let mut first_record = first.to_bytes().unwrap();
        first_record.extend_from_slice(&[1, 2, 3, 0xee]);
        let bytes = container(
            3,
            1,
            &[
                first_record,
                record(header(ImageFormat::RunLengthCompressedPixels, 3, 1, 0, 0, rle.len()), &rle),
            ],
        );
        let animation = Animation::new(&bytes).unwrap();
        let second = animation.frame(1).unwrap();
        assert_eq!(second.offset, 24 + IMAGE_HEADER_SIZE + 4);
        let mut dest = vec![0; 3];
        animation.decode_frame(1, &mut dest).unwrap();
        assert_eq!(dest, vec![5, 5, 5]);
    }

    #[test]
    fn uncompressed_length_must_match() {
        let bytes = container(
            2,
            1,
            &[record(header(ImageFormat::UncompressedPixels, 2, 1, 0, 0, 4), &[0; 4])],
        );
        let animation = Animation::new(&bytes).unwrap();
        let mut dest = vec![0; 2];
        assert!(matches!(
            animation.decode_frame(0, &mut dest),
            Err(Error::PayloadLengthMismatch {
                expected: 8,
                actual: 4
            })
        ));
    }

    #[test]
    fn small_destination_is_rejected() {
        let bytes = ContainerWriter::new(2, 2)
            .push_frame(&[1, 2, 3, 4], ImageFormat::UncompressedPixels)
            .unwrap()
            .finish()
            .unwrap();
        let animation = Animation::new(&bytes).unwrap();
        let mut dest = vec![0; 3];
        assert!(matches!(
            animation.decode_frame(0, &mut dest),
            Err(Error::DestinationTooSmall {
                needed: 4,
                available: 3
            })
        ));
    }

    #[test]
    fn frame_buffer_must_match_canvas() {
        let bytes = ContainerWriter::new(2, 2)
            .push_frame(&[1, 2, 3, 4], ImageFormat::UncompressedPixels)
            .unwrap()
            .finish()
            .unwrap();
        let animation = Animation::new(&bytes).unwrap();
        let mut buffer = FrameBuffer::new(4, 1);
        assert!(matches!(
            animation.draw_frame(0, &mut buffer),
            Err(Error::CanvasMismatch { .. })
        ));
        let mut buffer = FrameBuffer::new(2, 2);
        animation.draw_frame(0, &mut buffer).unwrap();
        assert_eq!(buffer.pixels(), &[1, 2, 3, 4]);
    }

    struct SolidPng(u32, u32);

    impl PngDecoder for SolidPng {
        fn decode(&self, _data: &[u8]) -> Result<(u32, u32, Vec<Pixel>)> {
            Ok((self.0, self.1, vec![0xabcd; (self.0 * self.1) as usize]))
        }
    }

    #[test]
    fn png_is_handed_to_decoder() {
        let bytes = container(
            2,
            2,
            &[record(header(ImageFormat::Png, 1, 2, 1, 0, 5), b"fake!")],
        );
        let animation = Animation::new(&bytes)
            .unwrap()
            .with_png_decoder(Box::new(SolidPng(1, 2)));
        let mut dest = vec![0; 4];
        animation.decode_frame(0, &mut dest).unwrap();
        assert_eq!(dest, vec![0, 0xabcd, 0, 0xabcd]);
    }

    #[test]
    fn png_size_must_match_header() {
        let bytes = container(
            2,
            2,
            &[record(header(ImageFormat::Png, 2, 2, 0, 0, 5), b"fake!")],
        );
        let animation = Animation::new(&bytes)
            .unwrap()
            .with_png_decoder(Box::new(SolidPng(1, 1)));
        let mut dest = vec![0; 4];
        assert!(matches!(
            animation.decode_frame(0, &mut dest),
            Err(Error::PayloadLengthMismatch {
                expected: 16,
                actual: 4
            })
        ));
    }

    struct ShortPng(usize);

    impl PngDecoder for ShortPng {
        fn decode(&self, _data: &[u8]) -> Result<(u32, u32, Vec<Pixel>)> {
            Ok((2, 2, vec![7; self.0]))
        }
    }

    #[test]
    fn png_pixel_count_must_match_reported_size() {
        let bytes = container(
            2,
            2,
            &[record(header(ImageFormat::Png, 2, 2, 0, 0, 5), b"fake!")],
        );
        for returned in [9, 3] {
            let animation = Animation::new(&bytes)
                .unwrap()
                .with_png_decoder(Box::new(ShortPng(returned)));
            let mut dest = vec![0; 4];
            let result = animation.decode_frame(0, &mut dest);
            assert!(
                matches!(
                    result,
                    Err(Error::PayloadLengthMismatch { expected: 16, actual }) if actual == returned * 4
                ),
                "{result:?}"
            );
            assert_eq!(dest, vec![0; 4]);
        }
    }

    #[test]
    fn frames_iterator_stops_after_error() {
        let mut bytes = container(
            1,
            1,
            &[record(header(ImageFormat::UncompressedPixels, 1, 1, 0, 0, 4), &[0; 4])],
        );
        bytes[20..24].copy_from_slice(&3u32.to_le_bytes());
        let animation = Animation::new(&bytes).unwrap();
        let results: Vec<_> = animation.frames().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::TruncatedHeader { .. })));
    }
}

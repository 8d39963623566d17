//! Authoring side: assemble a container from pixel frames.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use std::io::Write;
use std::path::Path;

use crate::codec::{pixels_to_bytes, word, Pixel};
use crate::error::{Error, Result};
use crate::frame::FrameBuffer;
use crate::pack::{padding_bytes, GlobalHeader, ImageFormat, ImageHeader};

pub const DEFAULT_FRAME_RATE: u32 = 12;

/// Builds a container in memory, one record per pushed image.
#[derive(Debug, Clone)]
pub struct ContainerWriter {
    width: u32,
    height: u32,
    frame_rate: u32,
    frame_count: u32,
    records: Vec<u8>,
}

impl ContainerWriter {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_rate: DEFAULT_FRAME_RATE,
            frame_count: 0,
            records: Vec::new(),
        }
    }

    pub fn frame_rate(&mut self, frame_rate: u32) -> &mut Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// The global header for the records pushed so far. Fails for a canvas
    /// the reader would reject.
    fn header(&self) -> Result<GlobalHeader> {
        let header = GlobalHeader::new(self.width, self.height, self.frame_rate, self.frame_count);
        header.validate()?;
        Ok(header)
    }

    /// Add a frame covering the whole canvas.
    pub fn push_frame(&mut self, pixels: &[Pixel], format: ImageFormat) -> Result<&mut Self> {
        self.push_image(0, 0, self.width, self.height, pixels, format)
    }

    /// Add a `width` x `height` image placed at `(x, y)` on the canvas.
    pub fn push_image(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        pixels: &[Pixel],
        format: ImageFormat,
    ) -> Result<&mut Self> {
        let count = width as usize * height as usize;
        if pixels.len() != count {
            return Err(Error::PayloadLengthMismatch {
                expected: count * 4,
                actual: pixels.len() * 4,
            });
        }
        let mut image = ImageHeader {
            width,
            height,
            xoffset: x,
            yoffset: y,
            format: format.tag(),
            data_length: 0,
        };
        image.check_placement(&self.header()?)?;

        let payload = match format {
            ImageFormat::UncompressedPixels => pixels_to_bytes(pixels),
            ImageFormat::RunLengthCompressedPixels => {
                let encoded = word::encode(pixels);
                let decoded = word::decode(&encoded, count)?;
                debug_assert_eq!(decoded, pixels);
                encoded
            }
            ImageFormat::Png => {
                let mut png = Vec::new();
                PngEncoder::new(&mut png).write_image(
                    &pixels_to_bytes(pixels),
                    width,
                    height,
                    ExtendedColorType::Rgba8,
                )?;
                png
            }
        };
        image.data_length =
            u32::try_from(payload.len()).map_err(|_| Error::PayloadTooLarge(payload.len()))?;

        log::debug!(
            "frame {}: {} {}x{} -> {} byte(s)",
            self.frame_count,
            format.fourcc(),
            width,
            height,
            payload.len()
        );
        self.records.extend(image.to_bytes()?);
        self.records.extend_from_slice(&payload);
        self.records
            .resize(self.records.len() + padding_bytes(payload.len()), 0);
        self.frame_count += 1;
        Ok(self)
    }

    pub fn finish(&self) -> Result<Vec<u8>> {
        let mut out = self.header()?.to_bytes()?;
        out.extend_from_slice(&self.records);
        Ok(out)
    }

    pub fn write_to<W: Write>(&self, mut out: W) -> Result<()> {
        out.write_all(&self.header()?.to_bytes()?)?;
        out.write_all(&self.records)?;
        out.flush()?;
        Ok(())
    }
}

/// Build a container at `output` from source images the size of the canvas.
pub fn write(
    output: impl AsRef<Path>,
    width: u32,
    height: u32,
    frame_rate: u32,
    sources: &[impl AsRef<Path>],
    format: ImageFormat,
) -> Result<()> {
    let mut writer = ContainerWriter::new(width, height);
    writer.frame_rate(frame_rate);

    for source in sources {
        let source = source.as_ref();
        log::info!("Processing {}", source.display());
        let image = image::open(source)?.to_rgba8();
        if image.width() != width || image.height() != height {
            return Err(Error::SourceSizeMismatch {
                width,
                height,
                actual_width: image.width(),
                actual_height: image.height(),
            });
        }
        let frame = FrameBuffer::from_rgba_image(&image)?;
        writer.push_frame(frame.pixels(), format)?;
    }

    let file = std::fs::File::create(output.as_ref())?;
    writer.write_to(std::io::BufWriter::new(file))?;
    log::info!(
        "Wrote {} frame(s) to {}",
        writer.frame_count(),
        output.as_ref().display()
    );
    Ok(())
}

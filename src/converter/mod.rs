use anyhow::Result;
use image::RgbaImage;

mod sequence;

pub use sequence::{ImageSequenceConverter, SequenceFormat};

/// Sink for decoded canvases.
pub trait Converter {
    fn prepare(&mut self, width: u32, height: u32, frame_rate: u32) -> Result<()>;
    fn convert_frame(&mut self, image: RgbaImage, frame_id: usize) -> Result<()>;
    fn finish(&self) -> Result<()>;
}

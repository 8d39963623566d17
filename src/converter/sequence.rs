use anyhow::{Context, Result};
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::Converter;

#[derive(Debug, clap::ValueEnum, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SequenceFormat {
    #[default]
    Png,
    Jpg,
}

impl SequenceFormat {
    fn extension(self) -> &'static str {
        match self {
            SequenceFormat::Png => "png",
            SequenceFormat::Jpg => "jpg",
        }
    }
}

/// Writes every frame as `frame_NNNN.<ext>` inside a directory.
pub struct ImageSequenceConverter {
    dir: PathBuf,
    format: SequenceFormat,
    written: usize,
}

impl ImageSequenceConverter {
    pub fn new(dir: impl AsRef<Path>, format: SequenceFormat) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            format,
            written: 0,
        }
    }

    fn frame_path(&self, frame_id: usize) -> PathBuf {
        self.dir
            .join(format!("frame_{:04}.{}", frame_id, self.format.extension()))
    }
}

impl Converter for ImageSequenceConverter {
    fn prepare(&mut self, width: u32, height: u32, frame_rate: u32) -> Result<()> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir)
                .with_context(|| format!("creating {}", self.dir.display()))?;
        }
        log::info!(
            "writing {}x{} {} frames at {} fps to {}",
            width,
            height,
            self.format.extension(),
            frame_rate,
            self.dir.display()
        );
        Ok(())
    }

    fn convert_frame(&mut self, image: RgbaImage, frame_id: usize) -> Result<()> {
        let path = self.frame_path(frame_id);
        match self.format {
            SequenceFormat::Png => image.save(&path)?,
            // JPEG has no alpha channel
            SequenceFormat::Jpg => DynamicImage::ImageRgba8(image).to_rgb8().save(&path)?,
        }
        self.written += 1;
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        log::info!("Wrote {} frame(s)", self.written);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_land_inside_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("frames");
        for format in [SequenceFormat::Png, SequenceFormat::Jpg] {
            let mut converter = ImageSequenceConverter::new(&out, format);
            converter.prepare(2, 2, 12).unwrap();
            converter.convert_frame(RgbaImage::new(2, 2), 3).unwrap();
            converter.finish().unwrap();
            let path = out.join(format!("frame_0003.{}", format.extension()));
            assert!(path.exists(), "{}", path.display());
        }
    }

    #[test]
    fn png_keeps_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let mut converter = ImageSequenceConverter::new(dir.path(), SequenceFormat::Png);
        converter.prepare(1, 1, 12).unwrap();
        let image = RgbaImage::from_pixel(1, 1, image::Rgba([1, 2, 3, 4]));
        converter.convert_frame(image.clone(), 0).unwrap();
        let saved = image::open(dir.path().join("frame_0000.png")).unwrap().to_rgba8();
        assert_eq!(saved, image);
    }
}

//! On-disk layout of an animation container.
//!
//! ```text
//! GlobalHeader            24 bytes
//! ImageHeader             24 bytes  ┐
//! payload                 dataLength│ frame_count times
//! zero padding            0..=3     ┘
//! ```
//!
//! Every integer is a little-endian `u32`. Records start on 4-byte boundaries.

use binrw::prelude::*;
use serde::Serialize;
use std::io::Cursor;

use crate::error::{Error, Result};

/// `'anim'` as a multi-character literal.
pub const MAGIC: u32 = u32::from_be_bytes(*b"anim");
pub const VERSION: u32 = 1;
pub const GLOBAL_HEADER_SIZE: usize = 24;
pub const IMAGE_HEADER_SIZE: usize = 24;
pub const ALIGNMENT: usize = 4;

#[derive(BinRead, BinWrite, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[brw(little)]
pub struct GlobalHeader {
    pub magic: u32,
    pub version: u32,
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub frame_count: u32,
}

#[derive(BinRead, BinWrite, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[brw(little)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    pub xoffset: u32,
    pub yoffset: u32,
    pub format: u32,
    pub data_length: u32,
}

/// Payload encoding selected by [`ImageHeader::format`].
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ImageFormat {
    /// `'ping'`: a PNG file.
    Png,
    /// `'pixl'`: raw little-endian pixels, `width * height * 4` bytes.
    UncompressedPixels,
    /// `'rlen'`: word run-length encoded pixels.
    RunLengthCompressedPixels,
}

impl ImageFormat {
    pub const fn tag(self) -> u32 {
        match self {
            ImageFormat::Png => u32::from_be_bytes(*b"ping"),
            ImageFormat::UncompressedPixels => u32::from_be_bytes(*b"pixl"),
            ImageFormat::RunLengthCompressedPixels => u32::from_be_bytes(*b"rlen"),
        }
    }

    pub fn from_tag(tag: u32) -> Result<Self> {
        [
            ImageFormat::Png,
            ImageFormat::UncompressedPixels,
            ImageFormat::RunLengthCompressedPixels,
        ]
        .into_iter()
        .find(|f| f.tag() == tag)
        .ok_or(Error::UnknownFormatTag(tag))
    }

    /// Four-character code as written in tools and logs.
    pub fn fourcc(self) -> String {
        String::from_utf8_lossy(&self.tag().to_be_bytes()).into_owned()
    }
}

/// Zero bytes needed after an `n`-byte payload to reach the next boundary.
#[inline]
pub const fn padding_bytes(n: usize) -> usize {
    (ALIGNMENT - n % ALIGNMENT) % ALIGNMENT
}

fn check_available(bytes: &[u8], offset: usize, needed: usize) -> Result<()> {
    let available = bytes.len().saturating_sub(offset);
    if available < needed {
        return Err(Error::TruncatedHeader {
            offset,
            needed,
            available,
        });
    }
    Ok(())
}

impl GlobalHeader {
    pub fn new(width: u32, height: u32, frame_rate: u32, frame_count: u32) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            width,
            height,
            frame_rate,
            frame_count,
        }
    }

    /// Parse and validate the header at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        check_available(bytes, 0, GLOBAL_HEADER_SIZE)?;
        let header = GlobalHeader::read(&mut Cursor::new(&bytes[..GLOBAL_HEADER_SIZE]))?;
        header.validate()?;
        Ok(header)
    }

    pub fn validate(&self) -> Result<()> {
        if self.magic != MAGIC {
            return Err(Error::InvalidMagic {
                found: self.magic,
                expected: MAGIC,
            });
        }
        if self.version != VERSION {
            return Err(Error::UnsupportedVersion(self.version));
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidCanvas {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Number of pixels on the canvas.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::with_capacity(GLOBAL_HEADER_SIZE));
        self.write(&mut out)?;
        Ok(out.into_inner())
    }
}

impl ImageHeader {
    /// Parse the image header at `offset`, returning it with the offset of
    /// its payload. Only the header itself must be present.
    pub fn parse(bytes: &[u8], offset: usize) -> Result<(Self, usize)> {
        check_available(bytes, offset, IMAGE_HEADER_SIZE)?;
        let mut cursor = Cursor::new(&bytes[offset..offset + IMAGE_HEADER_SIZE]);
        let header = ImageHeader::read(&mut cursor)?;
        Ok((header, offset + IMAGE_HEADER_SIZE))
    }

    pub fn format(&self) -> Result<ImageFormat> {
        ImageFormat::from_tag(self.format)
    }

    pub fn data_length(&self) -> usize {
        self.data_length as usize
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Offset of the record following this one.
    pub fn next_record_offset(&self, payload_offset: usize) -> usize {
        let n = self.data_length();
        payload_offset + n + padding_bytes(n)
    }

    /// The payload slice, or [`Error::TruncatedPayload`] when the buffer
    /// ends early.
    pub fn payload<'a>(&self, bytes: &'a [u8], payload_offset: usize) -> Result<&'a [u8]> {
        let declared = self.data_length();
        let available = bytes.len().saturating_sub(payload_offset);
        if payload_offset > bytes.len() || declared > available {
            return Err(Error::TruncatedPayload {
                offset: payload_offset,
                declared,
                available,
            });
        }
        Ok(&bytes[payload_offset..payload_offset + declared])
    }

    /// Reject placements that reach outside the canvas.
    pub fn check_placement(&self, canvas: &GlobalHeader) -> Result<()> {
        let right = self.xoffset as u64 + self.width as u64;
        let bottom = self.yoffset as u64 + self.height as u64;
        if right > canvas.width as u64 || bottom > canvas.height as u64 {
            return Err(Error::OffsetOutOfCanvas {
                x: self.xoffset,
                y: self.yoffset,
                width: self.width,
                height: self.height,
                canvas_width: canvas.width,
                canvas_height: canvas.height,
            });
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::with_capacity(IMAGE_HEADER_SIZE));
        self.write(&mut out)?;
        Ok(out.into_inner())
    }
}

//! Run-length codecs for frame payloads.
//!
//! [`word`] is the canonical `rlen` scheme stored in containers. [`channel`]
//! is the older per-channel byte scheme, kept so output of earlier tools can
//! still be read back.
//!
//! A pixel is a `u32` whose little-endian bytes are the `R, G, B, A` channels
//! in memory order. The codecs treat it as opaque.

use crate::error::CodecError;

pub mod channel;
pub mod word;

pub type Pixel = u32;

#[inline]
pub fn pack_rgba(rgba: [u8; 4]) -> Pixel {
    Pixel::from_le_bytes(rgba)
}

#[inline]
pub fn unpack_rgba(pixel: Pixel) -> [u8; 4] {
    pixel.to_le_bytes()
}

/// Reinterpret interleaved RGBA bytes as packed pixels.
pub fn pixels_from_bytes(bytes: &[u8]) -> Result<Vec<Pixel>, CodecError> {
    if bytes.len() % 4 != 0 {
        return Err(CodecError::UnalignedInput { len: bytes.len() });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| pack_rgba([c[0], c[1], c[2], c[3]]))
        .collect())
}

pub fn pixels_to_bytes(pixels: &[Pixel]) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len() * 4);
    for p in pixels {
        out.extend_from_slice(&unpack_rgba(*p));
    }
    out
}

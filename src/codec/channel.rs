//! Per-channel byte RLE.
//!
//! Interleaved RGBA bytes are split into four channel planes (byte index
//! modulo 4). Each plane is run-length encoded on its own and the planes are
//! concatenated in channel order. A run is a count followed by the channel
//! byte:
//!
//! ```text
//! 1..=127       0nnn nnnn                 value
//! 128..=32767   1nnn nnnn  nnnn nnnn      value
//! ```
//!
//! Longer runs are split at [`MAX_RUN`].

use crate::error::CodecError;

pub const CHANNELS: usize = 4;

/// Longest run a single count can hold.
pub const MAX_RUN: u16 = 0x7fff;

const SHORT_RUN: u16 = 0x7f;
const LONG_FLAG: u8 = 0x80;

fn run_len(count: u16) -> usize {
    if count <= SHORT_RUN {
        2
    } else {
        3
    }
}

/// Runs of one channel plane, each at most [`MAX_RUN`] long.
fn plane_runs(rgba: &[u8], channel: usize) -> impl Iterator<Item = (u16, u8)> + '_ {
    let mut plane = rgba.iter().skip(channel).step_by(CHANNELS).copied().peekable();
    std::iter::from_fn(move || {
        let value = plane.next()?;
        let mut count: u16 = 1;
        while count < MAX_RUN && plane.next_if_eq(&value).is_some() {
            count += 1;
        }
        Some((count, value))
    })
}

fn check_aligned(rgba: &[u8]) -> Result<(), CodecError> {
    if rgba.len() % CHANNELS != 0 {
        return Err(CodecError::UnalignedInput { len: rgba.len() });
    }
    Ok(())
}

pub fn encoded_len(rgba: &[u8]) -> Result<usize, CodecError> {
    check_aligned(rgba)?;
    Ok((0..CHANNELS)
        .flat_map(|c| plane_runs(rgba, c))
        .map(|(count, _)| run_len(count))
        .sum())
}

/// Worst case: every run has length one in every channel.
pub fn max_encoded_len(pixel_count: usize) -> usize {
    pixel_count * CHANNELS * 2
}

/// Encode interleaved RGBA bytes into `dst`, returning the bytes written.
pub fn encode_into(rgba: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
    let needed = encoded_len(rgba)?;
    if dst.len() < needed {
        return Err(CodecError::DestinationTooSmall {
            needed,
            available: dst.len(),
        });
    }
    let mut written = 0;
    for channel in 0..CHANNELS {
        for (count, value) in plane_runs(rgba, channel) {
            written += write_run(&mut dst[written..], count, value);
        }
    }
    Ok(written)
}

pub fn encode(rgba: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut out = vec![0; encoded_len(rgba)?];
    let n = encode_into(rgba, &mut out)?;
    out.truncate(n);
    Ok(out)
}

fn write_run(dst: &mut [u8], count: u16, value: u8) -> usize {
    if count <= SHORT_RUN {
        dst[0] = count as u8;
        dst[1] = value;
        2
    } else {
        dst[0] = (count >> 8) as u8 | LONG_FLAG;
        dst[1] = (count & 0xff) as u8;
        dst[2] = value;
        3
    }
}

/// Decode four channel planes into `dst`, which must be sized for the
/// expected pixel count times four.
pub fn decode_into(src: &[u8], dst: &mut [u8]) -> Result<(), CodecError> {
    check_aligned(dst)?;
    let pixel_count = dst.len() / CHANNELS;
    let mut offset = 0;
    let mut decoded = 0;

    for channel in 0..CHANNELS {
        let mut filled = 0;
        while filled < pixel_count {
            let start = offset;
            let Some(&head) = src.get(offset) else {
                return Err(CodecError::Underflow {
                    decoded,
                    expected: dst.len(),
                });
            };
            offset += 1;
            let mut count = head as usize;
            if head & LONG_FLAG != 0 {
                let low = *src.get(offset).ok_or(CodecError::Truncated { offset })?;
                offset += 1;
                count = ((head & !LONG_FLAG) as usize) << 8 | low as usize;
            }
            let value = *src.get(offset).ok_or(CodecError::Truncated { offset })?;
            offset += 1;

            if count == 0 {
                return Err(CodecError::ZeroLengthRun { offset: start });
            }
            if count > pixel_count - filled {
                return Err(CodecError::Overflow {
                    offset: start,
                    expected: dst.len(),
                });
            }
            for px in filled..filled + count {
                dst[px * CHANNELS + channel] = value;
            }
            filled += count;
            decoded += count;
        }
    }

    if offset != src.len() {
        return Err(CodecError::TrailingData {
            remaining: src.len() - offset,
        });
    }
    Ok(())
}

pub fn decode(src: &[u8], pixel_count: usize) -> Result<Vec<u8>, CodecError> {
    let mut out = vec![0; pixel_count * CHANNELS];
    decode_into(src, &mut out)?;
    Ok(out)
}

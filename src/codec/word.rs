//! Word RLE: runs of whole pixels stored as `(count, pixel)` pairs of
//! little-endian 32-bit words.

use super::Pixel;
use crate::error::CodecError;

/// Size of one encoded run in bytes.
pub const RUN_SIZE: usize = 8;

/// Split `pixels` into maximal runs of equal values.
///
/// A run longer than `u32::MAX` cannot be stored in a count word and is
/// split into consecutive runs of the same value.
pub fn runs(pixels: &[Pixel]) -> impl Iterator<Item = (u32, Pixel)> + '_ {
    let mut pos = 0;
    std::iter::from_fn(move || {
        let value = *pixels.get(pos)?;
        let mut count: u32 = 1;
        pos += 1;
        while pos < pixels.len() && pixels[pos] == value && count < u32::MAX {
            count += 1;
            pos += 1;
        }
        Some((count, value))
    })
}

/// Exact number of bytes [`encode_into`] writes for `pixels`.
pub fn encoded_len(pixels: &[Pixel]) -> usize {
    runs(pixels).count() * RUN_SIZE
}

/// Upper bound of the encoded size, reached when no two neighbours are equal.
pub fn max_encoded_len(pixel_count: usize) -> usize {
    pixel_count * RUN_SIZE
}

/// Encode `pixels` into `dst`, returning the number of bytes written.
///
/// Nothing is written when `dst` is too small.
pub fn encode_into(pixels: &[Pixel], dst: &mut [u8]) -> Result<usize, CodecError> {
    let needed = encoded_len(pixels);
    if dst.len() < needed {
        return Err(CodecError::DestinationTooSmall {
            needed,
            available: dst.len(),
        });
    }
    let mut written = 0;
    for (count, value) in runs(pixels) {
        dst[written..written + 4].copy_from_slice(&count.to_le_bytes());
        dst[written + 4..written + 8].copy_from_slice(&value.to_le_bytes());
        written += RUN_SIZE;
    }
    Ok(written)
}

pub fn encode(pixels: &[Pixel]) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(pixels));
    for (count, value) in runs(pixels) {
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Decode `src` into exactly `dst.len()` pixels.
///
/// The stream must describe exactly that many pixels: a short stream, a run
/// that spills past the end, or bytes left after the last pixel are errors.
pub fn decode_into(src: &[u8], dst: &mut [Pixel]) -> Result<(), CodecError> {
    let expected = dst.len();
    let mut filled = 0;
    let mut offset = 0;

    while filled < expected {
        let run = match src.get(offset..offset + RUN_SIZE) {
            Some(run) => run,
            None if offset == src.len() => {
                return Err(CodecError::Underflow {
                    decoded: filled,
                    expected,
                })
            }
            None => return Err(CodecError::Truncated { offset }),
        };
        let count = u32::from_le_bytes([run[0], run[1], run[2], run[3]]) as usize;
        let value = Pixel::from_le_bytes([run[4], run[5], run[6], run[7]]);
        if count == 0 {
            return Err(CodecError::ZeroLengthRun { offset });
        }
        if count > expected - filled {
            return Err(CodecError::Overflow { offset, expected });
        }
        dst[filled..filled + count].fill(value);
        filled += count;
        offset += RUN_SIZE;
    }

    if offset != src.len() {
        return Err(CodecError::TrailingData {
            remaining: src.len() - offset,
        });
    }
    log::trace!("word rle: {} runs -> {} pixels", offset / RUN_SIZE, filled);
    Ok(())
}

pub fn decode(src: &[u8], pixel_count: usize) -> Result<Vec<Pixel>, CodecError> {
    let mut out = vec![0; pixel_count];
    decode_into(src, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    /// Pixel streams made of runs, so that both long runs and runs of one
    /// show up.
    fn arb_pixels() -> impl Strategy<Value = Vec<u32>> {
        prop::collection::vec((1usize..300, any::<u32>()), 0..40).prop_map(|runs| {
            runs.into_iter()
                .flat_map(|(count, value)| std::iter::repeat(value).take(count))
                .collect::<Vec<u32>>()
        })
    }

    proptest! {
        #[test]
        fn roundtrip_runs(pixels in arb_pixels()) {
            let encoded = encode(&pixels);
            prop_assert_eq!(encoded.len(), encoded_len(&pixels));
            prop_assert_eq!(decode(&encoded, pixels.len()).unwrap(), pixels);
        }

        #[test]
        fn roundtrip_arbitrary(pixels in prop::collection::vec(any::<u32>(), 0..512)) {
            let encoded = encode(&pixels);
            prop_assert!(encoded.len() <= max_encoded_len(pixels.len()));
            prop_assert_eq!(decode(&encoded, pixels.len()).unwrap(), pixels);
        }

        #[test]
        fn deterministic(pixels in arb_pixels()) {
            let mut dst = vec![0u8; max_encoded_len(pixels.len())];
            let n = encode_into(&pixels, &mut dst).unwrap();
            let expected = encode(&pixels);
            prop_assert_eq!(&dst[..n], expected.as_slice());
            prop_assert_eq!(encode(&pixels), encode(&pixels));
        }
    }

    fn words(bytes: &[u8]) -> Vec<u32> {
        bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn five_equal_pixels_make_one_run() {
        let encoded = encode(&[7, 7, 7, 7, 7]);
        assert_eq!(words(&encoded), vec![5, 7]);
        assert_eq!(decode(&encoded, 5).unwrap(), vec![7, 7, 7, 7, 7]);
    }

    #[test]
    fn empty_input() {
        assert!(encode(&[]).is_empty());
        assert_eq!(decode(&[], 0).unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn mixed_runs() {
        let pixels = [1, 1, 2, 3, 3, 3, 1];
        let encoded = encode(&pixels);
        assert_eq!(words(&encoded), vec![2, 1, 1, 2, 3, 3, 1, 1]);
        assert_eq!(encoded.len(), encoded_len(&pixels));
        assert_eq!(decode(&encoded, pixels.len()).unwrap(), pixels.to_vec());
    }

    #[test]
    fn all_distinct_hits_worst_case() {
        let pixels: Vec<u32> = (0..64).collect();
        let encoded = encode(&pixels);
        assert_eq!(encoded.len(), max_encoded_len(pixels.len()));
        assert_eq!(decode(&encoded, pixels.len()).unwrap(), pixels);
    }

    #[test]
    fn encoding_is_deterministic() {
        let pixels: Vec<u32> = (0..500).map(|i| (i / 7) as u32 ^ 0xff00_ff00).collect();
        assert_eq!(encode(&pixels), encode(&pixels));
    }

    #[test]
    fn encode_into_matches_encode() {
        let pixels = [9, 9, 8, 8, 8, 0xffff_ffff];
        let mut dst = vec![0xaa; max_encoded_len(pixels.len())];
        let n = encode_into(&pixels, &mut dst).unwrap();
        assert_eq!(&dst[..n], encode(&pixels).as_slice());
    }

    #[test]
    fn encode_into_rejects_small_destination() {
        let mut dst = [0u8; 8];
        assert_eq!(
            encode_into(&[1, 2], &mut dst),
            Err(CodecError::DestinationTooSmall {
                needed: 16,
                available: 8
            })
        );
        assert_eq!(dst, [0u8; 8]);
    }

    #[test]
    fn short_stream_underflows() {
        let encoded = encode(&[4, 4, 4]);
        assert_eq!(
            decode(&encoded, 5),
            Err(CodecError::Underflow {
                decoded: 3,
                expected: 5
            })
        );
    }

    #[test]
    fn long_run_overflows() {
        let encoded = encode(&[4, 4, 4]);
        assert_eq!(
            decode(&encoded, 2),
            Err(CodecError::Overflow {
                offset: 0,
                expected: 2
            })
        );
    }

    #[test]
    fn extra_runs_are_trailing_data() {
        let encoded = encode(&[1, 2]);
        assert_eq!(
            decode(&encoded, 1),
            Err(CodecError::TrailingData { remaining: 8 })
        );
    }

    #[test]
    fn partial_run_is_truncated() {
        let mut encoded = encode(&[1, 1]);
        encoded.extend_from_slice(&[1, 0, 0]);
        assert_eq!(
            decode(&encoded, 3),
            Err(CodecError::Truncated { offset: 8 })
        );
    }

    #[test]
    fn zero_count_is_rejected() {
        let mut encoded = vec![0u8; 8];
        encoded.extend(encode(&[3]));
        assert_eq!(
            decode(&encoded, 1),
            Err(CodecError::ZeroLengthRun { offset: 0 })
        );
    }
}

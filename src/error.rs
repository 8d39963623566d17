use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised by the run-length codecs.
///
/// Offsets are byte positions in the compressed stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("destination holds {available} bytes, {needed} required")]
    DestinationTooSmall { needed: usize, available: usize },

    #[error("compressed stream truncated at byte {offset}")]
    Truncated { offset: usize },

    #[error("zero-length run at byte {offset}")]
    ZeroLengthRun { offset: usize },

    #[error("run at byte {offset} expands past the expected {expected} elements")]
    Overflow { offset: usize, expected: usize },

    #[error("stream ended after {decoded} of {expected} elements")]
    Underflow { decoded: usize, expected: usize },

    #[error("{remaining} bytes left over after all elements were decoded")]
    TrailingData { remaining: usize },

    #[error("input of {len} bytes is not a whole number of 4-byte pixels")]
    UnalignedInput { len: usize },
}

/// Errors raised while parsing, decoding or writing an animation container.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid magic {found:#010x}, expected {expected:#010x}")]
    InvalidMagic { found: u32, expected: u32 },

    #[error("unsupported container version {0}")]
    UnsupportedVersion(u32),

    #[error("invalid canvas size {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },

    #[error("truncated header at offset {offset}: {needed} bytes needed, {available} available")]
    TruncatedHeader {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("truncated payload at offset {offset}: {declared} bytes declared, {available} available")]
    TruncatedPayload {
        offset: usize,
        declared: usize,
        available: usize,
    },

    #[error("frame {index} out of range, animation has {count} frame(s)")]
    FrameIndexOutOfRange { index: usize, count: usize },

    #[error("unknown image format tag {0:#010x}")]
    UnknownFormatTag(u32),

    #[error("payload is {actual} bytes, {expected} expected")]
    PayloadLengthMismatch { expected: usize, actual: usize },

    #[error("payload of {0} bytes does not fit a 32-bit length field")]
    PayloadTooLarge(usize),

    #[error("image {width}x{height} at ({x}, {y}) does not fit a {canvas_width}x{canvas_height} canvas")]
    OffsetOutOfCanvas {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        canvas_width: u32,
        canvas_height: u32,
    },

    #[error("destination holds {available} pixels, {needed} required")]
    DestinationTooSmall { needed: usize, available: usize },

    #[error("frame buffer is {buffer_width}x{buffer_height}, canvas is {width}x{height}")]
    CanvasMismatch {
        width: u32,
        height: u32,
        buffer_width: u32,
        buffer_height: u32,
    },

    #[error("source image is {actual_width}x{actual_height}, expected {width}x{height}")]
    SourceSizeMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("binary layout error: {0}")]
    Binary(#[from] binrw::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

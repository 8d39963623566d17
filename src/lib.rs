//! Sprite animation containers: a fixed global header followed by one
//! image record per frame, with run-length compressed pixel payloads.

pub mod codec;
pub mod error;
pub mod frame;
pub mod pack;
pub mod reader;
pub mod writer;

pub use codec::Pixel;
pub use error::{CodecError, Error, Result};
pub use frame::FrameBuffer;
pub use pack::{GlobalHeader, ImageFormat, ImageHeader};
pub use reader::{Animation, Frame, ImagePngDecoder, PngDecoder};
pub use writer::ContainerWriter;

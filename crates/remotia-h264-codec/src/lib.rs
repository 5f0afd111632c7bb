//! H.264 decompression into packed XRGB32 frames for remotia clients.
//!
//! The bitstream itself is decoded by an external, stateful decoder plugged in
//! through [`backend::DecoderBackend`]. This crate prepares the input for it,
//! validates what it hands back and converts the I420 picture into the frame
//! buffer owned by an [`H264Context`].

pub mod backend;
pub mod buffer;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod nal;
pub mod processor;

#[cfg(feature = "openh264")]
pub mod openh264_backend;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use context::{H264Context, H264ContextBuilder};
pub use error::H264Error;

#[cfg(test)]
mod tests;

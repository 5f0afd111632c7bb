//! Pipeline seams shared by the remotia-h264 processors.
//!
//! Frames travel through a pipeline as user-defined DTOs. Processors only
//! see them through the traits in [`traits`], so the decoding components
//! can be plugged into any frame type that stores its buffers by key.

pub mod error;
pub mod traits;

//! H.264 decompression for remote desktop clients.
//!
//! Member crates are re-exported behind the `yuv` and `codec` features.

pub use remotia_core::*;

#[cfg(feature = "yuv")]
pub mod yuv {
    pub use remotia_yuv_utils::*;
}

#[cfg(feature = "codec")]
pub mod codec {
    pub use remotia_h264_codec::*;
}

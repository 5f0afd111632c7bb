//! Conversion of planar YUV 4:2:0 (I420) pictures to packed 32 bit XRGB frames.
//!
//! [`pixel`] holds the per-sample colorspace conversion, [`raster`] walks whole
//! planes into a destination frame and [`upconvert`] interpolates 4:2:0 chroma
//! planes up to full resolution.

pub mod pixel;
pub mod raster;
pub mod upconvert;

mod error;
pub use error::RasterError;

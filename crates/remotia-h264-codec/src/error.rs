use remotia_core::error::DropReason;
use serde::Serialize;
use thiserror::Error;

use crate::backend::{DecodingState, VideoFormat};

#[derive(Error, Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum H264Error {
    #[error("Invalid context, no decoder attached")]
    InvalidContext,

    #[error("Invalid input size")]
    InvalidInputSize,

    #[error("Frame buffer allocation failure")]
    AllocationFailure,

    #[error("Decoder initialization failure (status {0})")]
    Initialization(i64),

    #[error("Decoder failure (state {0})")]
    DecoderFailure(DecodingState),

    #[error("Decoder returned an incomplete picture")]
    IncompletePicture,

    #[error("Unsupported decoded format {0:?}")]
    UnsupportedFormat(VideoFormat),

    #[error("No decoded frames available")]
    NotReady,
}

impl From<H264Error> for DropReason {
    fn from(error: H264Error) -> Self {
        match error {
            H264Error::InvalidInputSize => DropReason::EmptyFrame,
            H264Error::AllocationFailure => DropReason::NoAvailableBuffers,
            H264Error::NotReady => DropReason::NoDecodedFrames,
            H264Error::UnsupportedFormat(_) => DropReason::UnsupportedFormat,
            H264Error::InvalidContext
            | H264Error::Initialization(_)
            | H264Error::DecoderFailure(_)
            | H264Error::IncompletePicture => DropReason::CodecError,
        }
    }
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Copy)]
pub enum DropReason {
    #[error("Empty frame")]
    EmptyFrame,

    #[error("No decoded frames available")]
    NoDecodedFrames,

    #[error("Generic codec error")]
    CodecError,

    #[error("Unsupported decoded pixel format")]
    UnsupportedFormat,

    #[error("No available buffers")]
    NoAvailableBuffers,
}

//! Interface of the external H.264 decoder.
//!
//! Decoders are stateful and not reentrant: a backend instance belongs to a
//! single [`crate::H264Context`] and is only driven by one call at a time.

use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

/// Bitmask returned by the external decoder for each decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecodingState(u32);

impl DecodingState {
    pub const ERROR_FREE: Self = Self(0x00);
    pub const FRAME_PENDING: Self = Self(0x01);
    pub const REF_LOST: Self = Self(0x02);
    pub const BITSTREAM_ERROR: Self = Self(0x04);
    pub const DEP_LAYER_LOST: Self = Self(0x08);
    pub const NO_PARAM_SETS: Self = Self(0x10);
    pub const DATA_ERROR_CONCEALED: Self = Self(0x20);
    pub const REF_LIST_NULL_PTRS: Self = Self(0x40);
    pub const INVALID_ARGUMENT: Self = Self(0x1000);
    pub const INIT_EXPECTED: Self = Self(0x2000);
    pub const OUT_OF_MEMORY: Self = Self(0x4000);
    pub const DST_BUFFER_NEED_EXPANSION: Self = Self(0x8000);

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn is_error_free(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for DecodingState {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for DecodingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BufferStatus {
    NotReady,
    Ready,
}

impl BufferStatus {
    pub fn from_raw(value: i32) -> Self {
        if value == 1 {
            Self::Ready
        } else {
            Self::NotReady
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoFormat {
    I420,
    Yv12,
    Nv12,
    Yuy2,
    Rgba,
    Bgra,
    Other(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BitstreamType {
    #[default]
    Default,
    Avc,
    Svc,
}

/// Parameters handed to [`DecoderBackend::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodingParams {
    pub output_format: VideoFormat,
    pub error_concealment: bool,
    pub bitstream_type: BitstreamType,
}

impl Default for DecodingParams {
    fn default() -> Self {
        Self {
            output_format: VideoFormat::I420,
            error_concealment: true,
            bitstream_type: BitstreamType::Default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderOption {
    DataFormat(VideoFormat),
    TraceLevel(u32),
    ErrorConcealment(bool),
}

/// Result of a single [`DecoderBackend::decode_frame`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOutcome {
    pub state: DecodingState,
    pub buffer_status: BufferStatus,
}

impl DecodeOutcome {
    pub fn ready() -> Self {
        Self {
            state: DecodingState::ERROR_FREE,
            buffer_status: BufferStatus::Ready,
        }
    }

    pub fn pending() -> Self {
        Self {
            state: DecodingState::ERROR_FREE,
            buffer_status: BufferStatus::NotReady,
        }
    }

    pub fn failed(state: DecodingState) -> Self {
        Self {
            state,
            buffer_status: BufferStatus::NotReady,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Held {
    #[default]
    Nothing,
    Picture,
    Failure(DecodingState),
}

/// What a decoder without internal delay owes to the flush call following a
/// decode call.
///
/// Backends that produce pictures (or fail) immediately hold the result here
/// and report it on the next empty [`DecoderBackend::decode_frame`] call, so
/// the flush carries the state of the access unit just fed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlushState {
    held: Held,
}

impl FlushState {
    pub fn hold_picture(&mut self) {
        self.held = Held::Picture;
    }

    pub fn hold_failure(&mut self, state: DecodingState) {
        self.held = Held::Failure(state);
    }

    pub fn clear(&mut self) {
        self.held = Held::Nothing;
    }

    /// Outcome of the flush call; the held result is consumed.
    pub fn flush(&mut self) -> DecodeOutcome {
        match std::mem::take(&mut self.held) {
            Held::Nothing => DecodeOutcome::pending(),
            Held::Picture => DecodeOutcome::ready(),
            Held::Failure(state) => DecodeOutcome::failed(state),
        }
    }
}

/// Picture exposed by the decoder after a decode call.
///
/// Planes are `None` when the decoder did not fill the matching output
/// pointer. U and V share the chroma stride.
#[derive(Debug, Clone, Copy)]
pub struct DecodedPlanes<'a> {
    pub planes: [Option<&'a [u8]>; 3],
    pub strides: [usize; 2],
    pub width: usize,
    pub height: usize,
    pub format: VideoFormat,
}

pub trait DecoderBackend: Send {
    /// Prepares the decoder, returning the native status code on failure.
    fn initialize(&mut self, params: &DecodingParams) -> Result<(), i64>;

    fn set_option(&mut self, option: DecoderOption) -> Result<(), i64>;

    /// Feeds one access unit to the decoder. An empty `src` flushes frames
    /// still buffered inside the decoder.
    fn decode_frame(&mut self, src: &[u8]) -> DecodeOutcome;

    /// Latest picture produced by [`DecoderBackend::decode_frame`], kept
    /// until a later call replaces it.
    fn picture(&self) -> Option<DecodedPlanes<'_>>;

    fn uninitialize(&mut self);
}

//! Scriptable [`DecoderBackend`] for exercising contexts without a real
//! decoder.
//!
//! A non empty decode call only marks a picture as pending; the following
//! flush call renders it from the current [`FakeScript`]. Every call is
//! recorded and can be inspected through a [`FakeHandle`].
//!
//! `FakeScript::state` fails every call, while `FakeScript::input_failure`
//! fails only the call carrying data and leaves it to the flush to report it,
//! as decoders without internal delay do.

use std::sync::{Arc, Mutex};

use remotia_yuv_utils::raster::chroma_extent;

use crate::backend::{
    BufferStatus, DecodeOutcome, DecodedPlanes, DecoderBackend, DecoderOption, DecodingParams,
    DecodingState, FlushState, VideoFormat,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Initialize(DecodingParams),
    SetOption(DecoderOption),
    DecodeFrame(Vec<u8>),
    Uninitialize,
}

#[derive(Debug, Clone)]
pub struct FakeScript {
    pub initialize_status: Result<(), i64>,
    pub option_status: Result<(), i64>,
    pub state: DecodingState,
    pub input_failure: Option<DecodingState>,
    pub buffer_status: BufferStatus,
    pub format: VideoFormat,
    pub width: usize,
    pub height: usize,
    pub y_padding: usize,
    pub uv_padding: usize,
    /// Y, U and V values every plane is filled with.
    pub sample: (u8, u8, u8),
    pub missing_plane: Option<usize>,
    /// Drops the last byte of the luma plane.
    pub short_luma: bool,
}

impl Default for FakeScript {
    fn default() -> Self {
        Self {
            initialize_status: Ok(()),
            option_status: Ok(()),
            state: DecodingState::ERROR_FREE,
            input_failure: None,
            buffer_status: BufferStatus::Ready,
            format: VideoFormat::I420,
            width: 64,
            height: 32,
            y_padding: 0,
            uv_padding: 0,
            sample: (128, 128, 128),
            missing_plane: None,
            short_luma: false,
        }
    }
}

impl FakeScript {
    pub fn size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn sample(mut self, y: u8, u: u8, v: u8) -> Self {
        self.sample = (y, u, v);
        self
    }

    pub fn padding(mut self, y_padding: usize, uv_padding: usize) -> Self {
        self.y_padding = y_padding;
        self.uv_padding = uv_padding;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeHandle {
    script: Arc<Mutex<FakeScript>>,
    calls: Arc<Mutex<Vec<BackendCall>>>,
}

impl FakeHandle {
    /// Changes the script used by the following calls.
    pub fn update<F: FnOnce(&mut FakeScript)>(&self, change: F) {
        change(&mut self.script.lock().unwrap());
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn decoded_inputs(&self) -> Vec<Vec<u8>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::DecodeFrame(data) => Some(data),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, expected: &BackendCall) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| *call == expected)
            .count()
    }

    fn script(&self) -> FakeScript {
        self.script.lock().unwrap().clone()
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }
}

struct FakePicture {
    planes: [Option<Vec<u8>>; 3],
    strides: [usize; 2],
    width: usize,
    height: usize,
    format: VideoFormat,
}

impl FakePicture {
    fn render(script: &FakeScript) -> Self {
        let y_stride = script.width + script.y_padding;
        let uv_stride = chroma_extent(script.width) + script.uv_padding;

        let mut y = vec![script.sample.0; y_stride * script.height];
        if script.short_luma {
            y.pop();
        }

        let chroma_len = uv_stride * chroma_extent(script.height);
        let u = vec![script.sample.1; chroma_len];
        let v = vec![script.sample.2; chroma_len];

        let mut planes = [Some(y), Some(u), Some(v)];
        if let Some(index) = script.missing_plane {
            planes[index] = None;
        }

        Self {
            planes,
            strides: [y_stride, uv_stride],
            width: script.width,
            height: script.height,
            format: script.format,
        }
    }
}

pub struct FakeBackend {
    handle: FakeHandle,
    flush: FlushState,
    picture: Option<FakePicture>,
}

impl FakeBackend {
    pub fn new(script: FakeScript) -> Self {
        let handle = FakeHandle::default();
        handle.update(|current| *current = script);

        Self {
            handle,
            flush: FlushState::default(),
            picture: None,
        }
    }

    pub fn handle(&self) -> FakeHandle {
        self.handle.clone()
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new(FakeScript::default())
    }
}

impl DecoderBackend for FakeBackend {
    fn initialize(&mut self, params: &DecodingParams) -> Result<(), i64> {
        self.handle.record(BackendCall::Initialize(*params));
        self.handle.script().initialize_status
    }

    fn set_option(&mut self, option: DecoderOption) -> Result<(), i64> {
        self.handle.record(BackendCall::SetOption(option));
        self.handle.script().option_status
    }

    fn decode_frame(&mut self, src: &[u8]) -> DecodeOutcome {
        self.handle.record(BackendCall::DecodeFrame(src.to_vec()));
        let script = self.handle.script();

        if !script.state.is_error_free() {
            self.flush.clear();
            return DecodeOutcome::failed(script.state);
        }

        if !src.is_empty() {
            return match script.input_failure {
                Some(state) => {
                    self.flush.hold_failure(state);
                    DecodeOutcome::failed(state)
                }
                None => {
                    self.flush.hold_picture();
                    DecodeOutcome::pending()
                }
            };
        }

        let outcome = self.flush.flush();
        if outcome.buffer_status != BufferStatus::Ready {
            return outcome;
        }

        self.picture = Some(FakePicture::render(&script));

        DecodeOutcome {
            state: script.state,
            buffer_status: script.buffer_status,
        }
    }

    fn picture(&self) -> Option<DecodedPlanes<'_>> {
        self.picture.as_ref().map(|picture| DecodedPlanes {
            planes: [
                picture.planes[0].as_deref(),
                picture.planes[1].as_deref(),
                picture.planes[2].as_deref(),
            ],
            strides: picture.strides,
            width: picture.width,
            height: picture.height,
            format: picture.format,
        })
    }

    fn uninitialize(&mut self) {
        self.handle.record(BackendCall::Uninitialize);
    }
}

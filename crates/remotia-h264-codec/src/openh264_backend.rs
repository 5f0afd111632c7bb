use log::{debug, warn};
use openh264::{decoder::Decoder, formats::YUVSource};

use crate::backend::{
    DecodeOutcome, DecodedPlanes, DecoderBackend, DecoderOption, DecodingParams, DecodingState,
    FlushState, VideoFormat,
};

const STATUS_FAILURE: i64 = -1;

struct OwnedPicture {
    y: Vec<u8>,
    u: Vec<u8>,
    v: Vec<u8>,
    strides: [usize; 2],
    width: usize,
    height: usize,
}

/// [`DecoderBackend`] on top of Cisco's OpenH264 decoder.
///
/// OpenH264 hands pictures back without delay, so the picture of a non empty
/// call is kept and reported as ready by the flush call that follows it.
/// Decode errors are reported by both calls.
#[derive(Default)]
pub struct OpenH264Backend {
    decoder: Option<Decoder>,
    picture: Option<OwnedPicture>,
    flush: FlushState,
}

// The decoder is only ever driven through `&mut self` by its owning context
unsafe impl Send for OpenH264Backend {}

impl OpenH264Backend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DecoderBackend for OpenH264Backend {
    fn initialize(&mut self, params: &DecodingParams) -> Result<(), i64> {
        debug!("Initializing OpenH264 decoder with {:?}", params);

        let decoder = Decoder::new().map_err(|err| {
            warn!("Unable to create OpenH264 decoder: {}", err);
            STATUS_FAILURE
        })?;

        self.decoder = Some(decoder);
        Ok(())
    }

    fn set_option(&mut self, option: DecoderOption) -> Result<(), i64> {
        match option {
            DecoderOption::DataFormat(VideoFormat::I420) => Ok(()),
            DecoderOption::DataFormat(format) => {
                warn!("OpenH264 only outputs I420, {:?} requested", format);
                Err(STATUS_FAILURE)
            }
            option => {
                debug!("Ignoring decoder option {:?}", option);
                Ok(())
            }
        }
    }

    fn decode_frame(&mut self, src: &[u8]) -> DecodeOutcome {
        let decoder = match self.decoder.as_mut() {
            Some(decoder) => decoder,
            None => return DecodeOutcome::failed(DecodingState::INIT_EXPECTED),
        };

        if src.is_empty() {
            return self.flush.flush();
        }

        self.flush.clear();

        match decoder.decode(src) {
            Ok(Some(yuv)) => {
                let (width, height) = yuv.dimensions();
                let (y_stride, uv_stride, _) = yuv.strides();

                self.picture = Some(OwnedPicture {
                    y: yuv.y().to_vec(),
                    u: yuv.u().to_vec(),
                    v: yuv.v().to_vec(),
                    strides: [y_stride, uv_stride],
                    width,
                    height,
                });
                self.flush.hold_picture();

                DecodeOutcome::pending()
            }
            Ok(None) => DecodeOutcome::pending(),
            Err(err) => {
                warn!("OpenH264 failed to decode {} bytes: {}", src.len(), err);
                self.flush.hold_failure(DecodingState::BITSTREAM_ERROR);
                DecodeOutcome::failed(DecodingState::BITSTREAM_ERROR)
            }
        }
    }

    fn picture(&self) -> Option<DecodedPlanes<'_>> {
        self.picture.as_ref().map(|picture| DecodedPlanes {
            planes: [
                Some(picture.y.as_slice()),
                Some(picture.u.as_slice()),
                Some(picture.v.as_slice()),
            ],
            strides: picture.strides,
            width: picture.width,
            height: picture.height,
            format: VideoFormat::I420,
        })
    }

    fn uninitialize(&mut self) {
        self.decoder = None;
        self.picture = None;
        self.flush.clear();
    }
}

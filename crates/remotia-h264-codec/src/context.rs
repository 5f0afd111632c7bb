use log::{debug, trace, warn};
use remotia_yuv_utils::raster::{self, XrgbRect, YuvPlanes};

use crate::{
    backend::{BufferStatus, DecoderBackend, DecoderOption, DecodingParams, VideoFormat},
    buffer::{FrameBuffer, BYTES_PER_PIXEL},
    diagnostics::{DumpConfig, FrameDumper},
    nal, H264Error,
};

pub const DEFAULT_WIDTH: usize = 256;
pub const DEFAULT_HEIGHT: usize = 256;

pub struct H264ContextBuilder {
    compressor: bool,
    backend: Option<Box<dyn DecoderBackend>>,
    params: DecodingParams,
    dump_config: DumpConfig,
    initial_width: usize,
    initial_height: usize,
}

impl Default for H264ContextBuilder {
    fn default() -> Self {
        Self {
            compressor: false,
            backend: None,
            params: DecodingParams::default(),
            dump_config: DumpConfig::default(),
            initial_width: DEFAULT_WIDTH,
            initial_height: DEFAULT_HEIGHT,
        }
    }
}

impl H264ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // Building functions
    pub fn compressor(mut self, value: bool) -> Self {
        self.compressor = value;
        self
    }

    pub fn backend<B: DecoderBackend + 'static>(mut self, backend: B) -> Self {
        self.backend = Some(Box::new(backend));
        self
    }

    pub fn boxed_backend(mut self, backend: Box<dyn DecoderBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn params(mut self, params: DecodingParams) -> Self {
        self.params = params;
        self
    }

    pub fn dump_config(mut self, config: DumpConfig) -> Self {
        self.dump_config = config;
        self
    }

    pub fn initial_size(mut self, width: usize, height: usize) -> Self {
        self.initial_width = width;
        self.initial_height = height;
        self
    }

    /// Allocates the frame buffer and, for decoding contexts, initializes the
    /// decoder backend.
    ///
    /// Whatever was acquired before a failure is released again: a backend
    /// that failed to initialize is dropped without being uninitialized.
    pub fn build(self) -> Result<H264Context, H264Error> {
        let buffer = FrameBuffer::new(self.initial_width, self.initial_height)?;

        let decoder = if self.compressor {
            if self.backend.is_some() {
                debug!("Compressor context, the decoder backend is left unused");
            }

            None
        } else {
            let mut backend = self.backend.ok_or(H264Error::InvalidContext)?;

            if let Err(status) = backend.initialize(&self.params) {
                warn!("Failed to initialize H.264 decoder (status={})", status);
                return Err(H264Error::Initialization(status));
            }

            let option = DecoderOption::DataFormat(self.params.output_format);
            if let Err(status) = backend.set_option(option) {
                warn!(
                    "Failed to set data format option on H.264 decoder (status={})",
                    status
                );
            }

            Some(backend)
        };

        Ok(H264Context {
            compressor: self.compressor,
            buffer,
            decoder,
            dumper: FrameDumper::new(self.dump_config),
        })
    }
}

/// Decoding state of one H.264 stream.
///
/// A context owns its decoder backend and the XRGB32 frame buffer the decoded
/// pictures are converted into. It is driven by a single caller: concurrent
/// streams need one context each.
pub struct H264Context {
    compressor: bool,
    buffer: FrameBuffer,
    decoder: Option<Box<dyn DecoderBackend>>,
    dumper: FrameDumper,
}

impl H264Context {
    pub fn builder() -> H264ContextBuilder {
        H264ContextBuilder::new()
    }

    pub fn new(compressor: bool, backend: Option<Box<dyn DecoderBackend>>) -> Result<Self, H264Error> {
        let builder = Self::builder().compressor(compressor);

        match backend {
            Some(backend) => builder.boxed_backend(backend).build(),
            None => builder.build(),
        }
    }

    /// Decodes one access unit into the context frame buffer.
    ///
    /// `rect` is the area requested by the caller. Only its size is used: it
    /// must be non empty and sizes the caller buffer allocated into `dst` when
    /// `dst` is `None`. The decoded picture is always written whole, at its
    /// native size, at the origin of the context buffer (see [`Self::frame`]);
    /// `dst` itself is never written.
    ///
    /// On failure the previous frame and its dimensions are left untouched.
    pub fn decompress(
        &mut self,
        src: &[u8],
        dst: &mut Option<Vec<u8>>,
        dst_format: u32,
        rect: XrgbRect,
    ) -> Result<(), H264Error> {
        if self.decoder.is_none() {
            return Err(H264Error::InvalidContext);
        }

        let uncompressed_size = rect
            .width
            .checked_mul(rect.height)
            .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL))
            .ok_or(H264Error::InvalidInputSize)?;

        if uncompressed_size == 0 {
            return Err(H264Error::InvalidInputSize);
        }

        if dst.is_none() {
            let mut buffer = Vec::new();
            buffer
                .try_reserve_exact(uncompressed_size)
                .map_err(|_| H264Error::AllocationFailure)?;
            buffer.resize(uncompressed_size, 0);
            *dst = Some(buffer);
        }

        trace!(
            "Decompressing {} bytes (dst format {:#x}, requested {:?})",
            src.len(),
            dst_format,
            rect
        );

        self.decode(src)
    }

    /// Runs one access unit through the decoder and converts the resulting
    /// picture into the context frame buffer.
    ///
    /// Only the state reported by the flush call is checked. The decoder
    /// output is then validated in this order, the first failing check
    /// deciding the error:
    ///
    /// 1. non zero decoding state: [`H264Error::DecoderFailure`]
    /// 2. no picture or a missing plane: [`H264Error::IncompletePicture`]
    /// 3. buffer not ready: [`H264Error::NotReady`]
    /// 4. format other than I420: [`H264Error::UnsupportedFormat`]
    /// 5. empty size or planes too short for it: [`H264Error::IncompletePicture`]
    ///
    /// A decoder that has not produced any picture yet therefore yields
    /// `IncompletePicture` even when its buffer is not ready.
    pub fn decode(&mut self, src: &[u8]) -> Result<(), H264Error> {
        let decoder = self.decoder.as_mut().ok_or(H264Error::InvalidContext)?;

        let src = nal::strip_au_delimiter(src);
        self.dumper.dump_bitstream(src);

        // Pictures may stay buffered inside the decoder after the first call,
        // the empty call flushes them out.
        let first = decoder.decode_frame(src);
        let outcome = decoder.decode_frame(&[]);

        debug!(
            "Decoded {} bytes: state={} ({:?} after first call), buffer status={:?}",
            src.len(),
            outcome.state,
            first.buffer_status,
            outcome.buffer_status
        );

        if !outcome.state.is_error_free() {
            return Err(H264Error::DecoderFailure(outcome.state));
        }

        let picture = decoder.picture().ok_or(H264Error::IncompletePicture)?;

        let (y, u, v) = match picture.planes {
            [Some(y), Some(u), Some(v)] => (y, u, v),
            _ => return Err(H264Error::IncompletePicture),
        };

        if outcome.buffer_status != BufferStatus::Ready {
            return Err(H264Error::NotReady);
        }

        if picture.format != VideoFormat::I420 {
            return Err(H264Error::UnsupportedFormat(picture.format));
        }

        let (width, height) = (picture.width, picture.height);
        if width == 0 || height == 0 {
            return Err(H264Error::IncompletePicture);
        }

        let planes = YuvPlanes {
            y,
            u,
            v,
            y_stride: picture.strides[0],
            uv_stride: picture.strides[1],
        };

        raster::validate_planes(&planes, width, height).map_err(|err| {
            debug!("Rejecting decoded picture: {}", err);
            H264Error::IncompletePicture
        })?;

        self.dumper.dump_luma(y, planes.y_stride, width, height);

        self.buffer.prepare(width, height)?;

        raster::copy_yuv420p_to_xrgb(&planes, self.buffer.as_mut_slice(), XrgbRect::full(width, height))
            .map_err(|err| {
                warn!("Unable to convert decoded picture: {}", err);
                H264Error::IncompletePicture
            })?;

        self.dumper
            .dump_xrgb(self.buffer.as_slice(), self.buffer.scanline(), width, height);
        self.dumper.advance();

        Ok(())
    }

    /// Encoding is not supported yet: nothing is written to `dst` and `0` is
    /// returned.
    pub fn compress(&mut self, src: &[u8], dst: &mut Vec<u8>) -> Result<usize, H264Error> {
        trace!(
            "Ignoring compression of {} bytes ({} bytes available)",
            src.len(),
            dst.capacity()
        );
        Ok(0)
    }

    pub fn reset(&mut self) {}

    pub fn is_compressor(&self) -> bool {
        self.compressor
    }

    pub fn width(&self) -> usize {
        self.buffer.width()
    }

    pub fn height(&self) -> usize {
        self.buffer.height()
    }

    pub fn scanline(&self) -> usize {
        self.buffer.scanline()
    }

    /// Size in bytes of the frame buffer allocation.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    /// The last decoded frame as XRGB32 rows of `scanline` bytes.
    pub fn frame(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Frames successfully decoded by this context.
    pub fn frame_id(&self) -> u64 {
        self.dumper.frame_id()
    }

    pub fn dump_config(&self) -> &DumpConfig {
        self.dumper.config()
    }
}

impl Drop for H264Context {
    fn drop(&mut self) {
        self.buffer.release();

        if let Some(mut decoder) = self.decoder.take() {
            decoder.uninitialize();
        }
    }
}

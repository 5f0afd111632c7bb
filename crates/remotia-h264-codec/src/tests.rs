use remotia_yuv_utils::{pixel::yuv_to_xrgb, raster::XrgbRect};

use crate::{
    backend::{
        BufferStatus, DecodeOutcome, DecodedPlanes, DecoderBackend, DecoderOption, DecodingParams,
        DecodingState, VideoFormat,
    },
    diagnostics::DumpConfig,
    testing::{BackendCall, FakeBackend, FakeHandle, FakeScript},
    H264Context, H264Error,
};

const ACCESS_UNIT: &[u8] = &[0x00, 0x00, 0x00, 0x01, 0x65, 0x88, 0x84, 0x00];

fn decoding_context(script: FakeScript) -> (H264Context, FakeHandle) {
    env_logger::try_init().ok();

    let backend = FakeBackend::new(script);
    let handle = backend.handle();
    let context = H264Context::builder().backend(backend).build().unwrap();

    (context, handle)
}

fn decompress(context: &mut H264Context, src: &[u8]) -> Result<(), H264Error> {
    let mut dst = None;
    context.decompress(src, &mut dst, 0, XrgbRect::full(64, 32))
}

struct Snapshot {
    width: usize,
    height: usize,
    scanline: usize,
    address: *const u8,
    frame: Vec<u8>,
}

fn snapshot(context: &H264Context) -> Snapshot {
    Snapshot {
        width: context.width(),
        height: context.height(),
        scanline: context.scanline(),
        address: context.frame().as_ptr(),
        frame: context.frame().to_vec(),
    }
}

fn assert_unchanged(context: &H264Context, before: &Snapshot) {
    assert_eq!(context.width(), before.width);
    assert_eq!(context.height(), before.height);
    assert_eq!(context.scanline(), before.scanline);
    assert_eq!(context.frame().as_ptr(), before.address);
    assert_eq!(context.frame(), &before.frame[..]);
}

#[test]
fn test_new_decoder_initializes_backend() {
    let (context, handle) = decoding_context(FakeScript::default());

    assert!(!context.is_compressor());
    assert_eq!((context.width(), context.height()), (256, 256));
    assert_eq!(context.scanline(), 256 * 4);
    assert_eq!(context.capacity(), 256 * 256 * 4);
    assert_eq!(
        handle.calls(),
        vec![
            BackendCall::Initialize(DecodingParams::default()),
            BackendCall::SetOption(DecoderOption::DataFormat(VideoFormat::I420)),
        ]
    );
}

#[test]
fn test_rejected_option_is_not_fatal() {
    let script = FakeScript {
        option_status: Err(-3),
        ..FakeScript::default()
    };
    let (mut context, _) = decoding_context(script);

    assert!(decompress(&mut context, ACCESS_UNIT).is_ok());
}

#[test]
fn test_initialization_failure() {
    let backend = FakeBackend::new(FakeScript {
        initialize_status: Err(-1),
        ..FakeScript::default()
    });
    let handle = backend.handle();

    let result = H264Context::builder().backend(backend).build();

    assert!(matches!(result, Err(H264Error::Initialization(-1))));
    assert_eq!(handle.count(&BackendCall::Uninitialize), 0);
}

#[test]
fn test_decoder_requires_backend() {
    assert!(matches!(
        H264Context::new(false, None),
        Err(H264Error::InvalidContext)
    ));
}

#[test]
fn test_compressor_context() {
    let backend = FakeBackend::default();
    let handle = backend.handle();

    let mut context = H264Context::new(true, Some(Box::new(backend))).unwrap();
    assert!(context.is_compressor());

    let mut dst = None;
    assert_eq!(
        context.decompress(ACCESS_UNIT, &mut dst, 0, XrgbRect::full(64, 32)),
        Err(H264Error::InvalidContext)
    );
    assert!(dst.is_none());

    let mut encoded = Vec::with_capacity(64);
    assert_eq!(context.compress(&[0; 16], &mut encoded), Ok(0));
    assert!(encoded.is_empty());

    context.reset();
    drop(context);

    assert!(handle.calls().is_empty());
}

#[test]
fn test_decode_uniform_picture() {
    let (mut context, _) = decoding_context(FakeScript::default().size(64, 32).sample(81, 90, 240));

    let mut dst = None;
    context
        .decompress(ACCESS_UNIT, &mut dst, 0, XrgbRect::full(64, 32))
        .unwrap();

    assert_eq!((context.width(), context.height()), (64, 32));
    assert_eq!(context.scanline(), 64 * 4);
    assert_eq!(context.frame().len(), 64 * 32 * 4);

    let expected = yuv_to_xrgb(81, 90, 240).to_le_bytes();
    context
        .frame()
        .chunks_exact(4)
        .for_each(|pixel| assert_eq!(pixel, expected));

    assert_eq!(dst.map(|buffer| buffer.len()), Some(64 * 32 * 4));
}

#[test]
fn test_mid_gray_pixel_layout() {
    let (mut context, _) = decoding_context(FakeScript::default().size(2, 2));

    decompress(&mut context, ACCESS_UNIT).unwrap();

    assert_eq!(context.frame(), &[128u8, 128, 128, 0].repeat(4)[..]);
}

#[test]
fn test_padded_strides_do_not_leak_into_frame() {
    let (mut packed, _) = decoding_context(FakeScript::default().size(30, 10).sample(40, 200, 60));
    let (mut padded, _) = decoding_context(
        FakeScript::default()
            .size(30, 10)
            .sample(40, 200, 60)
            .padding(18, 9),
    );

    decompress(&mut packed, ACCESS_UNIT).unwrap();
    decompress(&mut padded, ACCESS_UNIT).unwrap();

    assert_eq!(padded.scanline(), 30 * 4);
    assert_eq!(packed.frame(), padded.frame());
}

#[test]
fn test_decoder_is_fed_twice_without_delimiter() {
    let (mut context, handle) = decoding_context(FakeScript::default());

    let mut src = vec![0x00, 0x00, 0x00, 0x01, 0x09, 0x10];
    src.extend_from_slice(ACCESS_UNIT);

    decompress(&mut context, &src).unwrap();

    assert_eq!(
        handle.decoded_inputs(),
        vec![src[4 + 2..].to_vec(), Vec::new()]
    );
}

#[test]
fn test_regular_nal_is_not_stripped() {
    let (mut context, handle) = decoding_context(FakeScript::default());

    decompress(&mut context, ACCESS_UNIT).unwrap();

    assert_eq!(handle.decoded_inputs()[0], ACCESS_UNIT.to_vec());
}

#[test]
fn test_empty_rectangle_is_rejected() {
    let (mut context, handle) = decoding_context(FakeScript::default());

    let mut dst = None;
    let result = context.decompress(ACCESS_UNIT, &mut dst, 0, XrgbRect::full(0, 32));

    assert_eq!(result, Err(H264Error::InvalidInputSize));
    assert!(dst.is_none());
    assert!(handle.decoded_inputs().is_empty());
}

#[test]
fn test_caller_buffer_is_kept() {
    let (mut context, _) = decoding_context(FakeScript::default());

    let mut dst = Some(vec![0xAB; 16]);
    context
        .decompress(ACCESS_UNIT, &mut dst, 0, XrgbRect::full(64, 32))
        .unwrap();

    assert_eq!(dst, Some(vec![0xAB; 16]));
}

#[test]
fn test_failures_leave_previous_frame() {
    let (mut context, handle) = decoding_context(FakeScript::default().size(64, 32).sample(10, 20, 30));
    decompress(&mut context, ACCESS_UNIT).unwrap();
    let before = snapshot(&context);

    let failures: [(fn(&mut FakeScript), H264Error); 6] = [
        (
            |script: &mut FakeScript| script.state = DecodingState::BITSTREAM_ERROR,
            H264Error::DecoderFailure(DecodingState::BITSTREAM_ERROR),
        ),
        (
            |script: &mut FakeScript| script.missing_plane = Some(2),
            H264Error::IncompletePicture,
        ),
        (
            |script: &mut FakeScript| script.buffer_status = BufferStatus::NotReady,
            H264Error::NotReady,
        ),
        (
            |script: &mut FakeScript| script.format = VideoFormat::Nv12,
            H264Error::UnsupportedFormat(VideoFormat::Nv12),
        ),
        (
            |script: &mut FakeScript| script.short_luma = true,
            H264Error::IncompletePicture,
        ),
        (
            |script: &mut FakeScript| script.width = 0,
            H264Error::IncompletePicture,
        ),
    ];

    for (change, expected) in failures {
        handle.update(|script| {
            *script = FakeScript::default().size(128, 96).sample(200, 0, 255);
            change(script);
        });

        assert_eq!(decompress(&mut context, ACCESS_UNIT), Err(expected));
        assert_unchanged(&context, &before);
    }

    assert_eq!(context.frame_id(), 1);
}

#[test]
fn test_same_size_frames_reuse_buffer() {
    let (mut context, _) = decoding_context(FakeScript::default().size(64, 32));

    decompress(&mut context, ACCESS_UNIT).unwrap();
    let address = context.frame().as_ptr();
    let allocations = context.frame_buffer().allocations();

    decompress(&mut context, ACCESS_UNIT).unwrap();

    assert_eq!(context.frame().as_ptr(), address);
    assert_eq!(context.frame_buffer().allocations(), allocations);
}

#[test]
fn test_buffer_grows_but_never_shrinks() {
    let (mut context, handle) = decoding_context(FakeScript::default().size(320, 240));

    decompress(&mut context, ACCESS_UNIT).unwrap();
    assert_eq!(context.capacity(), 320 * 240 * 4);
    assert_eq!(context.frame_buffer().allocations(), 2);

    handle.update(|script| *script = FakeScript::default().size(16, 16));
    decompress(&mut context, ACCESS_UNIT).unwrap();

    assert_eq!((context.width(), context.height()), (16, 16));
    assert_eq!(context.frame().len(), 16 * 16 * 4);
    assert_eq!(context.capacity(), 320 * 240 * 4);
    assert_eq!(context.frame_buffer().allocations(), 2);
}

#[test]
fn test_drop_uninitializes_backend() {
    let (context, handle) = decoding_context(FakeScript::default());

    drop(context);

    assert_eq!(handle.count(&BackendCall::Uninitialize), 1);
    assert_eq!(handle.calls().last(), Some(&BackendCall::Uninitialize));
}

#[test]
fn test_frame_counter_and_dumps() {
    env_logger::try_init().ok();

    let folder = tempfile::tempdir().unwrap();
    let backend = FakeBackend::new(FakeScript::default().size(4, 2));
    let handle = backend.handle();
    let mut context = H264Context::builder()
        .backend(backend)
        .dump_config(DumpConfig::new().enabled(true).folder(folder.path()))
        .build()
        .unwrap();

    decompress(&mut context, ACCESS_UNIT).unwrap();

    handle.update(|script| script.state = DecodingState::REF_LOST);
    assert!(decompress(&mut context, ACCESS_UNIT).is_err());

    handle.update(|script| script.state = DecodingState::ERROR_FREE);
    decompress(&mut context, ACCESS_UNIT).unwrap();

    assert_eq!(context.frame_id(), 2);

    for name in ["bs_0.h264", "H264_0.ppm", "H264_0_rgb.ppm", "bs_1.h264", "H264_1.ppm", "H264_1_rgb.ppm"] {
        assert!(folder.path().join(name).exists(), "missing {}", name);
    }
    assert!(!folder.path().join("H264_2.ppm").exists());

    let luma = std::fs::read(folder.path().join("H264_0.ppm")).unwrap();
    assert_eq!(luma, b"P5\n4 2\n255\n\x80\x80\x80\x80\x80\x80\x80\x80".to_vec());
}

#[test]
fn test_contexts_count_frames_independently() {
    let (mut first, _) = decoding_context(FakeScript::default());
    let (second, _) = decoding_context(FakeScript::default());

    decompress(&mut first, ACCESS_UNIT).unwrap();
    decompress(&mut first, ACCESS_UNIT).unwrap();

    assert_eq!(first.frame_id(), 2);
    assert_eq!(second.frame_id(), 0);
    assert!(!second.dump_config().enabled);
}

#[test]
fn test_input_failure_is_reported_by_flush() {
    let (mut context, handle) = decoding_context(FakeScript::default().size(64, 32));

    handle.update(|script| script.input_failure = Some(DecodingState::BITSTREAM_ERROR));
    assert_eq!(
        decompress(&mut context, ACCESS_UNIT),
        Err(H264Error::DecoderFailure(DecodingState::BITSTREAM_ERROR))
    );

    handle.update(|script| script.input_failure = None);
    decompress(&mut context, ACCESS_UNIT).unwrap();
    let before = snapshot(&context);

    handle.update(|script| script.input_failure = Some(DecodingState::NO_PARAM_SETS));
    assert_eq!(
        decompress(&mut context, ACCESS_UNIT),
        Err(H264Error::DecoderFailure(DecodingState::NO_PARAM_SETS))
    );
    assert_unchanged(&context, &before);
    assert_eq!(context.frame_id(), 1);
}

#[test]
fn test_no_picture_yet_wins_over_not_ready() {
    let (mut context, _) = decoding_context(FakeScript::default());

    assert_eq!(context.decode(&[]), Err(H264Error::IncompletePicture));
    assert_eq!(context.frame_id(), 0);
}

/// Reports a 4x4 I420 picture whose luma stride overflows any size computation.
struct OverflowingStrideBackend {
    y: Vec<u8>,
    chroma: Vec<u8>,
}

impl DecoderBackend for OverflowingStrideBackend {
    fn initialize(&mut self, _params: &DecodingParams) -> Result<(), i64> {
        Ok(())
    }

    fn set_option(&mut self, _option: DecoderOption) -> Result<(), i64> {
        Ok(())
    }

    fn decode_frame(&mut self, _src: &[u8]) -> DecodeOutcome {
        DecodeOutcome::ready()
    }

    fn picture(&self) -> Option<DecodedPlanes<'_>> {
        Some(DecodedPlanes {
            planes: [
                Some(self.y.as_slice()),
                Some(self.chroma.as_slice()),
                Some(self.chroma.as_slice()),
            ],
            strides: [usize::MAX / 2 + 2, 2],
            width: 4,
            height: 4,
            format: VideoFormat::I420,
        })
    }

    fn uninitialize(&mut self) {}
}

#[test]
fn test_overflowing_stride_is_rejected() {
    let backend = OverflowingStrideBackend {
        y: vec![0; 16],
        chroma: vec![128; 4],
    };
    let mut context = H264Context::builder().backend(backend).build().unwrap();
    let before = snapshot(&context);

    assert_eq!(
        context.decode(&[0, 0, 1, 0x65]),
        Err(H264Error::IncompletePicture)
    );
    assert_unchanged(&context, &before);
}

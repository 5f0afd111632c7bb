use async_trait::async_trait;
use bytes::BytesMut;
use log::debug;
use remotia_core::{
    error::DropReason,
    traits::{FrameError, FrameProcessor, PullableFrameProperties},
};

use crate::H264Context;

/// Pipeline stage decoding the access unit stored under `encoded_buffer_key`
/// into the XRGB32 buffer stored under `raw_buffer_key`.
///
/// Failed frames are flagged through [`FrameError`] and keep their raw buffer
/// untouched.
pub struct H264Decompressor<K: Copy> {
    context: H264Context,

    encoded_buffer_key: K,
    raw_buffer_key: K,
}

impl<K: Copy> H264Decompressor<K> {
    pub fn new(context: H264Context, encoded_buffer_key: K, raw_buffer_key: K) -> Self {
        Self {
            context,
            encoded_buffer_key,
            raw_buffer_key,
        }
    }

    pub fn context(&self) -> &H264Context {
        &self.context
    }
}

#[async_trait]
impl<F, K> FrameProcessor<F> for H264Decompressor<K>
where
    K: Copy + Send,
    F: PullableFrameProperties<K, BytesMut> + FrameError<DropReason> + Send + 'static,
{
    async fn process(&mut self, mut frame_data: F) -> Option<F> {
        let encoded_buffer = frame_data.pull(&self.encoded_buffer_key);
        let raw_buffer = frame_data.pull(&self.raw_buffer_key);

        let (encoded_buffer, mut raw_buffer) = match (encoded_buffer, raw_buffer) {
            (Some(encoded), Some(raw)) => (encoded, raw),
            (encoded, raw) => {
                debug!("Missing frame buffers, dropping frame");
                frame_data.report_error(DropReason::NoAvailableBuffers);

                if let Some(encoded) = encoded {
                    frame_data.push(self.encoded_buffer_key, encoded);
                }
                if let Some(raw) = raw {
                    frame_data.push(self.raw_buffer_key, raw);
                }

                return Some(frame_data);
            }
        };

        match self.context.decode(&encoded_buffer) {
            Ok(()) => {
                raw_buffer.clear();
                raw_buffer.extend_from_slice(self.context.frame());
            }
            Err(error) => {
                debug!("Unable to decode frame: {}", error);
                frame_data.report_error(DropReason::from(error));
            }
        }

        frame_data.push(self.encoded_buffer_key, encoded_buffer);
        frame_data.push(self.raw_buffer_key, raw_buffer);

        Some(frame_data)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{
        backend::DecodingState,
        testing::{FakeBackend, FakeScript},
    };

    #[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
    enum BufferType {
        Encoded,
        Raw,
    }

    #[derive(Default)]
    struct TestFrameData {
        buffers: HashMap<BufferType, BytesMut>,
        error: Option<DropReason>,
    }

    impl PullableFrameProperties<BufferType, BytesMut> for TestFrameData {
        fn push(&mut self, key: BufferType, value: BytesMut) {
            self.buffers.insert(key, value);
        }

        fn pull(&mut self, key: &BufferType) -> Option<BytesMut> {
            self.buffers.remove(key)
        }
    }

    impl FrameError<DropReason> for TestFrameData {
        fn report_error(&mut self, error: DropReason) {
            self.error = Some(error);
        }

        fn get_error(&self) -> Option<DropReason> {
            self.error
        }
    }

    fn frame_data(encoded: &[u8]) -> TestFrameData {
        let mut dto = TestFrameData::default();
        dto.push(BufferType::Encoded, BytesMut::from(encoded));
        dto.push(BufferType::Raw, BytesMut::new());
        dto
    }

    fn decompressor(backend: FakeBackend) -> H264Decompressor<BufferType> {
        let context = H264Context::builder().backend(backend).build().unwrap();
        H264Decompressor::new(context, BufferType::Encoded, BufferType::Raw)
    }

    #[tokio::test]
    async fn test_decoded_frame_fills_raw_buffer() {
        let mut decompressor = decompressor(FakeBackend::new(FakeScript::default().size(8, 4)));

        let mut dto = decompressor
            .process(frame_data(&[0, 0, 1, 0x65, 0x88]))
            .await
            .unwrap();

        assert!(dto.get_error().is_none());
        let raw = dto.pull(&BufferType::Raw).unwrap();
        assert_eq!(raw.len(), 8 * 4 * 4);
        assert_eq!(&raw[..], decompressor.context().frame());
        assert_eq!(
            &dto.pull(&BufferType::Encoded).unwrap()[..],
            &[0, 0, 1, 0x65, 0x88][..]
        );
    }

    #[tokio::test]
    async fn test_decoder_failure_reports_codec_error() {
        let backend = FakeBackend::default();
        backend
            .handle()
            .update(|script| script.state = DecodingState::BITSTREAM_ERROR);
        let mut decompressor = decompressor(backend);

        let mut dto = decompressor.process(frame_data(&[0, 0, 1, 0x65])).await.unwrap();

        assert_eq!(dto.get_error(), Some(DropReason::CodecError));
        assert!(dto.pull(&BufferType::Raw).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_on_input_call_reports_codec_error() {
        let backend = FakeBackend::default();
        backend
            .handle()
            .update(|script| script.input_failure = Some(DecodingState::BITSTREAM_ERROR));
        let mut decompressor = decompressor(backend);

        let dto = decompressor.process(frame_data(&[0, 0, 1, 0x65])).await.unwrap();

        assert_eq!(dto.get_error(), Some(DropReason::CodecError));
    }

    #[tokio::test]
    async fn test_missing_raw_buffer() {
        let mut decompressor = decompressor(FakeBackend::default());

        let mut dto = TestFrameData::default();
        dto.push(BufferType::Encoded, BytesMut::from(&[0u8, 0, 1, 0x65][..]));

        let mut dto = decompressor.process(dto).await.unwrap();
        assert_eq!(dto.get_error(), Some(DropReason::NoAvailableBuffers));
        assert!(dto.pull(&BufferType::Encoded).is_some());
        assert_eq!(decompressor.context().frame_id(), 0);
    }
}

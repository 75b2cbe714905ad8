use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::resp::{RespError, RespValue};

/// Default upper bound for the buffered bytes of a single frame.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

/// Frames a byte stream into [`RespValue`]s and encodes replies back to bytes.
#[derive(Debug, Clone)]
pub struct RespCodec {
    max_frame_size: usize,
}

impl RespCodec {
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }
}

impl Default for RespCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl Decoder for RespCodec {
    type Item = RespValue;
    type Error = RespError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() > self.max_frame_size {
            return Err(RespError::FrameTooLarge(src.len()));
        }

        RespValue::parse(src)
    }
}

impl Encoder<RespValue> for RespCodec {
    type Error = RespError;

    fn encode(&mut self, item: RespValue, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(item.encode().as_bytes());
        Ok(())
    }
}

//! `tokio_util::codec` adapter for host tools reading replies from an async
//! serial stream.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_packet_from, FrameConfig, Packet};
use crate::error::FrameError;

/// Packet decoder/encoder for `FramedRead` / `FramedWrite`.
#[derive(Debug, Clone, Default)]
pub struct PacketCodec {
    config: FrameConfig,
}

impl PacketCodec {
    /// Create a codec with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self { config }
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, FrameError> {
        decode_packet_from(src, &self.config)
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), FrameError> {
        if item.payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: item.payload.len(),
                max: self.config.max_payload_size,
            });
        }
        self.config
            .check_descriptor(item.msg_type, usize::from(item.descriptor.is_some()))?;
        item.encode(dst);
        Ok(())
    }
}

//! Packet envelope framing for the camlink camera protocol.
//!
//! Every reply a camera module sends is wrapped in the same envelope:
//! - A 2-byte head magic (`0xFF 0xAA`) plus a 1-byte message type
//! - A 4-byte little-endian payload length
//! - The payload
//! - A 2-byte tail (`0xFF 0xBB`)
//!
//! Image replies are the one exception to "build the packet, then send it":
//! their body is streamed in bounded chunks through [`BodyWriter`] after the
//! length has been declared up front.

pub mod codec;
pub mod error;
pub mod msg_type;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

#[cfg(feature = "async")]
pub use async_codec::PacketCodec;
pub use codec::{
    decode_image, decode_packet, decode_packet_from, encode_image_header, encode_packet,
    image_descriptor, FrameConfig, Packet, DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
    HEAD_MAGIC, TAIL_MAGIC, TRAILER_SIZE,
};
pub use error::{FrameError, Result};
pub use msg_type::{msg_type_name, CAMERA_INFO, FIRMWARE_VERSION, IMAGE, SDK_VERSION, TEXT};
pub use reader::PacketReader;
pub use writer::{BodyWriter, PacketWriter};

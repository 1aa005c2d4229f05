use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::msg_type::IMAGE;

/// Packet header: magic (2) + message type (1) + length (4) = 7 bytes.
pub const HEADER_SIZE: usize = 7;

/// Packet trailer: tail magic (2) = 2 bytes.
pub const TRAILER_SIZE: usize = 2;

/// Head magic bytes preceding the message type.
pub const HEAD_MAGIC: [u8; 2] = [0xFF, 0xAA];

/// Tail magic bytes closing every packet.
pub const TAIL_MAGIC: [u8; 2] = [0xFF, 0xBB];

/// Default maximum payload size accepted by readers: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// A framed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// The message type tag.
    pub msg_type: u8,
    /// Descriptor byte sent between the length and the body of image replies.
    /// It is not counted in the declared length.
    pub descriptor: Option<u8>,
    /// The packet payload.
    pub payload: Bytes,
}

impl Packet {
    /// Create a new packet.
    pub fn new(msg_type: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            msg_type,
            descriptor: None,
            payload: payload.into(),
        }
    }

    /// Create an image reply carrying a descriptor byte.
    pub fn image(descriptor: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            msg_type: IMAGE,
            descriptor: Some(descriptor),
            payload: payload.into(),
        }
    }

    /// The total wire size of this packet (header + descriptor + payload + trailer).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + usize::from(self.descriptor.is_some()) + self.payload.len() + TRAILER_SIZE
    }

    /// Append the wire form of this packet to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        match self.descriptor {
            Some(descriptor) => {
                encode_image_header(self.payload.len() as u32, descriptor, dst);
                dst.put_slice(&self.payload);
                dst.put_slice(&TAIL_MAGIC);
            }
            None => encode_packet(self.msg_type, &self.payload, dst),
        }
    }
}

/// Encode a packet into the wire format.
///
/// No descriptor byte is written, so under the default [`FrameConfig`] an
/// [`IMAGE`] reply must go through [`encode_image_header`] or
/// [`Packet::image`] instead. Writers enforce this with
/// [`FrameConfig::check_descriptor`].
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────┬───────────┬─────────────────┬──────────────┐
/// │ Magic (2B)   │ Type     │ Length    │ Payload         │ Tail (2B)    │
/// │ 0xFF 0xAA    │ (1B)     │ (4B LE)   │ (Length bytes)  │ 0xFF 0xBB    │
/// └──────────────┴──────────┴───────────┴─────────────────┴──────────────┘
/// ```
///
/// The length field is 32 bits wide; callers bound payloads through
/// [`FrameConfig::max_payload_size`] before they get here.
pub fn encode_packet(msg_type: u8, payload: &[u8], dst: &mut BytesMut) {
    debug_assert!(payload.len() <= u32::MAX as usize);
    dst.reserve(HEADER_SIZE + payload.len() + TRAILER_SIZE);
    put_header(msg_type, payload.len() as u32, dst);
    dst.put_slice(payload);
    dst.put_slice(&TAIL_MAGIC);
}

/// Encode the opening of an image reply: header, declared body length and
/// descriptor byte. The body and [`TAIL_MAGIC`] follow separately.
pub fn encode_image_header(body_len: u32, descriptor: u8, dst: &mut BytesMut) {
    dst.reserve(HEADER_SIZE + 1);
    put_header(IMAGE, body_len, dst);
    dst.put_u8(descriptor);
}

/// Descriptor byte for an image captured at `resolution`: the resolution in
/// the high nibble, `0x1` in the low nibble.
pub fn image_descriptor(resolution: u8) -> u8 {
    ((resolution & 0x0F) << 4) | 0x01
}

fn put_header(msg_type: u8, len: u32, dst: &mut BytesMut) {
    dst.put_slice(&HEAD_MAGIC);
    dst.put_u8(msg_type);
    dst.put_u32_le(len);
}

/// Decode the packet at the start of `src`.
///
/// Bytes after the first packet are ignored. Image replies must go through
/// [`decode_image`] because of their uncounted descriptor byte.
pub fn decode_packet(src: &[u8]) -> Result<Packet> {
    complete(src, usize::MAX, false).map(|(packet, _)| packet)
}

/// Decode an image reply (header, length, descriptor, body, trailer).
pub fn decode_image(src: &[u8]) -> Result<Packet> {
    let (packet, _) = complete(src, usize::MAX, true)?;
    if packet.msg_type != IMAGE {
        return Err(FrameError::UnexpectedType {
            expected: IMAGE,
            found: packet.msg_type,
        });
    }
    Ok(packet)
}

/// Decode a packet from a stream buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete packet yet.
/// On success, consumes the packet bytes from the buffer.
pub fn decode_packet_from(src: &mut BytesMut, config: &FrameConfig) -> Result<Option<Packet>> {
    let layout = match parse(src, config.max_payload_size, config.image_descriptor)? {
        Parsed::Incomplete { .. } => return Ok(None), // Need more data
        Parsed::Complete(layout) => layout,
    };

    src.advance(layout.body_start());
    let payload = src.split_to(layout.payload_len).freeze();
    src.advance(TRAILER_SIZE);

    Ok(Some(Packet {
        msg_type: layout.msg_type,
        descriptor: layout.descriptor,
        payload,
    }))
}

fn complete(src: &[u8], max_payload: usize, image_descriptor: bool) -> Result<(Packet, usize)> {
    match parse(src, max_payload, image_descriptor)? {
        Parsed::Incomplete { needed } => Err(FrameError::Truncated {
            needed,
            available: src.len(),
        }),
        Parsed::Complete(layout) => {
            let start = layout.body_start();
            let packet = Packet {
                msg_type: layout.msg_type,
                descriptor: layout.descriptor,
                payload: Bytes::copy_from_slice(&src[start..start + layout.payload_len]),
            };
            Ok((packet, layout.total()))
        }
    }
}

struct Layout {
    msg_type: u8,
    descriptor: Option<u8>,
    payload_len: usize,
}

impl Layout {
    fn body_start(&self) -> usize {
        HEADER_SIZE + usize::from(self.descriptor.is_some())
    }

    fn total(&self) -> usize {
        self.body_start() + self.payload_len + TRAILER_SIZE
    }
}

enum Parsed {
    Incomplete { needed: usize },
    Complete(Layout),
}

fn parse(src: &[u8], max_payload: usize, image_descriptor: bool) -> Result<Parsed> {
    let magic_len = src.len().min(HEAD_MAGIC.len());
    if src[..magic_len] != HEAD_MAGIC[..magic_len] {
        return Err(FrameError::BadHeader);
    }
    if src.len() < HEADER_SIZE {
        return Ok(Parsed::Incomplete {
            needed: HEADER_SIZE + TRAILER_SIZE,
        });
    }

    let msg_type = src[2];
    let payload_len = u32::from_le_bytes([src[3], src[4], src[5], src[6]]) as usize;
    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let has_descriptor = image_descriptor && msg_type == IMAGE;
    let body_start = HEADER_SIZE + usize::from(has_descriptor);
    let total = body_start
        .checked_add(payload_len)
        .and_then(|end| end.checked_add(TRAILER_SIZE))
        .ok_or(FrameError::PayloadTooLarge {
            size: payload_len,
            max: usize::MAX - body_start - TRAILER_SIZE,
        })?;
    if src.len() < total {
        return Ok(Parsed::Incomplete { needed: total });
    }

    let tail = total - TRAILER_SIZE;
    let found = [src[tail], src[tail + 1]];
    if found != TAIL_MAGIC {
        return Err(FrameError::BadTrailer { found });
    }

    Ok(Parsed::Complete(Layout {
        msg_type,
        descriptor: has_descriptor.then(|| src[HEADER_SIZE]),
        payload_len,
    }))
}

/// Configuration for packet readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
    /// Expect a descriptor byte after the length of image replies. Default: true.
    pub image_descriptor: bool,
}

impl FrameConfig {
    /// Descriptor bytes a packet of `msg_type` carries under this config:
    /// one for image replies when descriptors are enabled, none otherwise.
    pub fn descriptor_len(&self, msg_type: u8) -> usize {
        usize::from(self.image_descriptor && msg_type == IMAGE)
    }

    /// Reject a packet layout that readers using this config would misparse.
    pub fn check_descriptor(&self, msg_type: u8, found: usize) -> Result<()> {
        let expected = self.descriptor_len(msg_type);
        if found != expected {
            return Err(FrameError::DescriptorMismatch {
                msg_type,
                expected,
                found,
            });
        }
        Ok(())
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            image_descriptor: true,
        }
    }
}

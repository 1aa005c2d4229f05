use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::codec::{decode_packet_from, FrameConfig, Packet};
use crate::error::{FrameError, Result};
use crate::msg_type::IMAGE;

const INITIAL_BUFFER_CAPACITY: usize = 1024;
const READ_CHUNK_SIZE: usize = 256;

/// Reads complete packets from any `Read` stream.
///
/// Handles partial reads internally, down to one byte per call, so callers
/// always get complete packets.
pub struct PacketReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> PacketReader<T> {
    /// Create a new packet reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new packet reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete packet (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_packet(&mut self) -> Result<Packet> {
        loop {
            if let Some(packet) = decode_packet_from(&mut self.buf, &self.config)? {
                tracing::trace!(
                    msg_type = packet.msg_type,
                    size = packet.payload.len(),
                    "packet received"
                );
                return Ok(packet);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read the next packet and require it to be of `msg_type`.
    pub fn expect_packet(&mut self, msg_type: u8) -> Result<Packet> {
        let packet = self.read_packet()?;
        if packet.msg_type != msg_type {
            return Err(FrameError::UnexpectedType {
                expected: msg_type,
                found: packet.msg_type,
            });
        }
        Ok(packet)
    }

    /// Read the next packet and require it to be an image reply.
    pub fn read_image(&mut self) -> Result<Packet> {
        self.expect_packet(IMAGE)
    }

    /// Bytes received but not yet consumed by a complete packet.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent packet decoding.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current packet reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BufMut;

    use super::*;
    use crate::codec::{encode_packet, HEAD_MAGIC};
    use crate::msg_type::{CAMERA_INFO, SDK_VERSION, TEXT};

    #[test]
    fn read_single_packet() {
        let mut wire = BytesMut::new();
        encode_packet(TEXT, b"hello", &mut wire);

        let mut reader = PacketReader::new(Cursor::new(wire.to_vec()));
        let packet = reader.read_packet().unwrap();

        assert_eq!(packet.msg_type, TEXT);
        assert_eq!(packet.payload.as_ref(), b"hello");
    }

    #[test]
    fn read_multiple_packets() {
        let mut wire = BytesMut::new();
        encode_packet(TEXT, b"one", &mut wire);
        encode_packet(CAMERA_INFO, b"two", &mut wire);
        Packet::image(0x11, vec![3u8; 3]).encode(&mut wire);

        let mut reader = PacketReader::new(Cursor::new(wire.to_vec()));

        let p1 = reader.read_packet().unwrap();
        let p2 = reader.read_packet().unwrap();
        let p3 = reader.read_image().unwrap();

        assert_eq!((p1.msg_type, p1.payload.as_ref()), (TEXT, b"one".as_ref()));
        assert_eq!(
            (p2.msg_type, p2.payload.as_ref()),
            (CAMERA_INFO, b"two".as_ref())
        );
        assert_eq!(p3.descriptor, Some(0x11));
        assert_eq!(p3.payload.as_ref(), &[3, 3, 3]);
    }

    #[test]
    fn writer_output_reads_back_for_every_type() {
        let mut writer = crate::writer::PacketWriter::new(Cursor::new(Vec::<u8>::new()));
        for msg_type in 0..=u8::MAX {
            if msg_type == IMAGE {
                let mut body = writer.begin_image(2, 0x21).unwrap();
                body.write_chunk(b"ab").unwrap();
                body.finish().unwrap();
            } else {
                writer.send(msg_type, b"ab").unwrap();
            }
        }

        let wire = writer.into_inner().into_inner();
        let mut reader = PacketReader::new(Cursor::new(wire));
        for msg_type in 0..=u8::MAX {
            let packet = reader.read_packet().unwrap();
            assert_eq!(packet.msg_type, msg_type);
            assert_eq!(packet.descriptor, (msg_type == IMAGE).then_some(0x21));
            assert_eq!(packet.payload.as_ref(), b"ab");
        }
        assert!(matches!(
            reader.read_packet(),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    fn read_large_image() {
        let body = vec![0xAB; 64 * 1024];
        let mut wire = BytesMut::new();
        Packet::image(0x71, body.clone()).encode(&mut wire);

        let mut reader = PacketReader::new(Cursor::new(wire.to_vec()));
        let packet = reader.read_image().unwrap();

        assert_eq!(packet.payload.as_ref(), body.as_slice());
    }

    #[test]
    fn partial_read_handling() {
        let mut wire = BytesMut::new();
        encode_packet(SDK_VERSION, &[1, 2, 3, 4, 5, b'\r', b'\n'], &mut wire);

        let byte_reader = ByteByByteReader {
            bytes: wire.to_vec(),
            pos: 0,
        };
        let mut reader = PacketReader::new(byte_reader);

        let packet = reader.read_packet().unwrap();
        assert_eq!(packet.msg_type, SDK_VERSION);
        assert_eq!(packet.payload.len(), 7);
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = PacketReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_packet().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_packet() {
        let mut partial = BytesMut::new();
        partial.put_slice(&HEAD_MAGIC);
        partial.put_u8(TEXT);
        partial.put_u32_le(16);
        partial.put_slice(b"only-part");

        let mut reader = PacketReader::new(Cursor::new(partial.to_vec()));
        let err = reader.read_packet().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
        assert_eq!(reader.buffered().len(), 16);
    }

    #[test]
    fn bad_header_in_stream() {
        let bytes = b"callback function is not registered\n".to_vec();
        let mut reader = PacketReader::new(Cursor::new(bytes));
        let err = reader.read_packet().unwrap_err();
        assert!(matches!(err, FrameError::BadHeader));
    }

    #[test]
    fn unexpected_type_is_reported() {
        let mut wire = BytesMut::new();
        encode_packet(TEXT, b"not an image", &mut wire);

        let mut reader = PacketReader::new(Cursor::new(wire.to_vec()));
        let err = reader.read_image().unwrap_err();
        assert!(matches!(
            err,
            FrameError::UnexpectedType {
                expected: IMAGE,
                found: TEXT
            }
        ));
    }

    #[test]
    fn oversized_packet_in_stream() {
        let mut wire = BytesMut::new();
        wire.put_slice(&HEAD_MAGIC);
        wire.put_u8(TEXT);
        wire.put_u32_le(1024);

        let cfg = FrameConfig {
            max_payload_size: 16,
            ..FrameConfig::default()
        };
        let mut reader = PacketReader::with_config(Cursor::new(wire.to_vec()), cfg);
        let err = reader.read_packet().unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
    }

    #[test]
    fn image_without_descriptor_when_disabled() {
        let mut wire = BytesMut::new();
        encode_packet(IMAGE, &[1, 2, 3], &mut wire);

        let cfg = FrameConfig {
            image_descriptor: false,
            ..FrameConfig::default()
        };
        let mut reader = PacketReader::with_config(Cursor::new(wire.to_vec()), cfg);
        let packet = reader.read_image().unwrap();
        assert_eq!(packet.descriptor, None);
        assert_eq!(packet.payload.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn interrupted_read_retries() {
        let mut wire = BytesMut::new();
        encode_packet(TEXT, b"ok", &mut wire);

        let reader = FailOnceThenData {
            kind: Some(ErrorKind::Interrupted),
            bytes: wire.to_vec(),
            pos: 0,
        };
        let mut framed = PacketReader::new(reader);
        let packet = framed.read_packet().unwrap();
        assert_eq!(packet.payload.as_ref(), b"ok");
    }

    #[test]
    fn read_timeout_propagates_io_error() {
        let mut wire = BytesMut::new();
        encode_packet(TEXT, b"ok", &mut wire);

        let reader = FailOnceThenData {
            kind: Some(ErrorKind::TimedOut),
            bytes: wire.to_vec(),
            pos: 0,
        };
        let mut framed = PacketReader::new(reader);
        let err = framed.read_packet().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::TimedOut));
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut reader = PacketReader::new(Cursor::new(Vec::<u8>::new()));
        reader.set_max_payload_size(32);

        assert_eq!(reader.config().max_payload_size, 32);
        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct FailOnceThenData {
        kind: Option<ErrorKind>,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for FailOnceThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if let Some(kind) = self.kind.take() {
                return Err(std::io::Error::from(kind));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let remaining = self.bytes.len() - self.pos;
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }
}

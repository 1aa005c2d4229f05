use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_packet, FrameConfig, Packet, HEADER_SIZE, HEAD_MAGIC, TAIL_MAGIC};
use crate::error::{FrameError, Result};
use crate::msg_type::IMAGE;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes packets to any `Write` stream.
pub struct PacketWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> PacketWriter<T> {
    /// Create a new packet writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new packet writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write a complete packet (blocking).
    pub fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        self.check_len(packet.payload.len())?;
        self.config
            .check_descriptor(packet.msg_type, usize::from(packet.descriptor.is_some()))?;
        self.buf.clear();
        packet.encode(&mut self.buf);
        let buf = std::mem::take(&mut self.buf);
        let result = self.write_raw(&buf);
        self.buf = buf;
        result?;
        self.flush()
    }

    /// Encode and send a payload with the given message type.
    ///
    /// No descriptor byte is written, so image replies are refused unless
    /// the config disables descriptors; use [`PacketWriter::begin_image`].
    pub fn send(&mut self, msg_type: u8, payload: &[u8]) -> Result<()> {
        self.check_len(payload.len())?;
        self.config.check_descriptor(msg_type, 0)?;
        self.buf.clear();
        encode_packet(msg_type, payload, &mut self.buf);
        let buf = std::mem::take(&mut self.buf);
        let result = self.write_raw(&buf);
        self.buf = buf;
        result?;
        self.flush()
    }

    /// Start a packet whose body is streamed in pieces.
    ///
    /// The header (and `preamble`, which is not counted in the length) is
    /// written immediately. The returned [`BodyWriter`] must receive exactly
    /// `declared_len` body bytes before [`BodyWriter::finish`] closes the
    /// packet. The preamble must be the descriptor layout the config expects
    /// for `msg_type`; otherwise nothing is written.
    pub fn begin_body(
        &mut self,
        msg_type: u8,
        declared_len: usize,
        preamble: &[u8],
    ) -> Result<BodyWriter<'_, T>> {
        self.check_len(declared_len)?;
        self.config.check_descriptor(msg_type, preamble.len())?;
        let mut head = [0u8; HEADER_SIZE];
        head[..2].copy_from_slice(&HEAD_MAGIC);
        head[2] = msg_type;
        head[3..].copy_from_slice(&(declared_len as u32).to_le_bytes());
        self.write_raw(&head)?;
        self.write_raw(preamble)?;
        Ok(BodyWriter {
            writer: self,
            declared: declared_len,
            written: 0,
        })
    }

    /// Start an image reply: header, declared length, then the descriptor byte.
    pub fn begin_image(&mut self, declared_len: usize, descriptor: u8) -> Result<BodyWriter<'_, T>> {
        self.begin_body(IMAGE, declared_len, &[descriptor])
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent packets.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current packet writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn check_len(&self, len: usize) -> Result<()> {
        let max = self.config.max_payload_size.min(u32::MAX as usize);
        if len > max {
            return Err(FrameError::PayloadTooLarge { size: len, max });
        }
        Ok(())
    }

    fn write_raw(&mut self, mut data: &[u8]) -> Result<()> {
        while !data.is_empty() {
            match self.inner.write(data) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => data = &data[n..],
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }
}

/// The open body of a packet started with [`PacketWriter::begin_body`] or
/// [`PacketWriter::begin_image`].
///
/// Chunks go straight to the stream; nothing is held back beyond the
/// caller's own buffer.
pub struct BodyWriter<'a, T: Write> {
    writer: &'a mut PacketWriter<T>,
    declared: usize,
    written: usize,
}

impl<T: Write> BodyWriter<'_, T> {
    /// Write the next slice of the body.
    ///
    /// Writing past the declared length fails without sending anything.
    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        let written = self.written + chunk.len();
        if written > self.declared {
            return Err(FrameError::LengthMismatch {
                declared: self.declared,
                written,
            });
        }
        self.writer.write_raw(chunk)?;
        self.written = written;
        Ok(())
    }

    /// Body bytes still owed before the packet can be closed.
    pub fn remaining(&self) -> usize {
        self.declared - self.written
    }

    /// Body bytes written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Write the trailer and flush.
    ///
    /// Fails with [`FrameError::LengthMismatch`] (and writes no trailer)
    /// unless the body is exactly the declared length.
    pub fn finish(self) -> Result<()> {
        if self.written != self.declared {
            return Err(FrameError::LengthMismatch {
                declared: self.declared,
                written: self.written,
            });
        }
        self.writer.write_raw(&TAIL_MAGIC)?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::codec::{decode_image, decode_packet};
    use crate::msg_type::{CAMERA_INFO, FIRMWARE_VERSION, TEXT};

    fn written(writer: PacketWriter<Cursor<Vec<u8>>>) -> Vec<u8> {
        writer.into_inner().into_inner()
    }

    #[test]
    fn write_single_packet() {
        let mut writer = PacketWriter::new(Cursor::new(Vec::<u8>::new()));

        writer.send(TEXT, b"hello").unwrap();

        let wire = written(writer);
        let packet = decode_packet(&wire).unwrap();
        assert_eq!(packet.msg_type, TEXT);
        assert_eq!(packet.payload.as_ref(), b"hello");
    }

    #[test]
    fn write_packet_method() {
        let mut writer = PacketWriter::new(Cursor::new(Vec::<u8>::new()));
        writer
            .write_packet(&Packet::new(CAMERA_INFO, "abc"))
            .unwrap();

        let packet = decode_packet(&written(writer)).unwrap();
        assert_eq!(packet.msg_type, CAMERA_INFO);
        assert_eq!(packet.payload.as_ref(), b"abc");
    }

    #[test]
    fn payload_too_large_rejected_before_writing() {
        let cfg = FrameConfig {
            max_payload_size: 4,
            ..FrameConfig::default()
        };
        let mut writer = PacketWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

        let err = writer.send(TEXT, b"oversized").unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
        assert!(written(writer).is_empty());
    }

    #[test]
    fn streamed_body_matches_single_shot_encoding() {
        let mut writer = PacketWriter::new(Cursor::new(Vec::<u8>::new()));
        let mut body = writer.begin_body(FIRMWARE_VERSION, 6, &[]).unwrap();
        body.write_chunk(&[1, 2, 3]).unwrap();
        body.write_chunk(&[4]).unwrap();
        body.write_chunk(b"\r\n").unwrap();
        assert_eq!(body.remaining(), 0);
        body.finish().unwrap();

        let mut expected = BytesMut::new();
        encode_packet(FIRMWARE_VERSION, &[1, 2, 3, 4, b'\r', b'\n'], &mut expected);
        assert_eq!(written(writer), expected.to_vec());
    }

    #[test]
    fn streamed_image_carries_descriptor() {
        let mut writer = PacketWriter::new(Cursor::new(Vec::<u8>::new()));
        let mut body = writer.begin_image(4, 0x21).unwrap();
        body.write_chunk(&[9, 8]).unwrap();
        body.write_chunk(&[7, 6]).unwrap();
        body.finish().unwrap();

        let packet = decode_image(&written(writer)).unwrap();
        assert_eq!(packet.descriptor, Some(0x21));
        assert_eq!(packet.payload.as_ref(), &[9, 8, 7, 6]);
    }

    #[test]
    fn image_without_descriptor_is_refused() {
        let mut writer = PacketWriter::new(Cursor::new(Vec::<u8>::new()));

        for err in [
            writer.send(IMAGE, b"ab").unwrap_err(),
            writer.write_packet(&Packet::new(IMAGE, "ab")).unwrap_err(),
            writer.begin_body(IMAGE, 2, &[]).err().unwrap(),
            writer.begin_body(TEXT, 2, &[0x21]).err().unwrap(),
        ] {
            assert!(matches!(err, FrameError::DescriptorMismatch { .. }));
        }
        assert!(written(writer).is_empty());
    }

    #[test]
    fn plain_images_when_descriptors_disabled() {
        let cfg = FrameConfig {
            image_descriptor: false,
            ..FrameConfig::default()
        };
        let mut writer = PacketWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

        assert!(matches!(
            writer.write_packet(&Packet::image(0x21, "ab")),
            Err(FrameError::DescriptorMismatch {
                msg_type: IMAGE,
                expected: 0,
                found: 1
            })
        ));
        writer.send(IMAGE, b"ab").unwrap();

        let packet = decode_packet(&written(writer)).unwrap();
        assert_eq!(packet, Packet::new(IMAGE, "ab"));
    }

    #[test]
    fn body_overrun_is_rejected() {
        let mut writer = PacketWriter::new(Cursor::new(Vec::<u8>::new()));
        let mut body = writer.begin_body(TEXT, 2, &[]).unwrap();

        let err = body.write_chunk(b"abc").unwrap_err();
        assert!(matches!(
            err,
            FrameError::LengthMismatch {
                declared: 2,
                written: 3
            }
        ));
        assert_eq!(body.written(), 0);
    }

    #[test]
    fn short_body_cannot_finish() {
        let mut writer = PacketWriter::new(Cursor::new(Vec::<u8>::new()));
        let mut body = writer.begin_body(TEXT, 5, &[]).unwrap();
        body.write_chunk(b"abc").unwrap();

        let err = body.finish().unwrap_err();
        assert!(matches!(
            err,
            FrameError::LengthMismatch {
                declared: 5,
                written: 3
            }
        ));
        assert!(!written(writer).ends_with(&TAIL_MAGIC));
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = PacketWriter::new(sink);

        writer.send(TEXT, b"x").unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn one_byte_writes_still_produce_whole_packet() {
        let mut writer = PacketWriter::new(OneBytePerCall::default());
        writer.send(TEXT, b"slow link").unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.calls, inner.data.len());
        let packet = decode_packet(&inner.data).unwrap();
        assert_eq!(packet.payload.as_ref(), b"slow link");
    }

    #[test]
    fn handles_interrupted_and_would_block_writes() {
        let writer_impl = FlakyWriter {
            failures: vec![ErrorKind::Interrupted, ErrorKind::WouldBlock],
            data: Vec::new(),
        };

        let mut writer = PacketWriter::new(writer_impl);
        writer.send(TEXT, b"retry").unwrap();

        let inner = writer.into_inner();
        assert_eq!(decode_packet(&inner.data).unwrap().payload.as_ref(), b"retry");
    }

    #[test]
    fn zero_length_write_means_closed() {
        let mut writer = PacketWriter::new(ClosedWriter);
        let err = writer.send(TEXT, b"x").unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut writer = PacketWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.set_max_payload_size(16);

        assert_eq!(writer.config().max_payload_size, 16);
        let _ = writer.get_ref();
        let _ = writer.get_mut();
        let _inner = writer.into_inner();
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct OneBytePerCall {
        data: Vec<u8>,
        calls: usize,
    }

    impl Write for OneBytePerCall {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if buf.is_empty() {
                return Ok(0);
            }
            self.calls += 1;
            self.data.push(buf[0]);
            Ok(1)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct FlakyWriter {
        failures: Vec<ErrorKind>,
        data: Vec<u8>,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if let Some(kind) = self.failures.pop() {
                return Err(std::io::Error::from(kind));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ClosedWriter;

    impl Write for ClosedWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}

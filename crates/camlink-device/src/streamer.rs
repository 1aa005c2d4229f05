//! Chunked transfer of a captured frame to the host.

use std::io::Write;

use camlink_frame::PacketWriter;
use serde::Serialize;

use crate::camera::Camera;
use crate::error::{DeviceError, Result};

/// Largest chunk moved per transfer step.
pub const WINDOW: usize = 255;

/// Where a transfer stands.
///
/// `Draining` outlives a failed transfer and records how much of the
/// declared body reached the wire before the reply was cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Draining { declared: usize, sent: usize },
}

/// Totals for one completed transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransferStats {
    pub chunks: usize,
    pub bytes: usize,
}

/// Streams the camera's capture buffer as one image reply.
///
/// The body length is declared in the header before the first chunk, then
/// the buffer is pulled one window at a time and written straight through.
/// At most one window is held in memory whatever the frame size.
#[derive(Debug)]
pub struct ImageStreamer {
    window: usize,
    state: StreamState,
}

impl Default for ImageStreamer {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageStreamer {
    pub fn new() -> Self {
        Self {
            window: WINDOW,
            state: StreamState::Idle,
        }
    }

    /// Use a smaller window, clamped to `1..=WINDOW`.
    pub fn with_window(window: usize) -> Self {
        Self {
            window: window.clamp(1, WINDOW),
            state: StreamState::Idle,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Forget an interrupted transfer.
    pub fn abandon(&mut self) {
        if let StreamState::Draining { declared, sent } = self.state {
            tracing::debug!(declared, sent, "interrupted image transfer abandoned");
        }
        self.state = StreamState::Idle;
    }

    /// Send the camera's current capture, framed as an image reply.
    ///
    /// Returns to [`StreamState::Idle`] once the trailer is out. An error
    /// after the header was written leaves the reply incomplete on the wire
    /// and the state at `Draining` with the bytes actually sent, until the
    /// next transfer or [`ImageStreamer::abandon`].
    pub fn drain<C, W>(
        &mut self,
        camera: &mut C,
        writer: &mut PacketWriter<W>,
        descriptor: u8,
    ) -> Result<TransferStats>
    where
        C: Camera + ?Sized,
        W: Write,
    {
        self.state = StreamState::Idle;
        let stats = self.transfer(camera, writer, descriptor)?;
        self.state = StreamState::Idle;
        Ok(stats)
    }

    fn transfer<C, W>(
        &mut self,
        camera: &mut C,
        writer: &mut PacketWriter<W>,
        descriptor: u8,
    ) -> Result<TransferStats>
    where
        C: Camera + ?Sized,
        W: Write,
    {
        let declared = camera.total_length() as usize;
        let mut stats = TransferStats::default();
        let mut window = [0u8; WINDOW];

        let mut body = writer.begin_image(declared, descriptor)?;
        tracing::debug!(declared, window = self.window, "image transfer started");
        self.state = StreamState::Draining { declared, sent: 0 };

        loop {
            let remaining = camera.remaining_length() as usize;
            if remaining == 0 {
                break;
            }

            let want = remaining.min(self.window);
            let read = camera
                .read_buff(&mut window[..want])
                .map_err(DeviceError::Capture)?
                .min(want);
            if read == 0 {
                tracing::warn!(declared, sent = stats.bytes, "camera stopped yielding image data");
                return Err(DeviceError::Stalled {
                    declared,
                    sent: stats.bytes,
                });
            }

            body.write_chunk(&window[..read])?;
            stats.chunks += 1;
            stats.bytes += read;
            self.state = StreamState::Draining {
                declared,
                sent: stats.bytes,
            };
            tracing::trace!(chunk = read, sent = stats.bytes, declared, "image chunk sent");
        }

        body.finish()?;
        tracing::debug!(chunks = stats.chunks, bytes = stats.bytes, "image transfer complete");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use camlink_frame::{decode_image, image_descriptor, FrameError, IMAGE};

    use super::*;
    use crate::error::CapabilityError;
    use crate::sim::SimulatedCamera;
    use crate::values::{PixelFormat, Resolution};

    fn captured(len: usize) -> SimulatedCamera {
        let mut cam = SimulatedCamera::new().with_frame_len(len);
        cam.take_picture(Resolution::QVGA, PixelFormat::JPEG).unwrap();
        cam
    }

    #[test]
    fn six_hundred_bytes_go_out_as_three_chunks() {
        let mut cam = captured(600);
        let frame = cam.frame_bytes().to_vec();
        let mut writer = PacketWriter::new(Vec::new());
        let mut streamer = ImageStreamer::new();

        let stats = streamer
            .drain(&mut cam, &mut writer, image_descriptor(1))
            .unwrap();

        assert_eq!(stats, TransferStats { chunks: 3, bytes: 600 });
        assert_eq!(cam.read_sizes(), &[255, 255, 90]);
        assert_eq!(cam.remaining_length(), 0);
        assert_eq!(streamer.state(), StreamState::Idle);

        let wire = writer.into_inner();
        let packet = decode_image(&wire).unwrap();
        assert_eq!(packet.msg_type, IMAGE);
        assert_eq!(packet.descriptor, Some(0x11));
        assert_eq!(packet.payload.as_ref(), frame.as_slice());
        assert_eq!(wire.len(), 7 + 1 + 600 + 2);
    }

    #[test]
    fn exact_window_multiple() {
        let mut cam = captured(510);
        let mut writer = PacketWriter::new(Vec::new());
        let stats = ImageStreamer::new()
            .drain(&mut cam, &mut writer, 0x01)
            .unwrap();
        assert_eq!(stats.chunks, 2);
        assert_eq!(cam.read_sizes(), &[255, 255]);
    }

    #[test]
    fn empty_capture_sends_header_and_trailer_only() {
        let mut cam = captured(0);
        let mut writer = PacketWriter::new(Vec::new());
        let stats = ImageStreamer::new()
            .drain(&mut cam, &mut writer, 0x21)
            .unwrap();

        assert_eq!(stats, TransferStats::default());
        let wire = writer.into_inner();
        assert_eq!(wire, vec![0xFF, 0xAA, 0x01, 0, 0, 0, 0, 0x21, 0xFF, 0xBB]);
    }

    #[test]
    fn narrow_window() {
        let mut cam = captured(10);
        let mut writer = PacketWriter::new(Vec::new());
        let mut streamer = ImageStreamer::with_window(4);
        assert_eq!(streamer.window(), 4);
        streamer.drain(&mut cam, &mut writer, 0x01).unwrap();
        assert_eq!(cam.read_sizes(), &[4, 4, 2]);

        assert_eq!(ImageStreamer::with_window(0).window(), 1);
        assert_eq!(ImageStreamer::with_window(4096).window(), WINDOW);
    }

    #[test]
    fn stalled_camera_is_reported() {
        let mut cam = captured(300);
        cam.stall_after(255);
        let mut writer = PacketWriter::new(Vec::new());
        let mut streamer = ImageStreamer::new();

        let err = streamer.drain(&mut cam, &mut writer, 0x01).unwrap_err();
        assert!(matches!(
            err,
            DeviceError::Stalled {
                declared: 300,
                sent: 255
            }
        ));
        assert_eq!(
            streamer.state(),
            StreamState::Draining {
                declared: 300,
                sent: 255
            }
        );

        streamer.abandon();
        assert_eq!(streamer.state(), StreamState::Idle);
    }

    #[test]
    fn next_transfer_clears_interrupted_one() {
        let mut cam = captured(300);
        cam.fail_reads(CapabilityError::Timeout);
        let mut writer = PacketWriter::new(Vec::new());
        let mut streamer = ImageStreamer::new();

        streamer.drain(&mut cam, &mut writer, 0x01).unwrap_err();
        assert_eq!(
            streamer.state(),
            StreamState::Draining {
                declared: 300,
                sent: 0
            }
        );

        let mut cam = captured(20);
        let mut writer = PacketWriter::new(Vec::new());
        streamer.drain(&mut cam, &mut writer, 0x01).unwrap();
        assert_eq!(streamer.state(), StreamState::Idle);
    }

    #[test]
    fn refused_header_leaves_streamer_idle() {
        let mut cam = captured(300);
        let cfg = camlink_frame::FrameConfig {
            max_payload_size: 16,
            ..camlink_frame::FrameConfig::default()
        };
        let mut writer = PacketWriter::with_config(Vec::new(), cfg);
        let mut streamer = ImageStreamer::new();

        let err = streamer.drain(&mut cam, &mut writer, 0x01).unwrap_err();
        assert!(matches!(err, DeviceError::Frame(FrameError::PayloadTooLarge { .. })));
        assert_eq!(streamer.state(), StreamState::Idle);
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn read_failure_mid_stream() {
        let mut cam = captured(300);
        cam.fail_reads(CapabilityError::Timeout);
        let mut writer = PacketWriter::new(Vec::new());

        let err = ImageStreamer::new()
            .drain(&mut cam, &mut writer, 0x01)
            .unwrap_err();
        assert!(matches!(err, DeviceError::Capture(CapabilityError::Timeout)));
    }

    #[test]
    fn closed_transport_aborts_transfer() {
        let mut cam = captured(300);
        let mut writer = PacketWriter::new(ClosedWriter);
        let err = ImageStreamer::new()
            .drain(&mut cam, &mut writer, 0x01)
            .unwrap_err();
        assert!(matches!(
            err,
            DeviceError::Frame(FrameError::ConnectionClosed)
        ));
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

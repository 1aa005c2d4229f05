//! The device side of a link: read command bytes, dispatch, reply.

use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};

use camlink_frame::{FrameConfig, PacketWriter};
use camlink_transport::{Transport, TransportError};

use crate::camera::Camera;
use crate::command::{Command, CommandAssembler};
use crate::dispatch::{dispatch, Outcome};
use crate::error::{DeviceError, Result};
use crate::session::Session;

const READ_CHUNK_SIZE: usize = 64;

/// A camera module answering a host over one transport.
///
/// Commands are dispatched as soon as their last byte arrives, before the
/// next byte is read, so an image transfer always finishes before the next
/// command starts.
pub struct Device<C, T> {
    session: Session<C>,
    writer: PacketWriter<T>,
    assembler: CommandAssembler,
    backlog: Vec<u8>,
}

impl<C: Camera, T: Transport> Device<C, T> {
    pub fn new(camera: C, transport: T) -> Self {
        Self::with_session(Session::new(camera), transport, FrameConfig::default())
    }

    pub fn with_session(session: Session<C>, transport: T, config: FrameConfig) -> Self {
        Self {
            session,
            writer: PacketWriter::with_config(transport, config),
            assembler: CommandAssembler::new(),
            backlog: Vec::new(),
        }
    }

    /// Configure the link speed and drop anything already queued.
    pub fn begin(&mut self, baud_rate: u32) -> Result<()> {
        let link = self.writer.get_mut();
        link.set_baud_rate(baud_rate)?;
        let dropped = link.discard_input()?;
        self.assembler.clear();
        self.backlog.clear();
        tracing::info!(baud_rate, dropped, "device link ready");
        Ok(())
    }

    /// Read whatever input is ready and dispatch every command it completes.
    ///
    /// Blocks for at most the transport's read timeout when nothing is
    /// waiting. A timeout is an idle tick and yields no outcomes.
    ///
    /// If a dispatch fails, the bytes read after the failing command are
    /// kept and fed first on the next poll.
    pub fn poll(&mut self) -> Result<Vec<(Command, Outcome)>> {
        if !self.backlog.is_empty() {
            let held = std::mem::take(&mut self.backlog);
            return self.feed(&held);
        }

        let pending = self.writer.get_mut().available()?;
        let want = pending.clamp(1, READ_CHUNK_SIZE);
        let mut buf = [0u8; READ_CHUNK_SIZE];

        let read = match self.writer.get_mut().read(&mut buf[..want]) {
            Ok(0) => return Err(DeviceError::Transport(TransportError::Closed)),
            Ok(n) => n,
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                return Ok(Vec::new())
            }
            Err(err) => return Err(DeviceError::Transport(TransportError::Io(err))),
        };

        self.feed(&buf[..read])
    }

    /// Input read but not yet fed to the command assembler.
    pub fn pending_input(&self) -> &[u8] {
        &self.backlog
    }

    fn feed(&mut self, bytes: &[u8]) -> Result<Vec<(Command, Outcome)>> {
        let mut outcomes = Vec::new();
        for (i, &byte) in bytes.iter().enumerate() {
            let Some(command) = self.assembler.push(byte) else {
                continue;
            };
            match dispatch(&mut self.session, &mut self.writer, &command) {
                Ok(outcome) => outcomes.push((command, outcome)),
                Err(err) => {
                    let rest = &bytes[i + 1..];
                    if !rest.is_empty() {
                        tracing::warn!(
                            opcode = command.opcode(),
                            held = rest.len(),
                            error = %err,
                            "command failed, holding later input"
                        );
                    }
                    self.backlog.extend_from_slice(rest);
                    return Err(err);
                }
            }
        }
        Ok(outcomes)
    }

    /// Poll until `running` is cleared or the host side closes the link.
    pub fn run(&mut self, running: &AtomicBool) -> Result<()> {
        while running.load(Ordering::SeqCst) {
            match self.poll() {
                Ok(_) => {}
                Err(DeviceError::Transport(TransportError::Closed)) => {
                    tracing::info!("link closed by host");
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<C> {
        &mut self.session
    }

    pub fn transport(&self) -> &T {
        self.writer.get_ref()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.writer.get_mut()
    }

    pub fn into_parts(self) -> (Session<C>, T) {
        (self.session, self.writer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::thread;

    use camlink_frame::{FrameError, PacketReader, FIRMWARE_VERSION, SDK_VERSION};
    use camlink_transport::MemoryLink;

    use super::*;
    use crate::sim::{CameraCall, SimulatedCamera};
    use crate::values::{PixelFormat, Resolution};

    #[test]
    fn begin_sets_baud_and_flushes_input() {
        let (device_end, mut host_end) = MemoryLink::pair();
        host_end.write_all(&[0x0D, 0x01]).unwrap();

        let mut device = Device::new(SimulatedCamera::new(), device_end);
        device.begin(115_200).unwrap();
        assert_eq!(device.transport().baud_rate(), 115_200);
        assert_eq!(device.transport_mut().available().unwrap(), 0);

        assert!(matches!(
            device.begin(0),
            Err(DeviceError::Transport(TransportError::InvalidBaudRate(0)))
        ));
    }

    #[test]
    fn poll_dispatches_completed_commands() {
        let (device_end, mut host_end) = MemoryLink::pair();
        let mut device = Device::new(SimulatedCamera::new(), device_end);

        host_end.write_all(&[0x03, 0x02, 0x0D, 0x01]).unwrap();
        let outcomes = device.poll().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].0.opcode(), 0x03);

        host_end.write_all(&[0x02]).unwrap();
        let outcomes = device.poll().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].1, Outcome::Handled);
        assert_eq!(
            device.session().camera().calls().last(),
            Some(&CameraCall::IsoSensitivity(0x0102))
        );
    }

    #[test]
    fn poll_reports_closed_link() {
        let (device_end, host_end) = MemoryLink::pair();
        let mut device = Device::new(SimulatedCamera::new(), device_end);
        drop(host_end);
        assert!(matches!(
            device.poll(),
            Err(DeviceError::Transport(TransportError::Closed))
        ));
    }

    #[test]
    fn idle_timeout_is_not_an_error() {
        let (device_end, _host_end) = MemoryLink::pair();
        let device_end = device_end.with_read_timeout(std::time::Duration::from_millis(5));
        let mut device = Device::new(SimulatedCamera::new(), device_end);
        assert!(device.poll().unwrap().is_empty());
    }

    #[test]
    fn run_serves_a_host_until_it_hangs_up() {
        let (device_end, host_end) = MemoryLink::pair();
        let device_end = device_end.with_chunk_limit(1);
        let running = AtomicBool::new(true);

        let host = thread::spawn(move || {
            let mut host_end = host_end.with_chunk_limit(1);
            host_end.write_all(&[0x01, 0x11, 0x10, 0x30, 0x40]).unwrap();
            let mut reader = PacketReader::new(host_end);
            let image = reader.read_image().unwrap();
            let firmware = reader.expect_packet(FIRMWARE_VERSION).unwrap();
            let sdk = reader.expect_packet(SDK_VERSION).unwrap();
            (image, firmware, sdk)
        });

        let mut device = Device::new(SimulatedCamera::new(), device_end);
        device.run(&running).unwrap();

        let (image, firmware, sdk) = host.join().unwrap();
        assert_eq!(image.descriptor, Some(0x11));
        assert_eq!(image.payload.len(), 320 * 240 / 10);
        assert_eq!(firmware.payload.len(), 6);
        assert_eq!(sdk.payload.len(), 7);

        let (session, _) = device.into_parts();
        assert_eq!(session.picture_resolution(), Resolution::QVGA);
        assert_eq!(session.pixel_format(), PixelFormat::JPEG);
    }

    #[test]
    fn input_after_a_failed_reply_is_kept() {
        let link = FlakyLink {
            input: vec![0x30, 0x40],
            output: Vec::new(),
            fail_next_write: true,
        };
        let mut device = Device::new(SimulatedCamera::new(), link);

        let err = device.poll().unwrap_err();
        assert!(matches!(err, DeviceError::Frame(FrameError::Io(_))));
        assert_eq!(device.pending_input(), &[0x40]);

        let outcomes = device.poll().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].0.opcode(), 0x40);
        assert!(device.pending_input().is_empty());

        let (_, link) = device.into_parts();
        let packet = camlink_frame::decode_packet(&link.output).unwrap();
        assert_eq!(packet.msg_type, SDK_VERSION);
    }

    #[test]
    fn begin_drops_held_input() {
        let link = FlakyLink {
            input: vec![0x30, 0x40, 0x40],
            output: Vec::new(),
            fail_next_write: true,
        };
        let mut device = Device::new(SimulatedCamera::new(), link);
        device.poll().unwrap_err();
        assert_eq!(device.pending_input().len(), 2);

        device.begin(9_600).unwrap();
        assert!(device.pending_input().is_empty());
    }

    /// Serves queued input and fails the first write with a hard error.
    struct FlakyLink {
        input: Vec<u8>,
        output: Vec<u8>,
        fail_next_write: bool,
    }

    impl Read for FlakyLink {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = buf.len().min(self.input.len());
            buf[..n].copy_from_slice(&self.input[..n]);
            self.input.drain(..n);
            Ok(n)
        }
    }

    impl Write for FlakyLink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if std::mem::take(&mut self.fail_next_write) {
                return Err(std::io::Error::other("line fault"));
            }
            self.output.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Transport for FlakyLink {
        fn available(&mut self) -> camlink_transport::Result<usize> {
            Ok(self.input.len())
        }

        fn baud_rate(&self) -> u32 {
            9_600
        }

        fn set_baud_rate(&mut self, _baud_rate: u32) -> camlink_transport::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn run_returns_when_flag_is_cleared() {
        let (device_end, _host_end) = MemoryLink::pair();
        let running = AtomicBool::new(false);
        let mut device = Device::new(SimulatedCamera::new(), device_end);
        device.run(&running).unwrap();
    }
}

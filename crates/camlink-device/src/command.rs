//! Decoded host requests and the byte-stream assembler that produces them.

use std::fmt;

use crate::error::CommandError;
use crate::opcode::{arity_of, Opcode};
use crate::values::{PixelFormat, Resolution};

/// Most argument bytes any command carries.
pub const MAX_ARGS: usize = 3;

/// An opcode with exactly the argument bytes it takes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Command {
    opcode: u8,
    args: [u8; MAX_ARGS],
    len: u8,
}

impl Command {
    /// Validate `args` against the opcode table.
    ///
    /// Known opcodes need their exact argument count. Unknown opcodes are
    /// accepted with up to three bytes.
    pub fn new(opcode: u8, args: &[u8]) -> Result<Self, CommandError> {
        if args.len() > MAX_ARGS {
            return Err(CommandError::TooManyArguments {
                opcode,
                actual: args.len(),
            });
        }
        if let Some(op) = Opcode::from_byte(opcode) {
            if op.arity() != args.len() {
                return Err(CommandError::ArgumentCount {
                    opcode,
                    expected: op.arity(),
                    actual: args.len(),
                });
            }
        }
        let mut buf = [0u8; MAX_ARGS];
        buf[..args.len()].copy_from_slice(args);
        Ok(Self {
            opcode,
            args: buf,
            len: args.len() as u8,
        })
    }

    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// The opcode, if it is one the device knows.
    pub fn known_opcode(&self) -> Option<Opcode> {
        Opcode::from_byte(self.opcode)
    }

    pub fn args(&self) -> &[u8] {
        &self.args[..usize::from(self.len)]
    }

    /// Argument `index`, zero when absent.
    pub fn arg(&self, index: usize) -> u8 {
        self.args().get(index).copied().unwrap_or(0)
    }

    /// Wire form: opcode followed by its arguments.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.args().len());
        out.push(self.opcode);
        out.extend_from_slice(self.args());
        out
    }

    fn known(op: Opcode, args: &[u8]) -> Self {
        let mut buf = [0u8; MAX_ARGS];
        buf[..args.len()].copy_from_slice(args);
        Self {
            opcode: op.as_byte(),
            args: buf,
            len: args.len() as u8,
        }
    }

    /// Build a command for a known opcode from a single argument byte.
    pub fn with_arg(op: Opcode, arg: u8) -> Result<Self, CommandError> {
        Self::new(op.as_byte(), &[arg])
    }

    /// Build a command for a known opcode that takes no arguments.
    pub fn bare(op: Opcode) -> Result<Self, CommandError> {
        Self::new(op.as_byte(), &[])
    }

    pub fn reset() -> Self {
        Self::known(Opcode::Reset, &[])
    }

    pub fn take_picture() -> Self {
        Self::known(Opcode::TakePicture, &[])
    }

    pub fn stop_stream() -> Self {
        Self::known(Opcode::StopStream, &[])
    }

    pub fn get_camera_info() -> Self {
        Self::known(Opcode::GetCameraInfo, &[])
    }

    pub fn get_firmware_version() -> Self {
        Self::known(Opcode::GetFirmwareVersion, &[])
    }

    pub fn get_sdk_version() -> Self {
        Self::known(Opcode::GetSdkVersion, &[])
    }

    /// SET_PICTURE_RESOLUTION with resolution and format packed into one byte.
    pub fn set_picture_resolution(resolution: Resolution, format: PixelFormat) -> Self {
        Self::known(
            Opcode::SetPictureResolution,
            &[pack_picture_mode(resolution, format)],
        )
    }

    pub fn set_video_resolution(resolution: Resolution) -> Self {
        Self::known(Opcode::SetVideoResolution, &[resolution.0 & 0x0F])
    }

    pub fn set_manual_gain(gain: u16) -> Self {
        Self::known(Opcode::SetManualGain, &gain.to_be_bytes())
    }

    /// SET_MANUAL_EXPOSURE; only the low 24 bits travel.
    pub fn set_manual_exposure(exposure: u32) -> Self {
        let [_, a, b, c] = exposure.to_be_bytes();
        Self::known(Opcode::SetManualExposure, &[a, b, c])
    }

    pub fn debug_write_register(bytes: [u8; 3]) -> Self {
        Self::known(Opcode::DebugWriteRegister, &bytes)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.known_opcode().map_or("UNKNOWN", Opcode::name);
        f.debug_struct("Command")
            .field("opcode", &format_args!("0x{:02X} ({name})", self.opcode))
            .field("args", &format_args!("{:02X?}", self.args()))
            .finish()
    }
}

/// Pack a picture mode byte: resolution in bits 0-3, format in bits 4-6.
pub fn pack_picture_mode(resolution: Resolution, format: PixelFormat) -> u8 {
    ((format.0 & 0x07) << 4) | (resolution.0 & 0x0F)
}

/// Split a picture mode byte back into resolution and format.
pub fn unpack_picture_mode(arg: u8) -> (Resolution, PixelFormat) {
    (Resolution(arg & 0x0F), PixelFormat((arg & 0x70) >> 4))
}

/// Turns the raw inbound byte stream into commands.
///
/// Each opcode byte is followed by exactly as many argument bytes as the
/// opcode table says. Unknown opcodes complete on their own, so a stray
/// byte never swallows the start of the next command.
#[derive(Debug, Default)]
pub struct CommandAssembler {
    opcode: Option<u8>,
    args: [u8; MAX_ARGS],
    filled: usize,
}

impl CommandAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte; returns a command once its last byte has arrived.
    pub fn push(&mut self, byte: u8) -> Option<Command> {
        let opcode = match self.opcode {
            Some(opcode) => {
                self.args[self.filled] = byte;
                self.filled += 1;
                opcode
            }
            None => {
                self.opcode = Some(byte);
                self.filled = 0;
                byte
            }
        };

        if self.filled < arity_of(opcode) {
            return None;
        }

        self.opcode = None;
        let args = &self.args[..self.filled];
        // Arity comes from the same table Command::new checks against.
        Command::new(opcode, args).ok()
    }

    /// Feed a slice, collecting every command it completes.
    pub fn extend(&mut self, bytes: &[u8]) -> Vec<Command> {
        bytes.iter().filter_map(|b| self.push(*b)).collect()
    }

    /// Whether a command is partially assembled.
    pub fn is_pending(&self) -> bool {
        self.opcode.is_some()
    }

    /// Drop a partially assembled command.
    pub fn clear(&mut self) {
        self.opcode = None;
        self.filled = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_validates_argument_count() {
        let cmd = Command::new(0x0D, &[0x01, 0x02]).unwrap();
        assert_eq!(cmd.opcode(), 0x0D);
        assert_eq!(cmd.args(), &[0x01, 0x02]);

        assert_eq!(
            Command::new(0x0D, &[0x01]),
            Err(CommandError::ArgumentCount {
                opcode: 0x0D,
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            Command::new(0x10, &[0x00]),
            Err(CommandError::ArgumentCount {
                opcode: 0x10,
                expected: 0,
                actual: 1
            })
        );
        assert_eq!(
            Command::new(0x01, &[1, 2, 3, 4]),
            Err(CommandError::TooManyArguments {
                opcode: 0x01,
                actual: 4
            })
        );
    }

    #[test]
    fn unknown_opcodes_accept_up_to_three_bytes() {
        assert!(Command::new(0x0B, &[]).is_ok());
        assert!(Command::new(0x0B, &[1, 2, 3]).is_ok());
        assert!(Command::new(0x0B, &[1, 2, 3, 4]).is_err());
        assert_eq!(Command::new(0x0B, &[]).unwrap().known_opcode(), None);
    }

    #[test]
    fn constructors_encode_wire_form() {
        assert_eq!(Command::take_picture().to_bytes(), vec![0x10]);
        assert_eq!(Command::reset().to_bytes(), vec![0xFF]);
        assert_eq!(
            Command::set_picture_resolution(Resolution::SVGA, PixelFormat::RGB565).to_bytes(),
            vec![0x01, 0x23]
        );
        assert_eq!(Command::set_manual_gain(0x1234).to_bytes(), vec![0x0D, 0x12, 0x34]);
        assert_eq!(
            Command::set_manual_exposure(0xAB_12_34_56).to_bytes(),
            vec![0x0E, 0x12, 0x34, 0x56]
        );
        assert_eq!(
            Command::with_arg(Opcode::SetBrightness, 3).unwrap().to_bytes(),
            vec![0x03, 0x03]
        );
        assert!(Command::bare(Opcode::SetBrightness).is_err());
    }

    #[test]
    fn picture_mode_packing() {
        assert_eq!(
            unpack_picture_mode(0x23),
            (Resolution(0x3), PixelFormat(0x2))
        );
        assert_eq!(unpack_picture_mode(0xFF), (Resolution(0x0F), PixelFormat(0x07)));
        assert_eq!(pack_picture_mode(Resolution::QVGA, PixelFormat::JPEG), 0x11);
    }

    #[test]
    fn assembler_waits_for_arguments() {
        let mut asm = CommandAssembler::new();
        assert_eq!(asm.push(0x0E), None);
        assert!(asm.is_pending());
        assert_eq!(asm.push(0x01), None);
        assert_eq!(asm.push(0x02), None);
        let cmd = asm.push(0x03).unwrap();
        assert_eq!(cmd.opcode(), 0x0E);
        assert_eq!(cmd.args(), &[1, 2, 3]);
        assert!(!asm.is_pending());
    }

    #[test]
    fn assembler_splits_back_to_back_commands() {
        let mut asm = CommandAssembler::new();
        let cmds = asm.extend(&[0x10, 0x01, 0x11, 0x0F, 0x0D, 0x00, 0x80]);
        let ops: Vec<u8> = cmds.iter().map(Command::opcode).collect();
        assert_eq!(ops, vec![0x10, 0x01, 0x0F, 0x0D]);
        assert_eq!(cmds[1].args(), &[0x11]);
        assert_eq!(cmds[3].args(), &[0x00, 0x80]);
    }

    #[test]
    fn unknown_opcode_does_not_desync() {
        let mut asm = CommandAssembler::new();
        let cmds = asm.extend(&[0x0B, 0x99, 0x10]);
        let ops: Vec<u8> = cmds.iter().map(Command::opcode).collect();
        assert_eq!(ops, vec![0x0B, 0x99, 0x10]);
    }

    #[test]
    fn clear_drops_partial_command() {
        let mut asm = CommandAssembler::new();
        asm.push(0x12);
        asm.push(0xAA);
        asm.clear();
        assert_eq!(asm.push(0x30).map(|c| c.opcode()), Some(0x30));
    }

    #[test]
    fn debug_names_opcode() {
        let text = format!("{:?}", Command::set_manual_gain(0x0102));
        assert!(text.contains("SET_MANUAL_GAIN"));
        assert!(text.contains("[01, 02]"));
    }
}

//! Host command opcodes.

use std::fmt;

/// Every opcode the device understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    SetPictureResolution = 0x01,
    SetVideoResolution = 0x02,
    SetBrightness = 0x03,
    SetContrast = 0x04,
    SetSaturation = 0x05,
    SetEv = 0x06,
    SetWhiteBalance = 0x07,
    SetSpecialEffects = 0x08,
    SetFocusControl = 0x09,
    SetExposureAndGainControl = 0x0A,
    SetWhiteBalanceControl = 0x0C,
    SetManualGain = 0x0D,
    SetManualExposure = 0x0E,
    GetCameraInfo = 0x0F,
    TakePicture = 0x10,
    SetSharpness = 0x11,
    DebugWriteRegister = 0x12,
    StopStream = 0x21,
    GetFirmwareVersion = 0x30,
    GetSdkVersion = 0x40,
    SetImageQuality = 0x50,
    Reset = 0xFF,
}

impl Opcode {
    pub const ALL: [Opcode; 22] = [
        Opcode::SetPictureResolution,
        Opcode::SetVideoResolution,
        Opcode::SetBrightness,
        Opcode::SetContrast,
        Opcode::SetSaturation,
        Opcode::SetEv,
        Opcode::SetWhiteBalance,
        Opcode::SetSpecialEffects,
        Opcode::SetFocusControl,
        Opcode::SetExposureAndGainControl,
        Opcode::SetWhiteBalanceControl,
        Opcode::SetManualGain,
        Opcode::SetManualExposure,
        Opcode::GetCameraInfo,
        Opcode::TakePicture,
        Opcode::SetSharpness,
        Opcode::DebugWriteRegister,
        Opcode::StopStream,
        Opcode::GetFirmwareVersion,
        Opcode::GetSdkVersion,
        Opcode::SetImageQuality,
        Opcode::Reset,
    ];

    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|op| *op as u8 == byte)
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Number of argument bytes that follow the opcode on the wire.
    pub fn arity(self) -> usize {
        match self {
            Opcode::SetManualGain => 2,
            Opcode::SetManualExposure | Opcode::DebugWriteRegister => 3,
            Opcode::GetCameraInfo
            | Opcode::TakePicture
            | Opcode::StopStream
            | Opcode::GetFirmwareVersion
            | Opcode::GetSdkVersion
            | Opcode::Reset => 0,
            _ => 1,
        }
    }

    /// Protocol name, as used in logs and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::SetPictureResolution => "SET_PICTURE_RESOLUTION",
            Opcode::SetVideoResolution => "SET_VIDEO_RESOLUTION",
            Opcode::SetBrightness => "SET_BRIGHTNESS",
            Opcode::SetContrast => "SET_CONTRAST",
            Opcode::SetSaturation => "SET_SATURATION",
            Opcode::SetEv => "SET_EV",
            Opcode::SetWhiteBalance => "SET_WHITEBALANCE",
            Opcode::SetSpecialEffects => "SET_SPECIAL_EFFECTS",
            Opcode::SetFocusControl => "SET_FOCUS_CONTROL",
            Opcode::SetExposureAndGainControl => "SET_EXPOSUREANDGAIN_CONTROL",
            Opcode::SetWhiteBalanceControl => "SET_WHILEBALANCE_CONTROL",
            Opcode::SetManualGain => "SET_MANUAL_GAIN",
            Opcode::SetManualExposure => "SET_MANUAL_EXPOSURE",
            Opcode::GetCameraInfo => "GET_CAMERA_INFO",
            Opcode::TakePicture => "TAKE_PICTURE",
            Opcode::SetSharpness => "SET_SHARPNESS",
            Opcode::DebugWriteRegister => "DEBUG_WRITE_REGISTER",
            Opcode::StopStream => "STOP_STREAM",
            Opcode::GetFirmwareVersion => "GET_FRM_VER_INFO",
            Opcode::GetSdkVersion => "GET_SDK_VER_INFO",
            Opcode::SetImageQuality => "SET_IMAGE_QUALITY",
            Opcode::Reset => "RESET",
        }
    }

    /// Look an opcode up by protocol name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(name))
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        Self::from_byte(byte).ok_or(byte)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Argument count for a raw opcode byte; unknown opcodes take none.
pub fn arity_of(byte: u8) -> usize {
    Opcode::from_byte(byte).map_or(0, Opcode::arity)
}

/// Errors that break the reply stream and end the current command.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] camlink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] camlink_frame::FrameError),

    /// The camera failed while an image body was already being streamed.
    #[error("capture failed mid-stream: {0}")]
    Capture(CapabilityError),

    /// The camera stopped producing bytes before the declared length was sent.
    #[error("image stream stalled ({sent} of {declared} bytes sent)")]
    Stalled { declared: usize, sent: usize },
}

pub type Result<T> = std::result::Result<T, DeviceError>;

/// A camera rejected or failed an operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    /// The value is outside what this camera supports.
    #[error("unsupported {setting} value 0x{value:X}")]
    Unsupported { setting: &'static str, value: u32 },

    /// Preview was requested with no output callback registered.
    #[error("callback function is not registered")]
    NoCallback,

    /// The camera did not answer in time.
    #[error("camera timed out")]
    Timeout,

    /// Any other driver failure.
    #[error("camera error: {0}")]
    Hardware(String),
}

/// A raw command whose argument bytes do not fit its opcode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("opcode 0x{opcode:02X} takes {expected} argument byte(s), got {actual}")]
    ArgumentCount {
        opcode: u8,
        expected: usize,
        actual: usize,
    },

    #[error("opcode 0x{opcode:02X} given {actual} argument bytes (at most 3)")]
    TooManyArguments { opcode: u8, actual: usize },
}

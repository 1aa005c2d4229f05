//! Message type tags carried in the third header byte.
//!
//! The tag tells the host how to interpret the payload. Text replies may
//! carry a caller-supplied tag; [`TEXT`] is the one the device uses itself.

/// Captured image data (streamed, preceded by a descriptor byte).
pub const IMAGE: u8 = 0x01;

/// Human-readable camera capability report.
pub const CAMERA_INFO: u8 = 0x02;

/// Firmware version and build date (4 raw bytes).
pub const FIRMWARE_VERSION: u8 = 0x03;

/// Driver SDK version (5 raw bytes).
pub const SDK_VERSION: u8 = 0x05;

/// Generic text message.
pub const TEXT: u8 = 0x07;

/// Returns a human-readable name for a message type tag.
pub fn msg_type_name(msg_type: u8) -> &'static str {
    match msg_type {
        IMAGE => "IMAGE",
        CAMERA_INFO => "CAMERA_INFO",
        FIRMWARE_VERSION => "FIRMWARE_VERSION",
        SDK_VERSION => "SDK_VERSION",
        TEXT => "TEXT",
        _ => "UNKNOWN",
    }
}

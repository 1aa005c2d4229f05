/// Errors that can occur during packet encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The packet does not start with the head magic (0xFF 0xAA).
    #[error("bad packet header (expected 0xFF 0xAA)")]
    BadHeader,

    /// Fewer bytes are available than the header declares.
    #[error("truncated packet ({available} bytes available, {needed} needed)")]
    Truncated { needed: usize, available: usize },

    /// The two bytes after the payload are not the tail magic (0xFF 0xBB).
    #[error("bad packet trailer (found {found:02X?}, expected [FF, BB])")]
    BadTrailer { found: [u8; 2] },

    /// A packet of a different message type arrived than the caller expected.
    #[error("unexpected message type 0x{found:02X} (expected 0x{expected:02X})")]
    UnexpectedType { expected: u8, found: u8 },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A packet was about to be written with a descriptor layout that
    /// readers sharing the same frame config would misparse.
    #[error(
        "message type 0x{msg_type:02X} takes {expected} descriptor byte(s) under this frame config, got {found}"
    )]
    DescriptorMismatch {
        msg_type: u8,
        expected: usize,
        found: usize,
    },

    /// A streamed body did not match the length declared in its header.
    #[error("body length mismatch (declared {declared} bytes, wrote {written})")]
    LengthMismatch { declared: usize, written: usize },

    /// An I/O error occurred while reading or writing packets.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link was closed before a complete packet was received.
    #[error("connection closed (incomplete packet)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;

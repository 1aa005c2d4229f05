/// Errors that can occur in link operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the specified serial port.
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },

    /// The serial driver rejected a configuration or query.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// An I/O error occurred on the link.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested link speed is not usable.
    #[error("invalid baud rate: {0}")]
    InvalidBaudRate(u32),

    /// The other end of the link has gone away.
    #[error("link closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;

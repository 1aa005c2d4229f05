use std::time::Duration;

/// Default link speed used by camera modules out of reset.
pub const DEFAULT_BAUD_RATE: u32 = 921_600;

/// Default read timeout for serial links.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Configuration for opening a serial link.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Port name, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port: String,
    /// Link speed in bits per second. Default: 921600.
    pub baud_rate: u32,
    /// Read timeout applied to blocking reads.
    pub read_timeout: Duration,
}

impl LinkConfig {
    /// Configuration for `port` with default speed and timeout.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }

    /// Override the link speed.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Override the read timeout.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

//! Byte-oriented link abstraction for camlink.
//!
//! Provides a unified interface over the links a camera module is reached
//! through:
//! - Serial ports (UART, USB CDC)
//! - In-memory duplex pipes (tests, loopback demos)
//!
//! This is the lowest layer of camlink. Everything else builds on top of
//! the [`Transport`] trait provided here.

pub mod config;
pub mod error;
pub mod memory;
pub mod serial;
pub mod traits;

pub use config::{LinkConfig, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT};
pub use error::{Result, TransportError};
pub use memory::MemoryLink;
pub use serial::{list_ports, PortInfo, SerialLink};
pub use traits::Transport;

//! Serial camera link.
//!
//! A host drives a camera module over a byte-oriented serial link with
//! single-byte opcodes; the module answers with framed packets and streams
//! captured images back in bounded chunks.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte link abstraction (serial port, in-memory pipe)
//! - [`frame`]: packet envelope encoding, decoding and streamed bodies
//! - [`device`]: opcode dispatch, image streaming, info replies, device loop

/// Re-export transport types.
pub mod transport {
    pub use camlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use camlink_frame::*;
}

/// Re-export device types.
pub mod device {
    pub use camlink_device::*;
}

use std::io::{ErrorKind, Read, Write};

use crate::error::{Result, TransportError};

/// A byte-oriented link to (or from) a camera module.
///
/// Reads and writes go through the std `Read`/`Write` impls; the extra
/// methods cover what a UART exposes beyond a plain stream: how many bytes
/// are waiting, and the configured link speed.
pub trait Transport: Read + Write {
    /// Number of bytes that can be read right now without blocking.
    fn available(&mut self) -> Result<usize>;

    /// Current link speed in bits per second.
    fn baud_rate(&self) -> u32;

    /// Change the link speed. Zero is rejected.
    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()>;

    /// Throw away every pending inbound byte, returning how many were dropped.
    fn discard_input(&mut self) -> Result<usize> {
        let mut dropped = 0usize;
        let mut scratch = [0u8; 64];
        loop {
            let pending = self.available()?;
            if pending == 0 {
                return Ok(dropped);
            }
            let want = pending.min(scratch.len());
            match self.read(&mut scratch[..want]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => dropped += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn available(&mut self) -> Result<usize> {
        (**self).available()
    }

    fn baud_rate(&self) -> u32 {
        (**self).baud_rate()
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        (**self).set_baud_rate(baud_rate)
    }

    fn discard_input(&mut self) -> Result<usize> {
        (**self).discard_input()
    }
}

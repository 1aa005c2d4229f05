//! In-memory duplex link.
//!
//! Two connected ends, each readable and writable, with no real device
//! behind them. Used for tests and loopback demos, and can be throttled to
//! move at most N bytes per call to mimic a slow byte-at-a-time UART.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use crate::config::DEFAULT_BAUD_RATE;
use crate::error::{Result, TransportError};
use crate::traits::Transport;

#[derive(Debug, Default)]
struct PipeState {
    data: VecDeque<u8>,
    writer_gone: bool,
    reader_gone: bool,
}

#[derive(Debug, Default)]
struct Pipe {
    state: Mutex<PipeState>,
    ready: Condvar,
}

impl Pipe {
    fn lock(&self) -> std::io::Result<MutexGuard<'_, PipeState>> {
        self.state
            .lock()
            .map_err(|_| std::io::Error::other("memory link lock poisoned"))
    }
}

/// One end of an in-memory duplex link.
#[derive(Debug)]
pub struct MemoryLink {
    rx: Arc<Pipe>,
    tx: Arc<Pipe>,
    chunk_limit: Option<usize>,
    read_timeout: Option<Duration>,
    baud_rate: u32,
}

impl MemoryLink {
    /// Create two connected ends. Bytes written to one are read from the other.
    pub fn pair() -> (Self, Self) {
        let a_to_b = Arc::new(Pipe::default());
        let b_to_a = Arc::new(Pipe::default());
        let a = Self::from_pipes(Arc::clone(&b_to_a), Arc::clone(&a_to_b));
        let b = Self::from_pipes(a_to_b, b_to_a);
        (a, b)
    }

    fn from_pipes(rx: Arc<Pipe>, tx: Arc<Pipe>) -> Self {
        Self {
            rx,
            tx,
            chunk_limit: None,
            read_timeout: None,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }

    /// Move at most `limit` bytes per `read`/`write` call on this end.
    pub fn with_chunk_limit(mut self, limit: usize) -> Self {
        self.chunk_limit = Some(limit.max(1));
        self
    }

    /// Fail blocking reads with `TimedOut` after `timeout` without data.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    fn limit(&self, len: usize) -> usize {
        match self.chunk_limit {
            Some(limit) => len.min(limit),
            None => len,
        }
    }
}

impl Read for MemoryLink {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut state = self.rx.lock()?;
        while state.data.is_empty() {
            if state.writer_gone {
                return Ok(0);
            }
            state = match self.read_timeout {
                Some(timeout) => {
                    let (guard, wait) = self
                        .rx
                        .ready
                        .wait_timeout(state, timeout)
                        .map_err(|_| std::io::Error::other("memory link lock poisoned"))?;
                    if wait.timed_out() && guard.data.is_empty() && !guard.writer_gone {
                        return Err(std::io::Error::from(ErrorKind::TimedOut));
                    }
                    guard
                }
                None => self
                    .rx
                    .ready
                    .wait(state)
                    .map_err(|_| std::io::Error::other("memory link lock poisoned"))?,
            };
        }

        let n = self.limit(buf.len()).min(state.data.len());
        for (slot, byte) in buf.iter_mut().zip(state.data.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for MemoryLink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut state = self.tx.lock()?;
        if state.reader_gone {
            return Err(std::io::Error::from(ErrorKind::BrokenPipe));
        }
        let n = self.limit(buf.len());
        state.data.extend(&buf[..n]);
        drop(state);
        self.tx.ready.notify_all();
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Transport for MemoryLink {
    fn available(&mut self) -> Result<usize> {
        Ok(self.rx.lock()?.data.len())
    }

    fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        if baud_rate == 0 {
            return Err(TransportError::InvalidBaudRate(baud_rate));
        }
        self.baud_rate = baud_rate;
        Ok(())
    }
}

impl Drop for MemoryLink {
    fn drop(&mut self) {
        if let Ok(mut state) = self.tx.state.lock() {
            state.writer_gone = true;
        }
        self.tx.ready.notify_all();
        if let Ok(mut state) = self.rx.state.lock() {
            state.reader_gone = true;
        }
    }
}

//! Shared mock transport for the integration tests.
#![allow(dead_code)]

use ft2232_avr::Transport;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

/// Everything the device wrote to the transport, for assertions.
#[derive(Debug, Default)]
pub struct TransportLog {
    /// `(pin_value, pin_direction)` snapshots, in order.
    pub pin_writes: Vec<(u16, u16)>,
    /// Payloads of plain writes, in order.
    pub writes: Vec<Vec<u8>>,
    /// Payloads of write-then-read exchanges, in order.
    pub exchanges: Vec<Vec<u8>>,
    pub closed: bool,
}

/// A scriptable stand-in for the FTDI transport.
///
/// Read data is served from a queue, byte by byte; exhausted reads return
/// zeros. Failures can be scheduled per operation kind.
pub struct MockTransport {
    log: Arc<Mutex<TransportLog>>,
    read_data: VecDeque<u8>,
    pin_writes_before_failure: Option<usize>,
    fail_writes: bool,
    fail_close: bool,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(TransportLog::default())),
            read_data: VecDeque::new(),
            pin_writes_before_failure: None,
            fail_writes: false,
            fail_close: false,
        }
    }

    /// Bytes to serve for subsequent reads/exchanges.
    pub fn with_read_data(mut self, data: Vec<u8>) -> Self {
        self.read_data = data.into();
        self
    }

    /// Let `n` pin-snapshot writes succeed, then fail every later one.
    pub fn fail_pins_after(mut self, n: usize) -> Self {
        self.pin_writes_before_failure = Some(n);
        self
    }

    pub fn fail_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Handle onto the log, kept by the test across the move into the device.
    pub fn log(&self) -> Arc<Mutex<TransportLog>> {
        Arc::clone(&self.log)
    }

    fn fill(&mut self, buf: &mut [u8]) {
        for b in buf.iter_mut() {
            *b = self.read_data.pop_front().unwrap_or(0);
        }
    }

    fn fault() -> io::Error {
        io::Error::new(io::ErrorKind::Other, "bulk transfer failed")
    }
}

impl Transport for MockTransport {
    fn set_pins(&mut self, value: u16, direction: u16) -> io::Result<()> {
        match self.pin_writes_before_failure {
            Some(0) => return Err(Self::fault()),
            Some(n) => self.pin_writes_before_failure = Some(n - 1),
            None => {}
        }
        self.log.lock().unwrap().pin_writes.push((value, direction));
        Ok(())
    }

    fn write_bits(&mut self, data: &[u8]) -> io::Result<()> {
        if self.fail_writes {
            return Err(Self::fault());
        }
        self.log.lock().unwrap().writes.push(data.to_vec());
        Ok(())
    }

    fn read_bits(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.fill(buf);
        Ok(())
    }

    fn exchange(&mut self, tx: &[u8], rx: &mut [u8]) -> io::Result<()> {
        if self.fail_writes {
            return Err(Self::fault());
        }
        self.log.lock().unwrap().exchanges.push(tx.to_vec());
        self.fill(rx);
        Ok(())
    }

    fn last_error_string(&self) -> String {
        "mock device: endpoint stalled".to_string()
    }

    fn close(&mut self) -> io::Result<()> {
        if self.fail_close {
            return Err(Self::fault());
        }
        self.log.lock().unwrap().closed = true;
        Ok(())
    }
}

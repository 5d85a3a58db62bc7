//! USB transport backends.
//!
//! The programmer core talks to the FTDI chip through the [`Transport`]
//! trait: a pin-snapshot write, raw byte transmission/reception, and the
//! transport's own error text. Two backends are provided, one per transport
//! mode: [`BitbangTransport`] drives the chip in synchronous bitbang, where
//! every written byte is the full pin register and every write echoes the
//! sampled pin state back; [`MpsseTransport`] feeds command streams to the
//! MPSSE engine.
//!
//! Backends record the last failed status so `last_error_string` can
//! reproduce the transport-native error text after a failure.

use std::fmt;
use std::io;
use std::time::Duration;

use libftd2xx::{BitMode, Ft2232h, Ftdi, FtdiCommon, FtdiMpsse, MpsseCmdExecutor};
use log::trace;

use crate::consts::mpsse;

/// Byte-level access to the FTDI chip.
///
/// All operations block until the USB transfer completes or the device
/// timeout elapses; cancellation and deadlines are entirely the transport's
/// own. Implementations are single-owner, like the device state that holds
/// them.
pub trait Transport {
    /// Program the pin register from a `(pin_value, pin_direction)` snapshot.
    fn set_pins(&mut self, value: u16, direction: u16) -> io::Result<()>;
    /// Transmit raw bytes (bitbang frames or MPSSE commands).
    fn write_bits(&mut self, data: &[u8]) -> io::Result<()>;
    /// Receive exactly `buf.len()` bytes.
    fn read_bits(&mut self, buf: &mut [u8]) -> io::Result<()>;
    /// Transmit `tx`, then receive exactly `rx.len()` response bytes.
    fn exchange(&mut self, tx: &[u8], rx: &mut [u8]) -> io::Result<()>;
    /// The transport's own description of the most recent failure.
    fn last_error_string(&self) -> String;
    /// Release the device. Further calls are invalid.
    fn close(&mut self) -> io::Result<()>;
}

fn io_err<E: fmt::Debug>(e: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{e:?}"))
}

/// Synchronous-bitbang backend.
///
/// In synchronous bitbang mode the chip samples the pin register into its
/// read FIFO for every byte written, so each write is drained by an
/// equal-length read to keep the FIFOs in lockstep.
pub struct BitbangTransport {
    ft: Ftdi,
    direction: u8,
    last_error: Option<String>,
}

impl BitbangTransport {
    /// Opens the device selected by `description` and puts it in
    /// synchronous bitbang mode with all pins as inputs.
    pub fn open(description: &str, baud: u32) -> io::Result<Self> {
        let mut ft = Ftdi::with_description(description).map_err(io_err)?;
        ft.set_baud_rate(baud).map_err(io_err)?;
        ft.set_bit_mode(0, BitMode::SyncBitbang).map_err(io_err)?;
        ft.purge_all().map_err(io_err)?;
        trace!("opened '{description}' in synchronous bitbang at {baud} baud");
        Ok(Self {
            ft,
            direction: 0,
            last_error: None,
        })
    }

    fn fail(&mut self, e: io::Error) -> io::Error {
        self.last_error = Some(e.to_string());
        e
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let n = match self.ft.write(data) {
            Ok(n) => n,
            Err(e) => return Err(self.fail(io_err(e))),
        };
        if n != data.len() {
            return Err(self.fail(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write ({n} of {} bytes)", data.len()),
            )));
        }
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let mut off = 0;
        while off < buf.len() {
            let n = match self.ft.read(&mut buf[off..]) {
                Ok(n) => n,
                Err(e) => return Err(self.fail(io_err(e))),
            };
            if n == 0 {
                return Err(self.fail(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("read stalled at {off} of {} bytes", buf.len()),
                )));
            }
            off += n;
        }
        Ok(())
    }
}

impl Transport for BitbangTransport {
    fn set_pins(&mut self, value: u16, direction: u16) -> io::Result<()> {
        // Bitbang drives the low 8 pins; the direction is programmed
        // through the bit mode, the value through an ordinary write.
        let dir = direction as u8;
        if dir != self.direction {
            if let Err(e) = self.ft.set_bit_mode(dir, BitMode::SyncBitbang) {
                return Err(self.fail(io_err(e)));
            }
            self.direction = dir;
        }
        let mut echo = [0u8; 1];
        self.write_all(&[value as u8])?;
        self.read_exact(&mut echo)
    }

    fn write_bits(&mut self, data: &[u8]) -> io::Result<()> {
        self.write_all(data)?;
        // Drain the echoed samples so the read FIFO stays in lockstep.
        let mut echo = vec![0u8; data.len()];
        self.read_exact(&mut echo)
    }

    fn read_bits(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.read_exact(buf)
    }

    fn exchange(&mut self, tx: &[u8], rx: &mut [u8]) -> io::Result<()> {
        self.write_all(tx)?;
        self.read_exact(rx)
    }

    fn last_error_string(&self) -> String {
        self.last_error
            .clone()
            .unwrap_or_else(|| "no transport error recorded".to_string())
    }

    fn close(&mut self) -> io::Result<()> {
        if let Err(e) = self.ft.set_bit_mode(0, BitMode::Reset) {
            return Err(self.fail(io_err(e)));
        }
        self.ft.close().map_err(io_err)
    }
}

/// MPSSE backend for the FT2232C/D/H and FT232H synchronous serial engine.
pub struct MpsseTransport {
    ft: Ft2232h,
    last_error: Option<String>,
}

impl MpsseTransport {
    /// Opens the device selected by `description` and initializes the
    /// MPSSE engine at `clock_hz`.
    pub fn open(description: &str, clock_hz: u32) -> io::Result<Self> {
        let ft = Ftdi::with_description(description).map_err(io_err)?;
        let mut ft = Ft2232h::try_from(ft).map_err(io_err)?;
        ft.set_latency_timer(Duration::from_millis(1)).map_err(io_err)?;
        ft.initialize_mpsse_default().map_err(io_err)?;
        ft.set_clock(clock_hz).map_err(io_err)?;
        trace!("opened '{description}' in MPSSE mode at {clock_hz} Hz");
        Ok(Self {
            ft,
            last_error: None,
        })
    }

    fn fail(&mut self, e: io::Error) -> io::Error {
        self.last_error = Some(e.to_string());
        e
    }
}

impl Transport for MpsseTransport {
    fn set_pins(&mut self, value: u16, direction: u16) -> io::Result<()> {
        let cmd = [
            mpsse::SET_BITS_LOW,
            value as u8,
            direction as u8,
            mpsse::SET_BITS_HIGH,
            (value >> 8) as u8,
            (direction >> 8) as u8,
        ];
        self.write_bits(&cmd)
    }

    fn write_bits(&mut self, data: &[u8]) -> io::Result<()> {
        match self.ft.send(data) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(io_err(e))),
        }
    }

    fn read_bits(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.exchange(&[], buf)
    }

    fn exchange(&mut self, tx: &[u8], rx: &mut [u8]) -> io::Result<()> {
        match self.ft.xfer(tx, rx) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(io_err(e))),
        }
    }

    fn last_error_string(&self) -> String {
        self.last_error
            .clone()
            .unwrap_or_else(|| "no transport error recorded".to_string())
    }

    fn close(&mut self) -> io::Result<()> {
        match self.ft.close() {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(io_err(e))),
        }
    }
}

//! Chip variants, transport mode selection, and the programmer device
//! handle.

use crate::consts;
use crate::error::{Error, Result};
use crate::pins::{Pin, PinLevel, PinRole, PinState};
use crate::transport::{BitbangTransport, MpsseTransport, Transport};
use log::{debug, error, trace, warn};
use std::fmt;
use std::io;

/// Default baud rate for synchronous bitbang; the effective pin clock is a
/// multiple of this.
const DEFAULT_BITBANG_BAUD: u32 = 230_400;
/// Default MPSSE TCK/SCK frequency.
const DEFAULT_MPSSE_CLOCK_HZ: u32 = 1_000_000;

/// How the chip's pins are driven: one bit at a time under software
/// control, or through the synchronous serial engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Direct per-bit pin toggling (all supported chips).
    Bitbang,
    /// The MPSSE engine (FT2232C/D/H and FT232H only).
    Mpsse,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Bitbang => f.write_str("bitbang"),
            TransportMode::Mpsse => f.write_str("MPSSE"),
        }
    }
}

/// Supported FTDI chip variants. The variant fixes the pin count, the
/// internal FIFO sizes, and whether the MPSSE engine exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipModel {
    /// FT232R: 8 bitbang pins, no MPSSE.
    Ft232r,
    /// FT2232C/D: 12 usable pins per interface.
    Ft2232c,
    /// FT2232H: 16 pins per interface.
    Ft2232h,
    /// FT232H: 16 pins.
    Ft232h,
}

impl ChipModel {
    /// Number of physical pins present on this variant.
    pub fn pin_count(self) -> u8 {
        match self {
            ChipModel::Ft232r => 8,
            ChipModel::Ft2232c => 12,
            ChipModel::Ft2232h | ChipModel::Ft232h => 16,
        }
    }

    /// Receive FIFO size in bytes. In-out transfers must not request more
    /// than this per burst or the chip drops data.
    pub fn rx_buffer_size(self) -> usize {
        match self {
            ChipModel::Ft232r => 256,
            ChipModel::Ft2232c => 384,
            ChipModel::Ft2232h => 4096,
            ChipModel::Ft232h => 1024,
        }
    }

    /// Transmit FIFO size in bytes.
    pub fn tx_buffer_size(self) -> usize {
        match self {
            ChipModel::Ft232r | ChipModel::Ft2232c => 128,
            ChipModel::Ft2232h => 4096,
            ChipModel::Ft232h => 1024,
        }
    }

    /// Whether the synchronous serial engine is present.
    pub fn has_mpsse(self) -> bool {
        !matches!(self, ChipModel::Ft232r)
    }

    /// USB product ID of this variant.
    pub fn product_id(self) -> u16 {
        match self {
            ChipModel::Ft232r => consts::pid::FT232,
            ChipModel::Ft2232c | ChipModel::Ft2232h => consts::pid::FT2232,
            ChipModel::Ft232h => consts::pid::FT232H,
        }
    }
}

impl fmt::Display for ChipModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChipModel::Ft232r => f.write_str("FT232R"),
            ChipModel::Ft2232c => f.write_str("FT2232C/D"),
            ChipModel::Ft2232h => f.write_str("FT2232H"),
            ChipModel::Ft232h => f.write_str("FT232H"),
        }
    }
}

/// Resolves the transport mode for a session.
///
/// Fails with `UnsupportedMode` when MPSSE is requested on a chip without
/// the engine; the caller decides whether to reject the configuration or
/// retry with bitbang. The selection is made once per session; switching
/// modes means tearing the device down and reopening it.
pub fn select_mode(requested: TransportMode, chip: ChipModel) -> Result<TransportMode> {
    if requested == TransportMode::Mpsse && !chip.has_mpsse() {
        return Err(Error::UnsupportedMode {
            mode: requested,
            chip,
        });
    }
    Ok(requested)
}

/// A configured programmer session: the open USB transport, the live pin
/// state register, and the chip parameters the session was configured for.
///
/// Not designed for concurrent access; one instance belongs to exactly one
/// programming session, and the transport handle dies with it.
pub struct Ft2232Avr {
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) pins: PinState,
    mode: TransportMode,
    pin_limit: u8,
    rx_buffer_size: usize,
    tx_buffer_size: usize,
    pub(crate) lext_byte: u8,
    name: String,
}

impl Ft2232Avr {
    /// Opens the FTDI device selected by `description` and configures a
    /// programming session on it.
    ///
    /// `bindings` maps signal roles to physical pin numbers; every binding
    /// is validated against the descriptor table of the resolved mode.
    /// Any validation failure aborts the configuration; no partially
    /// configured device is ever returned.
    pub fn open(
        chip: ChipModel,
        description: &str,
        requested: TransportMode,
        bindings: &[(PinRole, u8)],
    ) -> Result<Self> {
        let mode = select_mode(requested, chip)?;
        let transport: Box<dyn Transport> = match mode {
            TransportMode::Bitbang => Box::new(
                BitbangTransport::open(description, DEFAULT_BITBANG_BAUD).map_err(|e| {
                    Error::Open {
                        name: description.to_string(),
                        message: e.to_string(),
                    }
                })?,
            ),
            TransportMode::Mpsse => Box::new(
                MpsseTransport::open(description, DEFAULT_MPSSE_CLOCK_HZ).map_err(|e| {
                    Error::Open {
                        name: description.to_string(),
                        message: e.to_string(),
                    }
                })?,
            ),
        };
        Self::from_transport(transport, chip, requested, description, bindings)
    }

    /// Builds a session over an already open transport. This is the core
    /// constructor the other constructors use; it also lets tests
    /// substitute a fake transport for the hardware.
    pub fn from_transport(
        transport: Box<dyn Transport>,
        chip: ChipModel,
        requested: TransportMode,
        name: &str,
        bindings: &[(PinRole, u8)],
    ) -> Result<Self> {
        let mode = select_mode(requested, chip)?;
        let mut dev = Self {
            transport,
            pins: PinState::new(),
            mode,
            pin_limit: chip.pin_count(),
            rx_buffer_size: chip.rx_buffer_size(),
            tx_buffer_size: chip.tx_buffer_size(),
            lext_byte: 0,
            name: name.to_string(),
        };
        for &(role, pin) in bindings {
            let pin = Pin::new(pin)?;
            dev.pins.bind(role, pin, mode, dev.pin_limit)?;
            debug!("{}: {} on {}", dev.name, role, dev.pin_name(pin));
        }
        let (value, direction) = dev.pins.snapshot();
        debug!(
            "{}: configured {} on {}, direction mask 0x{:04X}",
            dev.name, mode, chip, direction
        );
        let res = dev.transport.set_pins(value, direction);
        dev.check("initial pin snapshot write", res)?;
        Ok(dev)
    }

    /// The resolved transport mode of this session.
    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    /// Number of physical pins on the attached chip variant.
    pub fn pin_limit(&self) -> u8 {
        self.pin_limit
    }

    /// Receive FIFO size of the attached chip.
    pub fn rx_buffer_size(&self) -> usize {
        self.rx_buffer_size
    }

    /// Transmit FIFO size of the attached chip.
    pub fn tx_buffer_size(&self) -> usize {
        self.tx_buffer_size
    }

    /// Diagnostic name of this session.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current `(pin_value, pin_direction)` snapshot.
    pub fn pin_snapshot(&self) -> (u16, u16) {
        self.pins.snapshot()
    }

    /// The pin a role is bound to, as a configuration check.
    pub fn bound_pin(&self, role: PinRole) -> Option<Pin> {
        self.pins.pin_of(role)
    }

    /// Bus name of a physical pin, for diagnostics ("ADBUS3", "ACBUS1").
    pub fn pin_name(&self, pin: Pin) -> String {
        if pin.number() < 8 {
            format!("ADBUS{}", pin.number())
        } else {
            format!("ACBUS{}", pin.number() - 8)
        }
    }

    /// Sets the in-memory output level of `pin`. The electrical transition
    /// happens on the next [`flush`](Self::flush).
    pub fn drive(&mut self, pin: Pin, level: PinLevel) {
        self.pins.set(pin, level);
    }

    /// Turns a status indicator on or off and writes the snapshot out.
    /// Non-indicator roles and unbound indicators are ignored.
    pub fn set_led(&mut self, role: PinRole, on: bool) -> Result<()> {
        if !role.is_indicator() {
            return Ok(());
        }
        match self.pins.pin_of(role) {
            Some(pin) => {
                let level = if on { PinLevel::High } else { PinLevel::Low };
                self.pins.set(pin, level);
                self.flush()
            }
            None => Ok(()),
        }
    }

    /// Writes the current pin snapshot to the chip.
    pub fn flush(&mut self) -> Result<()> {
        let (value, direction) = self.pins.snapshot();
        trace!(
            "{}: pins value=0x{:04X} direction=0x{:04X}",
            self.name,
            value,
            direction
        );
        let res = self.transport.set_pins(value, direction);
        self.check("pin snapshot write", res)
    }

    /// Releases the pins and closes the transport, best effort. Failures
    /// during teardown are logged but never propagated.
    pub fn teardown(mut self) {
        debug!("{}: closing", self.name);
        let res = self.transport.set_pins(0, 0);
        self.check_lossy("pin release", res);
        let res = self.transport.close();
        self.check_lossy("transport close", res);
    }

    pub(crate) fn role_pin(&self, role: PinRole) -> Result<Pin> {
        self.pins.pin_of(role).ok_or(Error::RoleNotBound { role })
    }

    /// Translates a failed transport call into the uniform two-line
    /// diagnostic and a typed error: first the failing operation with the
    /// platform error description and code, then the transport's own error
    /// string. Every transport call site goes through here or through
    /// [`check_lossy`](Self::check_lossy).
    pub(crate) fn check<T>(&mut self, op: &'static str, res: io::Result<T>) -> Result<T> {
        match res {
            Ok(v) => Ok(v),
            Err(source) => {
                error!(
                    "{}: {}: {} ({})",
                    self.name,
                    op,
                    source,
                    source.raw_os_error().unwrap_or(0)
                );
                let native = self.transport.last_error_string();
                error!("{}: {}", self.name, native);
                Err(Error::Transport { op, source, native })
            }
        }
    }

    /// Like [`check`](Self::check) but swallows the failure after logging
    /// both diagnostic lines. For paths that must keep going, such as
    /// teardown.
    pub(crate) fn check_lossy(&mut self, op: &'static str, res: io::Result<()>) {
        if let Err(source) = res {
            warn!(
                "{}: {}: {} ({})",
                self.name,
                op,
                source,
                source.raw_os_error().unwrap_or(0)
            );
            warn!("{}: {}", self.name, self.transport.last_error_string());
        }
    }
}

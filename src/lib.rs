//! # ft2232-avr
//!
//! Transport core for programming AVR microcontrollers through FTDI
//! FT232R, FT2232C/D, FT2232H and FT232H USB bridge chips, driving the
//! target's SPI (ISP) or JTAG programming interface either by raw pin
//! toggling ("bitbang") or through the chip's MPSSE synchronous serial
//! engine.
//!
//! This crate owns the layer that decides electrical correctness:
//!
//! * validating and tracking which physical pins carry which logical
//!   signal roles under each transport mode,
//! * maintaining the live output-value and direction bitmasks of the
//!   chip's pin register,
//! * encoding the JTAG instruction-register and data-register opcodes of
//!   the AVR programming TAP,
//! * translating every transport failure into a uniform two-line
//!   diagnostic.
//!
//! The flash/EEPROM/fuse programming algorithms themselves sit above this
//! crate and compose the primitives exposed here (`spi_transfer`,
//! `shift_ir`, `write_dr`, `read_dr`, `jtag_execute`).
//!
//! ## Transport modes
//!
//! * **Bitbang**: every pin toggled under software control; works on all
//!   supported chips, any pin can carry any role.
//! * **MPSSE**: the engine generates the clocked bit streams; clock and
//!   data lines are fixed to DBUS0-2 and TMS to DBUS3, the remaining pins
//!   are freely assignable. Not available on the FT232R.
//!
//! The mode is selected once per session. Requesting MPSSE on a chip
//! without the engine fails with [`Error::UnsupportedMode`]; switching
//! modes requires tearing the session down and reopening it.
//!
//! ## Basic usage
//!
//! ```no_run
//! use ft2232_avr::{ChipModel, Ft2232Avr, JtagOp, PinRole, TransportMode};
//!
//! fn main() -> ft2232_avr::Result<()> {
//!     let mut dev = Ft2232Avr::open(
//!         ChipModel::Ft2232h,
//!         "Dual RS232-HS A",
//!         TransportMode::Mpsse,
//!         &[
//!             (PinRole::Tck, 0),
//!             (PinRole::Tdi, 1),
//!             (PinRole::Tdo, 2),
//!             (PinRole::Tms, 3),
//!             (PinRole::Reset, 4),
//!             (PinRole::LedPgm, 6),
//!         ],
//!     )?;
//!
//!     dev.tap_reset()?;
//!     println!("IDCODE: 0x{:08X}", dev.read_idcode()?);
//!
//!     dev.target_reset(true)?;
//!     dev.jtag_execute(JtagOp::EnterProgramming)?;
//!     // ... programming algorithm drives Program(...), PageLoad, PageRead ...
//!
//!     dev.teardown();
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency
//!
//! Everything is synchronous and blocking; a session is single-owner.
//! Timeouts and cancellation belong to the USB transport, and nothing here
//! retries a failed transfer.

mod consts;
mod error;
mod spi;

pub mod device;
pub mod jtag;
pub mod pins;
pub mod transport;

pub use device::{select_mode, ChipModel, Ft2232Avr, TransportMode};
pub use error::{Error, Result};
pub use jtag::{encode, Ir, JtagOp, ProgCommand};
pub use pins::{legal_pins, Pin, PinDirection, PinLevel, PinRole, PinSet, PinState};
pub use transport::Transport;

/// FTDI vendor ID, for callers enumerating devices themselves.
pub use consts::FTDI_VID;

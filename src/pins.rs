//! Pin roles, the per-mode pin descriptor tables, and the live pin state
//! register.
//!
//! Every signal the programmer drives or samples is a [`PinRole`] bound to a
//! physical pin of the FTDI chip. Which pins are legal for a role depends on
//! the transport mode: in bitbang mode any pin can carry any role, while the
//! MPSSE engine hard-wires its clock and data lines to DBUS0-3 and leaves
//! the remaining pins for freely assignable roles.

use crate::consts::{engine, MAX_PINS};
use crate::device::TransportMode;
use crate::error::{Error, Result};
use std::fmt;

/// Direction of a physical pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinDirection {
    Input,
    Output,
}

/// Logic level of a physical pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinLevel {
    Low,
    High,
}

/// A valid physical pin number (0-15).
/// Use `Pin::new(num)` to create; bit *i* of the pin registers is pin *i*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pin(u8);

impl Pin {
    /// Creates a new Pin, returning an error if the number is out of range (0-15).
    pub fn new(pin_num: u8) -> Result<Self> {
        if pin_num < MAX_PINS {
            Ok(Pin(pin_num))
        } else {
            Err(Error::PinOutOfRange { pin: pin_num })
        }
    }

    /// Returns the underlying pin number (0-15).
    #[inline]
    pub fn number(&self) -> u8 {
        self.0
    }

    /// Returns the bit mask (1 << number) for register operations.
    #[inline]
    pub fn mask(&self) -> u16 {
        1u16 << self.0
    }
}

/// Logical signal roles a physical pin can be bound to.
///
/// The SPI and JTAG signal roles are mandatory: each owns its pin
/// exclusively. Auxiliary roles (`Vcc`, `Buff`, `Busy`) and the indicator
/// roles share more freely; indicators are excluded from conflict
/// validation entirely and accumulate into the LED mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinRole {
    /// SPI clock output.
    Sck,
    /// SPI data out (host to target).
    Mosi,
    /// SPI data in (target to host). Input.
    Miso,
    /// Target reset, also the chip select of the ISP protocol.
    Reset,
    /// JTAG test clock output.
    Tck,
    /// JTAG test mode select output.
    Tms,
    /// JTAG test data out (host to target).
    Tdi,
    /// JTAG test data in (target to host). Input.
    Tdo,
    /// Target power switch.
    Vcc,
    /// Level-shifter / bus buffer enable.
    Buff,
    /// Target busy indicator. Input.
    Busy,
    /// Ready indicator LED.
    LedRdy,
    /// Error indicator LED.
    LedErr,
    /// Programming-in-progress indicator LED.
    LedPgm,
    /// Verify-in-progress indicator LED.
    LedVfy,
}

impl PinRole {
    /// All roles, in declaration order.
    pub const ALL: [PinRole; 15] = [
        PinRole::Sck,
        PinRole::Mosi,
        PinRole::Miso,
        PinRole::Reset,
        PinRole::Tck,
        PinRole::Tms,
        PinRole::Tdi,
        PinRole::Tdo,
        PinRole::Vcc,
        PinRole::Buff,
        PinRole::Busy,
        PinRole::LedRdy,
        PinRole::LedErr,
        PinRole::LedPgm,
        PinRole::LedVfy,
    ];

    pub(crate) fn index(self) -> usize {
        Self::ALL.iter().position(|&r| r == self).unwrap_or(0)
    }

    /// The direction a pin bound to this role must be configured with.
    pub fn direction(self) -> PinDirection {
        match self {
            PinRole::Miso | PinRole::Tdo | PinRole::Busy => PinDirection::Input,
            _ => PinDirection::Output,
        }
    }

    /// Whether the role owns its pin exclusively. A pin carrying a
    /// mandatory role rejects any second mandatory role.
    pub fn is_mandatory(self) -> bool {
        matches!(
            self,
            PinRole::Sck
                | PinRole::Mosi
                | PinRole::Miso
                | PinRole::Reset
                | PinRole::Tck
                | PinRole::Tms
                | PinRole::Tdi
                | PinRole::Tdo
        )
    }

    /// Whether the role is a status indicator (LED). Indicator pins are
    /// recorded in the LED mask and skip conflict validation.
    pub fn is_indicator(self) -> bool {
        matches!(
            self,
            PinRole::LedRdy | PinRole::LedErr | PinRole::LedPgm | PinRole::LedVfy
        )
    }
}

impl fmt::Display for PinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PinRole::Sck => "SCK",
            PinRole::Mosi => "MOSI",
            PinRole::Miso => "MISO",
            PinRole::Reset => "RESET",
            PinRole::Tck => "TCK",
            PinRole::Tms => "TMS",
            PinRole::Tdi => "TDI",
            PinRole::Tdo => "TDO",
            PinRole::Vcc => "VCC",
            PinRole::Buff => "BUFF",
            PinRole::Busy => "BUSY",
            PinRole::LedRdy => "RDY LED",
            PinRole::LedErr => "ERR LED",
            PinRole::LedPgm => "PGM LED",
            PinRole::LedVfy => "VFY LED",
        };
        f.write_str(name)
    }
}

/// A set of physical pins, one bit per pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinSet(u16);

impl PinSet {
    pub const EMPTY: PinSet = PinSet(0);
    pub const ALL: PinSet = PinSet(0xFFFF);

    pub const fn single(pin: u8) -> PinSet {
        PinSet(1 << pin)
    }

    pub const fn from_mask(mask: u16) -> PinSet {
        PinSet(mask)
    }

    pub fn contains(self, pin: u8) -> bool {
        pin < MAX_PINS && self.0 & (1 << pin) != 0
    }

    pub fn mask(self) -> u16 {
        self.0
    }
}

/// Pins the MPSSE engine leaves for software-assigned roles (DBUS3 and up).
const MPSSE_FREE: PinSet = PinSet::from_mask(!0x0007);

/// The pin descriptor table: which physical pins may carry `role` under
/// `mode`. Pure lookup over static data; the table itself is validated by
/// unit tests, not at runtime.
pub fn legal_pins(role: PinRole, mode: TransportMode) -> PinSet {
    match mode {
        TransportMode::Bitbang => PinSet::ALL,
        TransportMode::Mpsse => match role {
            PinRole::Sck | PinRole::Tck => PinSet::single(engine::CLOCK),
            PinRole::Mosi | PinRole::Tdi => PinSet::single(engine::DATA_OUT),
            PinRole::Miso | PinRole::Tdo => PinSet::single(engine::DATA_IN),
            PinRole::Tms => PinSet::single(engine::TMS_CS),
            _ => MPSSE_FREE,
        },
    }
}

/// The live pin state register: output values, directions, the LED mask and
/// the role assignment map.
///
/// `set` performs no validation against the direction mask; driving a pin
/// configured as an input is a caller logic error this register does not
/// detect. The electrical transition only happens when a snapshot is
/// written to the transport.
#[derive(Debug, Clone)]
pub struct PinState {
    value: u16,
    direction: u16,
    led_mask: u16,
    assigned: [Option<u8>; PinRole::ALL.len()],
}

impl Default for PinState {
    fn default() -> Self {
        Self::new()
    }
}

impl PinState {
    /// All pins low, all pins input, nothing bound.
    pub fn new() -> Self {
        Self {
            value: 0,
            direction: 0,
            led_mask: 0,
            assigned: [None; PinRole::ALL.len()],
        }
    }

    /// Binds `role` to `pin`, setting the pin's direction bit per the
    /// role's direction and leaving the output value untouched.
    ///
    /// Fails with `InvalidPin` when the pin is outside the descriptor
    /// table's legal set for the mode, or beyond the chip's pin limit.
    /// Fails with `PinConflict` when the pin already carries a different
    /// mandatory role; the existing binding is unaffected.
    pub fn bind(
        &mut self,
        role: PinRole,
        pin: Pin,
        mode: TransportMode,
        pin_limit: u8,
    ) -> Result<()> {
        if !legal_pins(role, mode).contains(pin.number()) {
            return Err(Error::InvalidPin {
                role,
                pin: pin.number(),
                mode,
                message: format!("legal pin mask is 0x{:04X}", legal_pins(role, mode).mask()),
            });
        }
        if pin.number() >= pin_limit {
            return Err(Error::InvalidPin {
                role,
                pin: pin.number(),
                mode,
                message: format!("chip has only {} pins", pin_limit),
            });
        }
        if !role.is_indicator() {
            for (&other, slot) in PinRole::ALL.iter().zip(self.assigned.iter()) {
                if *slot == Some(pin.number()) && other != role && other.is_mandatory() {
                    return Err(Error::PinConflict {
                        pin: pin.number(),
                        bound: other,
                        requested: role,
                    });
                }
            }
        }

        self.assigned[role.index()] = Some(pin.number());
        match role.direction() {
            PinDirection::Output => self.direction |= pin.mask(),
            PinDirection::Input => self.direction &= !pin.mask(),
        }
        if role.is_indicator() {
            self.led_mask |= pin.mask();
        }
        Ok(())
    }

    /// Sets or clears the output value bit for `pin`.
    pub fn set(&mut self, pin: Pin, level: PinLevel) {
        match level {
            PinLevel::High => self.value |= pin.mask(),
            PinLevel::Low => self.value &= !pin.mask(),
        }
    }

    /// Current output value bit for `pin`.
    pub fn level(&self, pin: Pin) -> PinLevel {
        if self.value & pin.mask() != 0 {
            PinLevel::High
        } else {
            PinLevel::Low
        }
    }

    /// Read-only export of `(pin_value, pin_direction)`, the pair sent to
    /// the transport on every pin write.
    pub fn snapshot(&self) -> (u16, u16) {
        (self.value, self.direction)
    }

    /// The pin currently bound to `role`, if any.
    pub fn pin_of(&self, role: PinRole) -> Option<Pin> {
        self.assigned[role.index()].map(Pin)
    }

    /// Bits reserved for status indicator pins.
    pub fn led_mask(&self) -> u16 {
        self.led_mask
    }
}

//! Internal constants: FTDI identifiers, MPSSE engine pin map, and MPSSE
//! command opcodes.

/// FTDI vendor ID.
pub const FTDI_VID: u16 = 0x0403;

/// Known FTDI product IDs for the supported chip variants.
pub mod pid {
    /// FT232AM, FT232BM, FT232R.
    pub const FT232: u16 = 0x6001;
    /// FT2232C/D/H.
    pub const FT2232: u16 = 0x6010;
    /// FT232H.
    pub const FT232H: u16 = 0x6014;
}

/// Widest pin register across the supported variants. `pin_value` and
/// `pin_direction` are 16 bits; smaller chips bound the usable range via
/// their pin limit.
pub const MAX_PINS: u8 = 16;

/// Pins the MPSSE engine claims for itself. Software-assigned roles draw
/// from the remaining bits.
pub mod engine {
    /// TCK/SK clock line, DBUS0.
    pub const CLOCK: u8 = 0;
    /// TDI/DO data-out line, DBUS1.
    pub const DATA_OUT: u8 = 1;
    /// TDO/DI data-in line, DBUS2.
    pub const DATA_IN: u8 = 2;
    /// TMS/CS line, DBUS3.
    pub const TMS_CS: u8 = 3;
}

// --- MPSSE command opcodes ---
// Shifting commands are composed by OR-ing the option bits together.
pub mod mpsse {
    /// Write TDI/DO on negative TCK/SK edge.
    pub const WRITE_NEG: u8 = 0x01;
    /// Transfer bits, not bytes.
    pub const BITMODE: u8 = 0x02;
    /// Sample TDO/DI on negative TCK/SK edge.
    #[allow(dead_code)] // Part of the command set; all shifts here sample on the positive edge
    pub const READ_NEG: u8 = 0x04;
    /// LSB first.
    pub const LSB: u8 = 0x08;
    /// Write TDI/DO.
    pub const DO_WRITE: u8 = 0x10;
    /// Read TDO/DI.
    pub const DO_READ: u8 = 0x20;
    /// Write TMS/CS.
    pub const WRITE_TMS: u8 = 0x40;

    /// Set data bits, low byte.
    pub const SET_BITS_LOW: u8 = 0x80;
    /// Set data bits, high byte.
    pub const SET_BITS_HIGH: u8 = 0x82;
    /// Flush the read FIFO back to the host immediately.
    pub const SEND_IMMEDIATE: u8 = 0x87;
}

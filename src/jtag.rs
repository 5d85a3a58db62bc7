//! JTAG programming interface of AVR targets: instruction-register opcodes,
//! programming sub-command opcodes, and the TAP shift primitives that drive
//! them over either transport mode.
//!
//! The higher-level programming algorithms (page sequencing, polling,
//! verification) sit above this crate; they compose the primitives here:
//! [`Ft2232Avr::shift_ir`], [`Ft2232Avr::write_dr`], [`Ft2232Avr::read_dr`]
//! and the [`encode`] table.

use crate::consts::mpsse;
use crate::device::{Ft2232Avr, TransportMode};
use crate::error::{Error, Result};
use crate::pins::{PinLevel, PinRole};
use log::trace;

/// The AVR JTAG instruction register is 4 bits wide.
const IR_BITS: usize = 4;

/// Instruction-register opcodes of the AVR programming TAP.
///
/// The 4-bit instruction space also contains the values 3, 8-11, 13 and 14,
/// which have no operation assigned; `Ir::try_from` rejects them rather
/// than inventing semantics.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ir {
    /// Drive boundary-scan cells onto the pins.
    Extest = 0,
    /// Select the 32-bit device identification register.
    Idcode = 1,
    /// Sample/preload the boundary-scan register.
    SamplePreload = 2,
    /// Enter or leave programming mode.
    ProgEnable = 4,
    /// Select the programming command register.
    ProgCommands = 5,
    /// Load a full flash/EEPROM page buffer.
    PageLoad = 6,
    /// Read back a full flash/EEPROM page.
    PageRead = 7,
    /// Hold the target in reset.
    AvrReset = 12,
    /// Idle; the TAP passes data straight through.
    Bypass = 15,
}

impl Ir {
    /// The raw 4-bit opcode.
    #[inline]
    pub fn opcode(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Ir {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Ir> {
        match raw {
            0 => Ok(Ir::Extest),
            1 => Ok(Ir::Idcode),
            2 => Ok(Ir::SamplePreload),
            4 => Ok(Ir::ProgEnable),
            5 => Ok(Ir::ProgCommands),
            6 => Ok(Ir::PageLoad),
            7 => Ok(Ir::PageRead),
            12 => Ok(Ir::AvrReset),
            15 => Ok(Ir::Bypass),
            other => Err(Error::UnsupportedOperation { ir: other }),
        }
    }
}

/// Programming sub-command opcodes, shifted through the data register while
/// the instruction register holds [`Ir::ProgCommands`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgCommand {
    None = 0x00,
    FlashRead = 0x02,
    EepromRead = 0x03,
    FuseRead = 0x04,
    /// Signature and calibration bytes.
    SigcalRead = 0x08,
    FlashWrite = 0x10,
    EepromWrite = 0x11,
    LockWrite = 0x20,
    FuseWrite = 0x40,
}

impl ProgCommand {
    /// The raw sub-command opcode.
    #[inline]
    pub fn opcode(self) -> u8 {
        self as u8
    }
}

/// Logical operations on the programming TAP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JtagOp {
    /// Assert the target's JTAG reset register.
    TargetReset,
    /// Read the 32-bit device identification code.
    ReadIdcode,
    /// Sample/preload the boundary-scan chain.
    SampleBoundary,
    /// Drive the boundary-scan chain onto the pins.
    ExtestBoundary,
    /// Enter programming mode.
    EnterProgramming,
    /// Issue a programming sub-command.
    Program(ProgCommand),
    /// Load a flash/EEPROM page buffer.
    PageLoad,
    /// Read back a flash/EEPROM page.
    PageRead,
    /// No target selected.
    Bypass,
}

/// Maps a logical operation to its instruction opcode and, where the
/// operation defines one, its data-register opcode.
///
/// Pure function: identical input always yields the identical pair.
pub fn encode(op: JtagOp) -> (Ir, Option<u8>) {
    match op {
        JtagOp::TargetReset => (Ir::AvrReset, None),
        JtagOp::ReadIdcode => (Ir::Idcode, None),
        JtagOp::SampleBoundary => (Ir::SamplePreload, None),
        JtagOp::ExtestBoundary => (Ir::Extest, None),
        JtagOp::EnterProgramming => (Ir::ProgEnable, Some(ProgCommand::None.opcode())),
        JtagOp::Program(cmd) => (Ir::ProgCommands, Some(cmd.opcode())),
        JtagOp::PageLoad => (Ir::PageLoad, None),
        JtagOp::PageRead => (Ir::PageRead, None),
        JtagOp::Bypass => (Ir::Bypass, None),
    }
}

/// Collects TDO samples into LSB-first bytes.
struct BitSink {
    bytes: Vec<u8>,
    bit: usize,
}

impl BitSink {
    fn new(bits: usize) -> Self {
        Self {
            bytes: vec![0u8; bits.div_ceil(8)],
            bit: 0,
        }
    }

    fn push_bits(&mut self, value: u8, count: usize) {
        for i in 0..count {
            if value >> i & 1 != 0 {
                self.bytes[self.bit / 8] |= 1 << (self.bit % 8);
            }
            self.bit += 1;
        }
    }
}

impl Ft2232Avr {
    /// Forces the TAP into Test-Logic-Reset (five TCK cycles with TMS
    /// high), then into Run-Test/Idle.
    pub fn tap_reset(&mut self) -> Result<()> {
        self.clock_tms(&[1, 1, 1, 1, 1, 0], false)
    }

    /// Shifts a 4-bit instruction into the instruction register and
    /// returns the TAP to Run-Test/Idle.
    pub fn shift_ir(&mut self, ir: Ir) -> Result<()> {
        trace!("{}: IR <- {:?} (0x{:X})", self.name(), ir, ir.opcode());
        self.clock_tms(&[1, 1, 0, 0], false)?;
        self.shift_bits(&[ir.opcode()], IR_BITS, false)?;
        self.clock_tms(&[1, 0], false)
    }

    /// Shifts `bits` bits of `data` (LSB first) into the data register and
    /// returns the TAP to Run-Test/Idle.
    pub fn write_dr(&mut self, data: &[u8], bits: usize) -> Result<()> {
        self.clock_tms(&[1, 0, 0], false)?;
        self.shift_bits(data, bits, false)?;
        self.clock_tms(&[1, 0], false)
    }

    /// Shifts `bits` zero bits through the data register, capturing what
    /// the target shifts out.
    pub fn read_dr(&mut self, bits: usize) -> Result<Vec<u8>> {
        self.exchange_dr(&vec![0u8; bits.div_ceil(8)], bits)
    }

    /// Shifts `bits` bits of `data` into the data register while capturing
    /// the bits the target shifts out.
    pub fn exchange_dr(&mut self, data: &[u8], bits: usize) -> Result<Vec<u8>> {
        self.clock_tms(&[1, 0, 0], false)?;
        let captured = self.shift_bits(data, bits, true)?;
        self.clock_tms(&[1, 0], false)?;
        Ok(captured.unwrap_or_default())
    }

    /// Encodes a logical operation and drives it: the instruction always,
    /// the data-register opcode when the operation defines one.
    pub fn jtag_execute(&mut self, op: JtagOp) -> Result<()> {
        let (ir, dr) = encode(op);
        self.shift_ir(ir)?;
        if let Some(dr) = dr {
            self.write_dr(&[dr], 8)?;
        }
        Ok(())
    }

    /// Puts the target in or out of reset through its JTAG reset register.
    pub fn target_reset(&mut self, assert: bool) -> Result<()> {
        self.shift_ir(Ir::AvrReset)?;
        self.write_dr(&[assert as u8], 1)
    }

    /// Reads the target's 32-bit identification code.
    pub fn read_idcode(&mut self) -> Result<u32> {
        self.shift_ir(Ir::Idcode)?;
        let bytes = self.read_dr(32)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Tracks the high byte (bits 16-23) of an extended 24-bit flash word
    /// address, for parts with flash beyond the directly addressable
    /// range. Returns the byte to latch when it differs from the cached
    /// one, `None` when the latch can be skipped.
    pub fn extended_address(&mut self, word_address: u32) -> Option<u8> {
        let hi = (word_address >> 16) as u8;
        if hi == self.lext_byte {
            None
        } else {
            self.lext_byte = hi;
            Some(hi)
        }
    }

    /// Clocks a TMS sequence through the TAP with TDI held at `tdi`.
    fn clock_tms(&mut self, tms_bits: &[u8], tdi: bool) -> Result<()> {
        match self.mode() {
            TransportMode::Mpsse => {
                let mut cmd = Vec::with_capacity(3 * tms_bits.len().div_ceil(7));
                for chunk in tms_bits.chunks(7) {
                    let mut packed = 0u8;
                    for (i, &bit) in chunk.iter().enumerate() {
                        if bit != 0 {
                            packed |= 1 << i;
                        }
                    }
                    if tdi {
                        packed |= 0x80;
                    }
                    cmd.push(mpsse::WRITE_TMS | mpsse::WRITE_NEG | mpsse::BITMODE | mpsse::LSB);
                    cmd.push((chunk.len() - 1) as u8);
                    cmd.push(packed);
                }
                let res = self.transport.write_bits(&cmd);
                self.check("TMS sequence write", res)?;
            }
            TransportMode::Bitbang => {
                let moves: Vec<(bool, bool)> =
                    tms_bits.iter().map(|&b| (tdi, b != 0)).collect();
                let frames = self.tap_frames(&moves)?;
                let res = self.transport.write_bits(&frames);
                self.check("TMS sequence write", res)?;
            }
        }
        Ok(())
    }

    /// Builds bitbang frames for a sequence of `(tdi, tms)` moves: two pin
    /// snapshots per TCK cycle, clock low then clock high.
    fn tap_frames(&mut self, moves: &[(bool, bool)]) -> Result<Vec<u8>> {
        let tck = self.role_pin(PinRole::Tck)?;
        let tdi = self.role_pin(PinRole::Tdi)?;
        let tms = self.role_pin(PinRole::Tms)?;
        let mut frames = Vec::with_capacity(moves.len() * 2);
        for &(tdi_bit, tms_bit) in moves {
            let tdi_level = if tdi_bit { PinLevel::High } else { PinLevel::Low };
            let tms_level = if tms_bit { PinLevel::High } else { PinLevel::Low };
            self.pins.set(tdi, tdi_level);
            self.pins.set(tms, tms_level);
            self.pins.set(tck, PinLevel::Low);
            frames.push(self.pins.snapshot().0 as u8);
            self.pins.set(tck, PinLevel::High);
            frames.push(self.pins.snapshot().0 as u8);
        }
        self.pins.set(tck, PinLevel::Low);
        Ok(frames)
    }

    /// Shifts `bits` bits of `data` (LSB first) while in Shift-IR or
    /// Shift-DR. The final bit is clocked with TMS high, leaving the TAP
    /// in Exit1. With `read` set, returns the captured TDO bits as
    /// LSB-first bytes.
    fn shift_bits(&mut self, data: &[u8], bits: usize, read: bool) -> Result<Option<Vec<u8>>> {
        if bits == 0 {
            return Ok(if read { Some(Vec::new()) } else { None });
        }
        if data.len() * 8 < bits {
            return Err(Error::BufferTooSmall {
                expected: bits.div_ceil(8),
                actual: data.len(),
            });
        }
        match self.mode() {
            TransportMode::Bitbang => self.shift_bits_bb(data, bits, read),
            TransportMode::Mpsse => self.shift_bits_mpsse(data, bits, read),
        }
    }

    fn shift_bits_bb(&mut self, data: &[u8], bits: usize, read: bool) -> Result<Option<Vec<u8>>> {
        let mut moves = Vec::with_capacity(bits);
        for i in 0..bits {
            let bit = data[i / 8] >> (i % 8) & 1 != 0;
            moves.push((bit, i == bits - 1));
        }
        let frames = self.tap_frames(&moves)?;
        if !read {
            let res = self.transport.write_bits(&frames);
            self.check("TAP shift", res)?;
            return Ok(None);
        }
        let tdo = self.role_pin(PinRole::Tdo)?;
        let mut echo = vec![0u8; frames.len()];
        let res = self.transport.exchange(&frames, &mut echo);
        self.check("TAP shift", res)?;
        let mut sink = BitSink::new(bits);
        // The chip samples the pins once per written byte; the sample for
        // the clock-high frame of each cycle carries the target's TDO.
        for pair in echo.chunks(2) {
            sink.push_bits(pair[1] >> tdo.number() & 1, 1);
        }
        Ok(Some(sink.bytes))
    }

    fn shift_bits_mpsse(
        &mut self,
        data: &[u8],
        bits: usize,
        read: bool,
    ) -> Result<Option<Vec<u8>>> {
        let shift = mpsse::DO_WRITE
            | mpsse::WRITE_NEG
            | mpsse::LSB
            | if read { mpsse::DO_READ } else { 0 };
        // All bits but the last shift normally; the last one goes out with
        // the TMS write that exits the shift state.
        let normal = bits - 1;
        let full_bytes = normal / 8;
        let rem_bits = normal % 8;

        let mut cmd = Vec::with_capacity(8 + full_bytes);
        if full_bytes > 0 {
            let len = (full_bytes - 1) as u16;
            cmd.push(shift);
            cmd.push(len as u8);
            cmd.push((len >> 8) as u8);
            cmd.extend_from_slice(&data[..full_bytes]);
        }
        if rem_bits > 0 {
            cmd.push(shift | mpsse::BITMODE);
            cmd.push((rem_bits - 1) as u8);
            cmd.push(data[full_bytes]);
        }
        let last_bit = data[(bits - 1) / 8] >> ((bits - 1) % 8) & 1;
        cmd.push(
            mpsse::WRITE_TMS
                | mpsse::WRITE_NEG
                | mpsse::BITMODE
                | mpsse::LSB
                | if read { mpsse::DO_READ } else { 0 },
        );
        cmd.push(0);
        cmd.push(0x01 | last_bit << 7);

        if !read {
            let res = self.transport.write_bits(&cmd);
            self.check("TAP shift", res)?;
            return Ok(None);
        }

        cmd.push(mpsse::SEND_IMMEDIATE);
        let mut rx = vec![0u8; full_bytes + usize::from(rem_bits > 0) + 1];
        let res = self.transport.exchange(&cmd, &mut rx);
        self.check("TAP shift", res)?;

        let mut sink = BitSink::new(bits);
        for &byte in &rx[..full_bytes] {
            sink.push_bits(byte, 8);
        }
        if rem_bits > 0 {
            // Partial-byte reads arrive MSB-aligned.
            sink.push_bits(rx[full_bytes] >> (8 - rem_bits), rem_bits);
        }
        sink.push_bits(rx[rx.len() - 1] >> 7, 1);
        Ok(Some(sink.bytes))
    }
}

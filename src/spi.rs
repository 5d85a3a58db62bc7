//! Full-duplex SPI exchange for the ISP protocol (mode 0, MSB first).
//!
//! Transfers are split into bursts no larger than the chip's receive FIFO:
//! an in-out transfer that requests more than the FIFO holds loses data, so
//! the burst size follows the variant the session was configured for.

use crate::consts::mpsse;
use crate::device::{Ft2232Avr, TransportMode};
use crate::error::{Error, Result};
use crate::pins::{PinLevel, PinRole};
use log::trace;

impl Ft2232Avr {
    /// Exchanges `tx` for `rx` over SPI, both the same length. Every byte
    /// clocked out returns one byte sampled from the target.
    pub fn spi_transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        if tx.len() != rx.len() {
            return Err(Error::BufferTooSmall {
                expected: tx.len(),
                actual: rx.len(),
            });
        }
        let burst = match self.mode() {
            // Two pin frames per bit, echoed byte for byte.
            TransportMode::Bitbang => (self.rx_buffer_size() / 16).max(1),
            TransportMode::Mpsse => self.rx_buffer_size(),
        };
        trace!(
            "{}: SPI transfer of {} bytes in bursts of {}",
            self.name(),
            tx.len(),
            burst
        );
        for (tx_chunk, rx_chunk) in tx.chunks(burst).zip(rx.chunks_mut(burst)) {
            match self.mode() {
                TransportMode::Bitbang => self.spi_burst_bb(tx_chunk, rx_chunk)?,
                TransportMode::Mpsse => self.spi_burst_mpsse(tx_chunk, rx_chunk)?,
            }
        }
        Ok(())
    }

    fn spi_burst_bb(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        let sck = self.role_pin(PinRole::Sck)?;
        let mosi = self.role_pin(PinRole::Mosi)?;
        let miso = self.role_pin(PinRole::Miso)?;

        // Mode 0: data is presented while SCK is low and sampled by the
        // target on the rising edge, MSB first.
        let mut frames = Vec::with_capacity(tx.len() * 16);
        for &byte in tx {
            for bit in (0..8).rev() {
                let level = if byte >> bit & 1 != 0 {
                    PinLevel::High
                } else {
                    PinLevel::Low
                };
                self.pins.set(mosi, level);
                self.pins.set(sck, PinLevel::Low);
                frames.push(self.pins.snapshot().0 as u8);
                self.pins.set(sck, PinLevel::High);
                frames.push(self.pins.snapshot().0 as u8);
            }
        }
        self.pins.set(sck, PinLevel::Low);

        let mut echo = vec![0u8; frames.len()];
        let res = self.transport.exchange(&frames, &mut echo);
        self.check("SPI transfer", res)?;

        for (i, out) in rx.iter_mut().enumerate() {
            let mut byte = 0u8;
            for bit in 0..8 {
                let sample = echo[i * 16 + bit * 2 + 1];
                byte = byte << 1 | (sample >> miso.number() & 1);
            }
            *out = byte;
        }
        Ok(())
    }

    fn spi_burst_mpsse(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        let len = (tx.len() - 1) as u16;
        let mut cmd = Vec::with_capacity(4 + tx.len());
        cmd.push(mpsse::DO_WRITE | mpsse::DO_READ | mpsse::WRITE_NEG);
        cmd.push(len as u8);
        cmd.push((len >> 8) as u8);
        cmd.extend_from_slice(tx);
        cmd.push(mpsse::SEND_IMMEDIATE);
        let res = self.transport.exchange(&cmd, rx);
        self.check("SPI transfer", res)
    }
}

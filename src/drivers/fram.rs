//! MB85RC04 I²C FRAM driver (512 bytes).
//!
//! The chip takes a single 8-bit word address.  Memory bit A8 travels in
//! bit 0 of the device address, so the part answers on two consecutive bus
//! addresses, one per 256-byte half.  Transfers are split at the half
//! boundary so every transaction targets one device address.
//!
//! FRAM has no page buffer or write cycle to poll; the ledger's settle delay
//! covers bus and level-shifter latency only.
//!
//! Generic over `embedded_hal::i2c::I2c`, so the same driver runs on the
//! ESP-IDF I²C peripheral and on a mock bus in tests.

use embedded_hal::i2c::I2c;
use heapless::Vec;

use crate::app::ports::NvStore;
use crate::error::StoreError;

/// 7-bit bus address with A1–A2 strapped low (lower half of memory).
pub const DEFAULT_ADDRESS: u8 = 0x50;
/// Device capacity in bytes.
pub const CAPACITY: usize = 512;
/// Bytes addressable through one device address.
const HALF: usize = 256;
/// Largest data payload sent in one bus transaction.
const CHUNK: usize = 32;

pub struct Mb85rc04<I> {
    i2c: I,
    address: u8,
}

impl<I: I2c> Mb85rc04<I> {
    pub fn new(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }

    fn check_range(address: u16, len: usize) -> Result<(), StoreError> {
        if address as usize + len > CAPACITY {
            return Err(StoreError::AddressOutOfRange { address, len });
        }
        Ok(())
    }

    /// Bus address and word address for memory location `mem`.
    fn target(&self, mem: usize) -> (u8, u8) {
        let a8 = ((mem >> 8) & 1) as u8;
        (self.address | a8, (mem & 0xFF) as u8)
    }

    /// Bytes from `mem` up to the end of its half, capped at `max`.
    fn span(mem: usize, max: usize) -> usize {
        (HALF - mem % HALF).min(max)
    }
}

impl<I: I2c> NvStore for Mb85rc04<I> {
    fn probe(&mut self) -> Result<(), StoreError> {
        let mut byte = [0u8; 1];
        self.i2c
            .write_read(self.address, &[0], &mut byte)
            .map_err(|_| StoreError::NotResponding)
    }

    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), StoreError> {
        Self::check_range(address, buf.len())?;
        let mut mem = address as usize;
        let mut rest = buf;
        while !rest.is_empty() {
            let n = Self::span(mem, rest.len());
            let (part, tail) = core::mem::take(&mut rest).split_at_mut(n);
            let (device, word) = self.target(mem);
            self.i2c
                .write_read(device, &[word], part)
                .map_err(|_| StoreError::Bus)?;
            mem += n;
            rest = tail;
        }
        Ok(())
    }

    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), StoreError> {
        Self::check_range(address, data.len())?;
        let mut mem = address as usize;
        let mut rest = data;
        while !rest.is_empty() {
            let (chunk, tail) = rest.split_at(Self::span(mem, rest.len().min(CHUNK)));
            let (device, word) = self.target(mem);
            let mut frame: Vec<u8, { CHUNK + 1 }> = Vec::new();
            // Capacity is CHUNK + 1, so neither push can overflow.
            frame.push(word).map_err(|_| StoreError::Bus)?;
            frame.extend_from_slice(chunk).map_err(|_| StoreError::Bus)?;
            self.i2c
                .write(device, &frame)
                .map_err(|_| StoreError::Bus)?;
            mem += chunk.len();
            rest = tail;
        }
        Ok(())
    }
}

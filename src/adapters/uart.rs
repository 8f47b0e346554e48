//! UART frame source for the PMS particulate sensor.
//!
//! Hunts for the two magic bytes, then reads the rest of the 32-byte frame.
//! Validation is left to [`decode_frame`](crate::sensors::pms::decode_frame).

use esp_idf_hal::delay::TickType;
use esp_idf_hal::uart::UartDriver;

use crate::app::ports::FrameSource;
use crate::error::SensorError;
use crate::sensors::pms::{FRAME_LEN, FRAME_MAGIC};

/// Per-read timeout.  At 9600 baud a full frame takes ~33 ms.
const READ_TIMEOUT_MS: u64 = 50;
/// Bytes scanned for the magic before giving up on this attempt.
const SYNC_BUDGET: usize = FRAME_LEN * 2;

pub struct UartFrameSource<'d> {
    uart: UartDriver<'d>,
}

impl<'d> UartFrameSource<'d> {
    pub fn new(uart: UartDriver<'d>) -> Self {
        Self { uart }
    }

    fn read_byte(&mut self, timeout: u32) -> Result<u8, SensorError> {
        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte, timeout) {
            Ok(1) => Ok(byte[0]),
            Ok(_) => Err(SensorError::NoData),
            Err(_) => Err(SensorError::ReadFailed),
        }
    }
}

impl FrameSource for UartFrameSource<'_> {
    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize, SensorError> {
        if buf.len() < FRAME_LEN {
            return Err(SensorError::ReadFailed);
        }
        let timeout = TickType::new_millis(READ_TIMEOUT_MS).ticks();

        let mut prev = self.read_byte(timeout)?;
        let mut synced = false;
        for _ in 0..SYNC_BUDGET {
            let b = self.read_byte(timeout)?;
            if [prev, b] == FRAME_MAGIC {
                synced = true;
                break;
            }
            prev = b;
        }
        if !synced {
            return Err(SensorError::NoData);
        }

        buf[..2].copy_from_slice(&FRAME_MAGIC);
        let mut filled = 2;
        while filled < FRAME_LEN {
            let n = self
                .uart
                .read(&mut buf[filled..FRAME_LEN], timeout)
                .map_err(|_| SensorError::ReadFailed)?;
            if n == 0 {
                return Err(SensorError::NoData);
            }
            filled += n;
        }
        Ok(FRAME_LEN)
    }
}

//! PMS-series particulate sensor frame decoder.
//!
//! ## Frame layout (32 bytes, big-endian fields)
//!
//! | Offset | Field                                   |
//! |--------|-----------------------------------------|
//! | 0..2   | magic `0x42 0x4D`                       |
//! | 2..4   | frame length (28)                       |
//! | 4..10  | CF=1 standard-particle concentrations   |
//! | 10..12 | PM1.0  atmospheric, µg/m³               |
//! | 12..14 | PM2.5  atmospheric, µg/m³               |
//! | 14..16 | PM10   atmospheric, µg/m³               |
//! | 16..30 | particle counts, reserved               |
//! | 30..32 | checksum = sum of bytes 0..30           |
//!
//! Invalid or short frames are dropped silently; no reading is ever
//! fabricated.

use log::debug;

use crate::app::ports::{FrameSource, SensorPort};

pub const FRAME_LEN: usize = 32;
pub const FRAME_MAGIC: [u8; 2] = [0x42, 0x4D];

const PM1_OFFSET: usize = 10;
const PM25_OFFSET: usize = 12;
const PM10_OFFSET: usize = 14;
const CHECKSUM_OFFSET: usize = 30;

/// One decoded measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReading {
    pub pm1: u16,
    pub pm25: u16,
    pub pm10: u16,
    /// Uptime at which the frame was decoded.
    pub read_at_ms: u32,
}

impl SensorReading {
    /// `true` if this reading is older than `stale_after_ms`.
    pub fn is_stale(&self, now_ms: u32, stale_after_ms: u32) -> bool {
        now_ms.wrapping_sub(self.read_at_ms) > stale_after_ms
    }
}

fn be_u16(frame: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([frame[offset], frame[offset + 1]])
}

/// Decode one frame.  Returns `None` unless the frame is exactly
/// [`FRAME_LEN`] bytes, starts with [`FRAME_MAGIC`], and (optionally)
/// carries a matching checksum.
pub fn decode_frame(frame: &[u8], verify_checksum: bool, now_ms: u32) -> Option<SensorReading> {
    if frame.len() != FRAME_LEN || frame[..2] != FRAME_MAGIC {
        return None;
    }
    if verify_checksum {
        let sum = frame[..CHECKSUM_OFFSET]
            .iter()
            .fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b)));
        if sum != be_u16(frame, CHECKSUM_OFFSET) {
            return None;
        }
    }
    Some(SensorReading {
        pm1: be_u16(frame, PM1_OFFSET),
        pm25: be_u16(frame, PM25_OFFSET),
        pm10: be_u16(frame, PM10_OFFSET),
        read_at_ms: now_ms,
    })
}

/// Bounded-retry reader over a [`FrameSource`].
pub struct SensorFrameReader<F> {
    source: F,
    attempts: u8,
    verify_checksum: bool,
}

impl<F: FrameSource> SensorFrameReader<F> {
    pub fn new(source: F, attempts: u8, verify_checksum: bool) -> Self {
        Self {
            source,
            attempts: attempts.max(1),
            verify_checksum,
        }
    }

    pub fn source_mut(&mut self) -> &mut F {
        &mut self.source
    }

    /// One polling cycle: up to `attempts` frame reads, first valid wins.
    pub fn read(&mut self, now_ms: u32) -> Option<SensorReading> {
        let mut buf = [0u8; FRAME_LEN];
        for attempt in 1..=self.attempts {
            match self.source.read_frame(&mut buf) {
                Ok(n) => {
                    if let Some(reading) =
                        decode_frame(&buf[..n.min(FRAME_LEN)], self.verify_checksum, now_ms)
                    {
                        return Some(reading);
                    }
                    debug!("PMS: invalid frame ({} bytes), attempt {}", n, attempt);
                }
                Err(e) => debug!("PMS: {} on attempt {}", e, attempt),
            }
        }
        None
    }
}

impl<F: FrameSource> SensorPort for SensorFrameReader<F> {
    fn read_particulates(&mut self, now_ms: u32) -> Option<SensorReading> {
        self.read(now_ms)
    }
}

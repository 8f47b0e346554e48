//! Nonvolatile filter-usage ledger.
//!
//! A single little-endian IEEE-754 `f32` at address 0 of an [`NvStore`].
//! Every write is a full overwrite followed by a settle delay and a
//! read-back; the write only succeeds if the read-back matches within
//! [`VERIFY_TOLERANCE`].  Writes take `&mut self`, so they can never
//! overlap.
//!
//! Values outside `[0, 100]` (including NaN) found on read are treated as
//! corruption: the ledger reports 0.0 and rewrites the cell.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::app::ports::{NvStore, UsageLedger};
use crate::control::usage::USAGE_MAX_PERCENT;
use crate::error::StoreError;

/// Base address of the usage cell.
pub const LEDGER_ADDRESS: u16 = 0;
/// Maximum accepted difference between written and read-back value.
pub const VERIFY_TOLERANCE: f32 = 0.01;

fn in_range(value: f32) -> bool {
    (0.0..=USAGE_MAX_PERCENT).contains(&value)
}

fn clamp_usage(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, USAGE_MAX_PERCENT)
    }
}

/// Verified single-cell store for the filter-usage percentage.
pub struct NonvolatileLedger<S, D> {
    store: S,
    delay: D,
    settle_ms: u32,
}

impl<S: NvStore, D: DelayNs> NonvolatileLedger<S, D> {
    /// Probe the store and wrap it.  A store that does not answer is an
    /// error; the caller treats that as fatal at boot.
    pub fn open(mut store: S, delay: D, settle_ms: u32) -> Result<Self, StoreError> {
        store.probe()?;
        info!("Ledger: store online, settle {} ms", settle_ms);
        Ok(Self {
            store,
            delay,
            settle_ms,
        })
    }

    fn read_raw(&mut self) -> Result<f32, StoreError> {
        let mut bytes = [0u8; 4];
        self.store.read(LEDGER_ADDRESS, &mut bytes)?;
        Ok(f32::from_le_bytes(bytes))
    }

    /// Rewrite the cell to 0.0 after a failed or corrupt read.
    fn correct(&mut self) -> f32 {
        if let Err(e) = self.write(0.0) {
            warn!("Ledger: corrective write failed: {}", e);
        }
        0.0
    }

    /// Give back the underlying store (tests and shutdown).
    pub fn release(self) -> (S, D) {
        (self.store, self.delay)
    }
}

impl<S: NvStore, D: DelayNs> UsageLedger for NonvolatileLedger<S, D> {
    fn read(&mut self) -> f32 {
        match self.read_raw() {
            Ok(value) if in_range(value) => value,
            Ok(value) => {
                warn!("Ledger: stored value {} out of range, resetting", value);
                self.correct()
            }
            Err(e) => {
                warn!("Ledger: read failed ({}), resetting", e);
                self.correct()
            }
        }
    }

    fn write(&mut self, percent: f32) -> Result<(), StoreError> {
        let written = clamp_usage(percent);
        self.store
            .write(LEDGER_ADDRESS, &written.to_le_bytes())?;
        self.delay.delay_ms(self.settle_ms);

        let readback = self.read_raw()?;
        if (written - readback).abs() < VERIFY_TOLERANCE {
            Ok(())
        } else {
            Err(StoreError::VerificationFailed { written, readback })
        }
    }
}

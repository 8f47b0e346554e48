//! Front-panel digital inputs: touch pad, reset button, filter microswitch.
//!
//! Each signal has its own electrical polarity (touch module drives HIGH when
//! touched; the reset button and filter switch pull to ground).  This module
//! owns the pins and converts raw levels into logical "active" booleans so the
//! domain never sees electrical polarity.
//!
//! A failed pin read is reported as inactive.  For the filter switch that
//! means "absent".

use embedded_hal::digital::InputPin;
use log::warn;

use crate::app::ports::{InputPort, RawInputs};

/// Electrical level that means "asserted".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    /// Convert a raw pin level into the logical asserted state.
    pub fn is_active(self, level_high: bool) -> bool {
        match self {
            Self::ActiveHigh => level_high,
            Self::ActiveLow => !level_high,
        }
    }
}

/// One polarity-aware input pin.
pub struct PanelInput<P> {
    pin: P,
    polarity: Polarity,
    name: &'static str,
}

impl<P: InputPin> PanelInput<P> {
    pub fn new(pin: P, polarity: Polarity, name: &'static str) -> Self {
        Self {
            pin,
            polarity,
            name,
        }
    }

    /// Logical state of the input; read failures count as inactive.
    pub fn is_active(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(high) => self.polarity.is_active(high),
            Err(_) => {
                warn!("{}: pin read failed, treating as inactive", self.name);
                false
            }
        }
    }
}

/// All three panel inputs, sampled together once per tick.
pub struct PanelInputs<T, R, F> {
    touch: PanelInput<T>,
    reset: PanelInput<R>,
    filter: PanelInput<F>,
}

impl<T: InputPin, R: InputPin, F: InputPin> PanelInputs<T, R, F> {
    pub fn new(touch: PanelInput<T>, reset: PanelInput<R>, filter: PanelInput<F>) -> Self {
        Self {
            touch,
            reset,
            filter,
        }
    }

    pub fn sample(&mut self) -> RawInputs {
        RawInputs {
            touch_active: self.touch.is_active(),
            reset_active: self.reset.is_active(),
            filter_present: self.filter.is_active(),
        }
    }
}

impl<T: InputPin, R: InputPin, F: InputPin> InputPort for PanelInputs<T, R, F> {
    fn read_inputs(&mut self) -> RawInputs {
        self.sample()
    }
}

//! Active buzzer on a GPIO, HIGH = sounding.
//!
//! Beeps block for their duration; the longest pattern (filter full) is
//! about 1.2 s and only plays once per filter-full event.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::{BeepPattern, BuzzerPort};

pub struct Buzzer<P, D> {
    pin: P,
    delay: D,
}

impl<P: OutputPin, D: DelayNs> Buzzer<P, D> {
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }
}

impl<P: OutputPin, D: DelayNs> BuzzerPort for Buzzer<P, D> {
    fn beep(&mut self, duration_ms: u32) {
        if self.pin.set_high().is_err() {
            warn!("Buzzer: GPIO write failed");
            return;
        }
        self.delay.delay_ms(duration_ms);
        if self.pin.set_low().is_err() {
            warn!("Buzzer: GPIO write failed, buzzer may be stuck on");
        }
    }

    fn play(&mut self, pattern: BeepPattern) {
        for i in 0..pattern.count {
            if i > 0 {
                self.delay.delay_ms(pattern.gap_ms);
            }
            self.beep(pattern.duration_ms);
        }
    }
}

//! Monotonic millisecond clock.
//!
//! - **`espidf`** — wraps `esp_timer_get_time()` from the ESP-IDF
//!   high-resolution timer (microsecond precision, monotonic).
//! - **host** — uses `std::time::Instant` for tests and simulation.
//!
//! The control loop works in wrapping `u32` milliseconds; every consumer
//! compares times with `wrapping_sub`, so the ~49-day rollover is benign.

/// Uptime source for the control loop.
pub struct MonotonicClock {
    #[cfg(not(feature = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(feature = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot, wrapping at `u32::MAX`.
    #[cfg(feature = "espidf")]
    pub fn uptime_ms(&self) -> u32 {
        let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
        (us / 1_000) as u32
    }

    /// Milliseconds since creation, wrapping at `u32::MAX`.
    #[cfg(not(feature = "espidf"))]
    pub fn uptime_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}

#[cfg(all(test, not(feature = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn uptime_is_monotonic() {
        let clock = MonotonicClock::new();
        let a = clock.uptime_ms();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = clock.uptime_ms();
        assert!(b.wrapping_sub(a) >= 5);
    }
}

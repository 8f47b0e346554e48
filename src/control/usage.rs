//! Filter wear accounting.
//!
//! Wear accrues once per accrual interval while the fan runs with a filter
//! seated and the device awake.  The rate is a step function of fan speed:
//!
//! | Speed        | Wear       |
//! |--------------|------------|
//! | 0            | 0 %/s      |
//! | 1–44 %       | 0.5 %/s    |
//! | 45–64 %      | 1.0 %/s    |
//! | ≥ 65 %       | 1.5 %/s    |
//!
//! With the default mode speeds that is Low 0.5, Medium 1.0, High 1.5.
//! Usage saturates at 100 %.

use serde::Serialize;

pub const USAGE_MAX_PERCENT: f32 = 100.0;

/// Filter status banding for the status screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FilterBand {
    Normal,
    Warning,
    Full,
}

impl FilterBand {
    /// `Full` at 100 %, `Warning` from `warning_at`, else `Normal`.
    pub fn from_percent(percent: f32, warning_at: f32) -> Self {
        if percent >= USAGE_MAX_PERCENT {
            Self::Full
        } else if percent >= warning_at {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

/// Wear rate in percent per second for a fan speed.
pub fn wear_rate_per_sec(speed_percent: u8) -> f32 {
    match speed_percent {
        0 => 0.0,
        1..=44 => 0.5,
        45..=64 => 1.0,
        _ => 1.5,
    }
}

/// Advances the usage figure by one accrual interval at a time.
#[derive(Debug, Clone, Copy)]
pub struct FilterUsageAccumulator {
    interval_secs: f32,
}

impl FilterUsageAccumulator {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_secs: interval_ms as f32 / 1000.0,
        }
    }

    /// Usage after one interval at `speed_percent`, capped at 100.
    pub fn accrue(&self, usage: f32, speed_percent: u8) -> f32 {
        (usage + wear_rate_per_sec(speed_percent) * self.interval_secs).min(USAGE_MAX_PERCENT)
    }
}

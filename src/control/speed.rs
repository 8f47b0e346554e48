//! Fan speed policy: fixed mode targets and Automatic PM2.5 banding.
//!
//! | Mode       | Target                                  |
//! |------------|-----------------------------------------|
//! | Low        | `low_speed_percent` (40)                |
//! | Medium     | `medium_speed_percent` (55)             |
//! | High       | `high_speed_percent` (75)               |
//! | Automatic  | PM2.5 ≤ 35 → Low, ≤ 150 → Medium, else High |
//!
//! Automatic with no reading ever received runs in the Low band.

use serde::Serialize;

use crate::config::SystemConfig;
use crate::sensors::pms::SensorReading;

/// User-selectable fan policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Mode {
    Low,
    Medium,
    High,
    Automatic,
}

impl Mode {
    /// Next mode in the touch-tap cycle.
    pub fn next(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High => Self::Automatic,
            Self::Automatic => Self::Low,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Automatic => "auto",
        }
    }
}

/// PM2.5 band, also used to colour the readout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AirQuality {
    Good,
    Moderate,
    Poor,
}

/// Speed targets and band thresholds, lifted out of [`SystemConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedPolicy {
    pub low_percent: u8,
    pub medium_percent: u8,
    pub high_percent: u8,
    pub good_max: u16,
    pub moderate_max: u16,
}

impl SpeedPolicy {
    pub fn from_config(cfg: &SystemConfig) -> Self {
        Self {
            low_percent: cfg.low_speed_percent,
            medium_percent: cfg.medium_speed_percent,
            high_percent: cfg.high_speed_percent,
            good_max: cfg.pm25_good_max,
            moderate_max: cfg.pm25_moderate_max,
        }
    }

    pub fn air_quality(&self, pm25: u16) -> AirQuality {
        if pm25 <= self.good_max {
            AirQuality::Good
        } else if pm25 <= self.moderate_max {
            AirQuality::Moderate
        } else {
            AirQuality::Poor
        }
    }

    /// Target fan speed for `mode` given the latest reading.
    pub fn target_speed(&self, mode: Mode, reading: Option<&SensorReading>) -> u8 {
        match mode {
            Mode::Low => self.low_percent,
            Mode::Medium => self.medium_percent,
            Mode::High => self.high_percent,
            Mode::Automatic => match reading.map(|r| self.air_quality(r.pm25)) {
                None | Some(AirQuality::Good) => self.low_percent,
                Some(AirQuality::Moderate) => self.medium_percent,
                Some(AirQuality::Poor) => self.high_percent,
            },
        }
    }
}

//! System configuration parameters
//!
//! All tunable parameters for the Atomu purifier: input timing, fan speeds,
//! air-quality bands, dwell times, and ledger policy.  Defaults match the
//! shipped appliance; overrides can be loaded from JSON at boot.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
    /// Particulate sensor poll interval (milliseconds)
    pub sensor_poll_interval_ms: u32,
    /// A reading older than this is reported as stale (milliseconds)
    pub sensor_stale_after_ms: u32,
    /// Frame read attempts per poll before giving up for the cycle
    pub sensor_read_attempts: u8,
    /// Require a valid trailing checksum on sensor frames
    pub sensor_verify_checksum: bool,
    /// Telemetry report interval (seconds)
    pub telemetry_interval_secs: u32,

    // --- Inputs ---
    /// Transitions closer than this to the last accepted one are ignored
    pub debounce_window_ms: u32,
    /// A press released before this counts as a tap
    pub tap_max_ms: u32,
    /// Touch pad hold threshold (sleep / wake)
    pub touch_hold_ms: u32,
    /// Reset button hold threshold (filter reset)
    pub reset_hold_ms: u32,

    // --- Fan ---
    /// Target speed in Low mode (0-100%)
    pub low_speed_percent: u8,
    /// Target speed in Medium mode (0-100%)
    pub medium_speed_percent: u8,
    /// Target speed in High mode (0-100%)
    pub high_speed_percent: u8,

    // --- Air quality (PM2.5, µg/m³) ---
    /// Upper bound of the "good" band
    pub pm25_good_max: u16,
    /// Upper bound of the "moderate" band
    pub pm25_moderate_max: u16,
    /// Minimum change before the PM2.5 readout is redrawn
    pub pm25_redraw_delta: u16,

    // --- Screens ---
    /// How long the filter status screen stays up (milliseconds)
    pub filter_check_dwell_ms: u32,
    /// How long the reset confirmation stays up (milliseconds)
    pub filter_reset_dwell_ms: u32,
    /// Mode selection locks in after this long without a tap (milliseconds)
    pub mode_select_timeout_ms: u32,

    // --- Filter ledger ---
    /// Usage at or above this shows the warning banner (0-100%)
    pub filter_warning_percent: f32,
    /// Usage accrual interval while the fan runs (milliseconds)
    pub usage_accrual_interval_ms: u32,
    /// Delay between a ledger write and its verification read (milliseconds)
    pub ledger_settle_ms: u32,
    /// Write attempts before the ledger is flagged degraded
    pub ledger_write_attempts: u8,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Timing
            control_loop_interval_ms: 10,  // 100 Hz
            sensor_poll_interval_ms: 500,  // 2 Hz
            sensor_stale_after_ms: 5_000,
            sensor_read_attempts: 5,
            sensor_verify_checksum: false,
            telemetry_interval_secs: 60,   // 1/min

            // Inputs
            debounce_window_ms: 200,
            tap_max_ms: 1_000,
            touch_hold_ms: 2_000,
            reset_hold_ms: 3_000,

            // Fan
            low_speed_percent: 40,
            medium_speed_percent: 55,
            high_speed_percent: 75,

            // Air quality
            pm25_good_max: 35,
            pm25_moderate_max: 150,
            pm25_redraw_delta: 2,

            // Screens
            filter_check_dwell_ms: 3_000,
            filter_reset_dwell_ms: 3_000,
            mode_select_timeout_ms: 3_000,

            // Filter ledger
            filter_warning_percent: 85.0,
            usage_accrual_interval_ms: 1_000,
            ledger_settle_ms: 10,
            ledger_write_attempts: 3,
        }
    }
}

/// Errors from [`SystemConfig`] loading and validation.
#[derive(Debug)]
pub enum ConfigError {
    /// The override document could not be parsed.
    Malformed,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "config malformed"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl SystemConfig {
    /// Parse a JSON override document.  Missing fields take their defaults;
    /// the result is validated before it is returned.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|_| ConfigError::Malformed)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.control_loop_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "control_loop_interval_ms must be 1–100",
            ));
        }
        if self.sensor_poll_interval_ms < self.control_loop_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "sensor_poll_interval_ms must be >= control_loop_interval_ms",
            ));
        }
        if self.sensor_stale_after_ms < self.sensor_poll_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "sensor_stale_after_ms must be >= sensor_poll_interval_ms",
            ));
        }
        if !(1..=20).contains(&self.sensor_read_attempts) {
            return Err(ConfigError::ValidationFailed(
                "sensor_read_attempts must be 1–20",
            ));
        }
        if !(5..=3600).contains(&self.telemetry_interval_secs) {
            return Err(ConfigError::ValidationFailed(
                "telemetry_interval_secs must be 5–3600",
            ));
        }
        if self.debounce_window_ms >= self.tap_max_ms {
            return Err(ConfigError::ValidationFailed(
                "debounce_window_ms must be < tap_max_ms",
            ));
        }
        if self.touch_hold_ms < self.tap_max_ms || self.reset_hold_ms < self.tap_max_ms {
            return Err(ConfigError::ValidationFailed(
                "hold thresholds must be >= tap_max_ms",
            ));
        }
        for speed in [
            self.low_speed_percent,
            self.medium_speed_percent,
            self.high_speed_percent,
        ] {
            if !(1..=100).contains(&speed) {
                return Err(ConfigError::ValidationFailed(
                    "mode speeds must be 1–100",
                ));
            }
        }
        if self.pm25_good_max >= self.pm25_moderate_max {
            return Err(ConfigError::ValidationFailed(
                "pm25_good_max must be < pm25_moderate_max",
            ));
        }
        if !(1.0..100.0).contains(&self.filter_warning_percent) {
            return Err(ConfigError::ValidationFailed(
                "filter_warning_percent must be 1.0–99.9",
            ));
        }
        if !(100..=60_000).contains(&self.usage_accrual_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "usage_accrual_interval_ms must be 100–60000",
            ));
        }
        if self.ledger_settle_ms > 1_000 {
            return Err(ConfigError::ValidationFailed(
                "ledger_settle_ms must be <= 1000",
            ));
        }
        if !(1..=10).contains(&self.ledger_write_attempts) {
            return Err(ConfigError::ValidationFailed(
                "ledger_write_attempts must be 1–10",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = SystemConfig::default();
        assert!(c.validate().is_ok());
        assert!(c.low_speed_percent < c.medium_speed_percent);
        assert!(c.medium_speed_percent < c.high_speed_percent);
        assert!(c.tap_max_ms < c.touch_hold_ms);
        assert!(c.touch_hold_ms < c.reset_hold_ms);
    }

    #[test]
    fn timing_ratios_make_sense() {
        let c = SystemConfig::default();
        assert!(
            c.control_loop_interval_ms < c.debounce_window_ms,
            "loop must sample faster than the debounce window"
        );
        assert!(
            c.sensor_poll_interval_ms < c.usage_accrual_interval_ms,
            "sensor should be polled more often than usage accrues"
        );
    }

    #[test]
    fn rejects_zero_speed() {
        let cfg = SystemConfig {
            low_speed_percent: 0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn rejects_inverted_air_bands() {
        let cfg = SystemConfig {
            pm25_good_max: 200,
            pm25_moderate_max: 150,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn rejects_debounce_longer_than_tap() {
        let cfg = SystemConfig {
            debounce_window_ms: 1_500,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn json_overrides_merge_with_defaults() {
        let cfg = SystemConfig::from_json(r#"{"high_speed_percent": 90}"#).unwrap();
        assert_eq!(cfg.high_speed_percent, 90);
        assert_eq!(cfg.low_speed_percent, SystemConfig::default().low_speed_percent);
    }

    #[test]
    fn json_override_is_validated() {
        assert!(matches!(
            SystemConfig::from_json(r#"{"ledger_write_attempts": 0}"#),
            Err(ConfigError::ValidationFailed(_))
        ));
        assert!(matches!(
            SystemConfig::from_json("not json"),
            Err(ConfigError::Malformed)
        ));
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: SystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c.reset_hold_ms, c2.reset_hold_ms);
        assert!((c.filter_warning_percent - c2.filter_warning_percent).abs() < 0.001);
    }
}

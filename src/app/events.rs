//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use serde::Serialize;

use crate::control::speed::Mode;
use crate::error::StoreError;
use crate::fsm::DeviceState;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(DeviceState),

    /// The FSM transitioned between states.
    StateChanged { from: DeviceState, to: DeviceState },

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// Filter usage reached 100 %.
    FilterFull { percent: f32 },

    /// Filter usage was cleared by the reset gesture.
    FilterReset,

    /// Every write attempt for one persist failed; the in-memory value
    /// stays authoritative until a later write succeeds.
    LedgerDegraded { attempts: u8, error: StoreError },

    /// A ledger write succeeded after a degraded period.
    LedgerRecovered,

    /// No valid sensor frame within the stale window.
    SensorStale { last_read_ms: u32 },
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryData {
    pub uptime_ms: u32,
    pub state: DeviceState,
    pub mode: Mode,
    pub filter_usage_percent: f32,
    pub pm1: Option<u16>,
    pub pm25: Option<u16>,
    pub pm10: Option<u16>,
    pub reading_stale: bool,
    pub motor_speed_percent: u8,
    pub brake: bool,
    pub filter_present: bool,
    pub ledger_degraded: bool,
}

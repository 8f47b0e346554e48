//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It contains this tick's gestures, the latest sensor reading,
//! the cached filter usage, actuator commands, one-shot display / buzzer /
//! ledger requests, timing information, and configuration.  Think of it as
//! the "blackboard" in a blackboard architecture.

use crate::app::ports::{BeepPattern, Screen};
use crate::config::SystemConfig;
use crate::control::speed::{Mode, SpeedPolicy};
use crate::drivers::debounce::Gesture;
use crate::sensors::pms::SensorReading;

use super::{DeviceState, StateId};

// ---------------------------------------------------------------------------
// Input snapshot (read-only to state handlers; written by the service)
// ---------------------------------------------------------------------------

/// Debounced panel state for one tick.  Gestures are consumed once.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    pub touch: Option<Gesture>,
    pub reset: Option<Gesture>,
    pub filter_present: bool,
}

// ---------------------------------------------------------------------------
// Actuator commands (written by state handlers; consumed by the service)
// ---------------------------------------------------------------------------

/// Desired fan output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorCommand {
    pub brake: bool,
    pub speed_percent: u8,
    pub forward: bool,
}

impl MotorCommand {
    /// Brake engaged, 0 %.
    pub const STOPPED: Self = Self {
        brake: true,
        speed_percent: 0,
        forward: true,
    };

    /// Brake released, forward at `speed_percent`.
    pub fn run(speed_percent: u8) -> Self {
        Self {
            brake: false,
            speed_percent,
            forward: true,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.brake && self.speed_percent > 0
    }
}

/// Ledger mutation requested by a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerRequest {
    /// Write 0.0 (new filter fitted).
    Reset,
}

/// Commands that state handlers write to request actuator actions.
/// The service applies these to the ports after each FSM tick.
///
/// `motor` and `sensor_power` are levels held across ticks; `screen`,
/// `beep` and `ledger` are one-shot requests cleared before every tick.
#[derive(Debug, Clone, Copy)]
pub struct DeviceCommands {
    pub motor: MotorCommand,
    pub sensor_power: bool,
    pub screen: Option<Screen>,
    pub beep: Option<BeepPattern>,
    pub ledger: Option<LedgerRequest>,
}

impl Default for DeviceCommands {
    fn default() -> Self {
        Self {
            motor: MotorCommand::STOPPED,
            sensor_power: false,
            screen: None,
            beep: None,
            ledger: None,
        }
    }
}

impl DeviceCommands {
    /// Drop last tick's one-shot requests.
    pub fn clear_requests(&mut self) {
        self.screen = None;
        self.beep = None;
        self.ledger = None;
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Monotonic uptime for this tick (ms, wrapping).
    pub now_ms: u32,
    /// Milliseconds since the current state was entered.
    pub ms_in_state: u32,

    // -- Inputs --
    pub inputs: InputSnapshot,
    /// Last successfully decoded sensor reading, kept across failed polls.
    pub reading: Option<SensorReading>,

    // -- Domain state --
    /// In-memory filter usage; the ledger mirrors it.
    pub filter_usage: f32,
    /// Selected / active mode.
    pub mode: Mode,
    /// Last tap (or entry) time in ModeSelect.
    pub select_activity_ms: u32,
    /// The filter-full alert has been shown for the current filter.
    pub filter_full_notified: bool,
    /// PM2.5 value currently drawn on the locked-mode screen.
    pub shown_pm25: Option<u16>,

    // -- Outputs --
    pub commands: DeviceCommands,

    // -- Configuration --
    pub config: SystemConfig,
    pub policy: SpeedPolicy,
}

impl FsmContext {
    /// Create a new context with the given configuration and the usage
    /// loaded from the ledger at boot.
    pub fn new(config: SystemConfig, filter_usage: f32) -> Self {
        Self {
            now_ms: 0,
            ms_in_state: 0,
            inputs: InputSnapshot::default(),
            reading: None,
            filter_usage,
            mode: Mode::Low,
            select_activity_ms: 0,
            filter_full_notified: false,
            shown_pm25: None,
            commands: DeviceCommands::default(),
            policy: SpeedPolicy::from_config(&config),
            config,
        }
    }

    /// Fan target for the current mode and last reading.
    pub fn target_speed(&self) -> u8 {
        self.policy.target_speed(self.mode, self.reading.as_ref())
    }

    /// Locked-mode screen for the current mode and reading.
    pub fn mode_locked_screen(&self) -> Screen {
        let pm25 = self.reading.map(|r| r.pm25);
        Screen::ModeLocked {
            mode: self.mode,
            pm25,
            air: pm25.map(|v| self.policy.air_quality(v)),
        }
    }

    pub fn device_state(&self, id: StateId) -> DeviceState {
        DeviceState::from_parts(id, self.mode)
    }
}

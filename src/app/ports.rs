//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (panel inputs, particulate sensor, fan motor, display,
//! buzzer, FRAM) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics, so
//! the domain core never touches hardware directly.

use serde::Serialize;

use crate::control::speed::{AirQuality, Mode};
use crate::control::usage::FilterBand;
use crate::error::{SensorError, StoreError};
use crate::scheduler::TaskId;
use crate::sensors::pms::SensorReading;

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: panel → domain)
// ───────────────────────────────────────────────────────────────

/// Polarity-corrected levels of the three panel inputs for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawInputs {
    /// Touch pad is being touched.
    pub touch_active: bool,
    /// Reset button is pressed.
    pub reset_active: bool,
    /// Filter cartridge is seated.
    pub filter_present: bool,
}

/// Read-side port for the front panel.  Called once per tick.
pub trait InputPort {
    fn read_inputs(&mut self) -> RawInputs;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the particulate sensor.
pub trait SensorPort {
    /// Attempt one polling cycle.  `None` means "no valid frame this cycle";
    /// the caller keeps its last reading.
    fn read_particulates(&mut self, now_ms: u32) -> Option<SensorReading>;
}

/// Byte-level source of sensor frames (UART on the device, a script in tests).
pub trait FrameSource {
    /// Read up to `buf.len()` bytes of one frame.  Returns the byte count.
    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
pub trait ActuatorPort {
    /// Fan speed in percent (0–100).
    fn set_motor_speed(&mut self, percent: u8);

    /// Engage (`true`) or release the fan brake.
    fn set_brake(&mut self, engaged: bool);

    /// Fan rotation direction (`true` = forward).
    fn set_direction(&mut self, forward: bool);

    /// Power the particulate sensor up or down via its SET pin.
    fn set_sensor_power(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Display and buzzer ports (external services)
// ───────────────────────────────────────────────────────────────

/// A named screen the display service knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Screen {
    /// Backlight off.
    Blank,
    /// Brand splash shown on wake.
    Logo,
    FilterStatus { band: FilterBand, percent: f32 },
    NoFilter,
    ModeIcon(Mode),
    /// Mode locked in, with the live PM2.5 readout coloured by `air`.
    ModeLocked {
        mode: Mode,
        pm25: Option<u16>,
        air: Option<AirQuality>,
    },
    FilterFull { percent: f32 },
    ResetConfirmation,
}

/// Display service contract.  Rendering is entirely the adapter's business.
pub trait DisplayPort {
    fn show(&mut self, screen: &Screen);
}

/// `count` beeps of `duration_ms`, separated by `gap_ms` of silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BeepPattern {
    pub count: u8,
    pub duration_ms: u32,
    pub gap_ms: u32,
}

impl BeepPattern {
    /// Short acknowledgement click (mode change, wake).
    pub const CLICK: Self = Self::new(1, 50, 0);
    /// Filter missing.
    pub const NO_FILTER: Self = Self::new(2, 100, 100);
    /// Filter counter cleared.
    pub const RESET: Self = Self::new(3, 50, 100);
    /// Filter exhausted.
    pub const FILTER_FULL: Self = Self::new(3, 200, 300);

    pub const fn new(count: u8, duration_ms: u32, gap_ms: u32) -> Self {
        Self {
            count,
            duration_ms,
            gap_ms,
        }
    }
}

/// Buzzer service contract.
pub trait BuzzerPort {
    /// Fire-and-forget single beep.
    fn beep(&mut self, duration_ms: u32);

    /// Play a pattern.  The default ignores gaps; adapters that can wait
    /// should override it.
    fn play(&mut self, pattern: BeepPattern) {
        for _ in 0..pattern.count {
            self.beep(pattern.duration_ms);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Nonvolatile storage ports
// ───────────────────────────────────────────────────────────────

/// Raw byte-addressed nonvolatile memory (FRAM on the device).
pub trait NvStore {
    /// Check the device answers on its bus.
    fn probe(&mut self) -> Result<(), StoreError>;

    /// Fill `buf` from `address`.
    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), StoreError>;

    /// Write `data` starting at `address`.
    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), StoreError>;
}

/// The persisted filter-usage percentage.
///
/// [`NonvolatileLedger`](crate::ledger::NonvolatileLedger) is the production
/// implementation; the service only ever sees this trait.
pub trait UsageLedger {
    /// Stored percentage, or 0.0 when unreadable or out of range.
    fn read(&mut self) -> f32;

    /// Clamp, persist and verify.
    fn write(&mut self, percent: f32) -> Result<(), StoreError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the service)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a periodic task is due.
///
/// The [`Scheduler`](crate::scheduler::Scheduler) knows nothing about what
/// the tasks do; the service collects the fired set and acts on it within
/// the same tick.
pub trait SchedulerDelegate {
    fn on_task_fired(&mut self, task: TaskId);
}

//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the FSM, the input debouncers, the scheduler, and the
//! shared context.  It exposes a clean, hardware-agnostic API.  All I/O
//! flows through port traits injected at call sites, making the entire
//! service testable with mock adapters.
//!
//! ```text
//!    InputPort ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!   SensorPort ──▶ │         AppService          │ ──▶ DisplayPort
//! ActuatorPort ◀── │  Debounce · FSM · Scheduler │ ──▶ BuzzerPort
//!  UsageLedger ◀──▶└─────────────────────────────┘
//! ```
//!
//! Per tick, in fixed order: input debouncing → scheduled sensor decode →
//! FSM transition → actuator / UI update → ledger persistence → events.

use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::control::speed::Mode;
use crate::control::usage::FilterUsageAccumulator;
use crate::drivers::debounce::{DebounceConfig, Debouncer};
use crate::fsm::context::{FsmContext, InputSnapshot, LedgerRequest, MotorCommand};
use crate::fsm::states::build_state_table;
use crate::fsm::{DeviceState, Fsm, StateId};
use crate::scheduler::{PeriodicTask, Scheduler, TaskId};
use crate::sensors::pms::SensorReading;

use super::events::{AppEvent, TelemetryData};
use super::ports::{
    ActuatorPort, BuzzerPort, DisplayPort, EventSink, InputPort, SchedulerDelegate, SensorPort,
    UsageLedger,
};

// ───────────────────────────────────────────────────────────────
// Scheduler delegate
// ───────────────────────────────────────────────────────────────

/// Collects which periodic tasks fired during one tick.
#[derive(Debug, Default)]
struct FiredTasks {
    sensor_poll: bool,
    usage_accrual: bool,
    telemetry: bool,
}

impl SchedulerDelegate for FiredTasks {
    fn on_task_fired(&mut self, task: TaskId) {
        match task {
            TaskId::SensorPoll => self.sensor_poll = true,
            TaskId::UsageAccrual => self.usage_accrual = true,
            TaskId::Telemetry => self.telemetry = true,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    fsm: Fsm,
    ctx: FsmContext,
    touch: Debouncer,
    reset: Debouncer,
    scheduler: Scheduler,
    accumulator: FilterUsageAccumulator,
    /// Last motor command written to the port.
    applied_motor: Option<MotorCommand>,
    /// Last sensor power level written to the port.
    applied_sensor_power: Option<bool>,
    ledger_degraded: bool,
    sensor_stale_reported: bool,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let touch = Debouncer::new(DebounceConfig::touch(&config));
        let reset = Debouncer::new(DebounceConfig::reset(&config));
        let accumulator = FilterUsageAccumulator::new(config.usage_accrual_interval_ms);
        let ctx = FsmContext::new(config, 0.0);
        let fsm = Fsm::new(build_state_table(), StateId::Sleep);

        Self {
            fsm,
            ctx,
            touch,
            reset,
            scheduler: Scheduler::new(),
            accumulator,
            applied_motor: None,
            applied_sensor_power: None,
            ledger_degraded: false,
            sensor_stale_reported: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load the filter usage, register periodic tasks, and enter Sleep.
    pub fn start(
        &mut self,
        now_ms: u32,
        hw: &mut impl ActuatorPort,
        ledger: &mut impl UsageLedger,
        ui: &mut (impl DisplayPort + BuzzerPort),
        sink: &mut impl EventSink,
    ) {
        self.ctx.filter_usage = ledger.read();
        self.ctx.now_ms = now_ms;
        info!("AppService: filter usage {:.2}% at boot", self.ctx.filter_usage);

        let cfg = &self.ctx.config;
        let tasks = [
            (TaskId::SensorPoll, cfg.sensor_poll_interval_ms),
            (TaskId::UsageAccrual, cfg.usage_accrual_interval_ms),
            (TaskId::Telemetry, cfg.telemetry_interval_secs.saturating_mul(1_000)),
        ];
        for (id, period_ms) in tasks {
            let task = PeriodicTask { id, period_ms };
            if self.scheduler.add(task, now_ms).is_none() {
                warn!("AppService: no scheduler slot for {:?}", id);
            }
        }

        self.fsm.start(&mut self.ctx);
        self.apply_outputs(hw, ui);
        let state = self.device_state();
        sink.emit(&AppEvent::Started(state));
        info!("AppService started in {:?}", state);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle.
    ///
    /// `hw` carries the input, sensor and actuator ports; `ui` carries
    /// display and buzzer.
    pub fn tick(
        &mut self,
        now_ms: u32,
        hw: &mut (impl InputPort + SensorPort + ActuatorPort),
        ledger: &mut impl UsageLedger,
        ui: &mut (impl DisplayPort + BuzzerPort),
        sink: &mut impl EventSink,
    ) {
        self.ctx.now_ms = now_ms;
        self.ctx.commands.clear_requests();
        let prev_state = self.device_state();
        let was_full = self.ctx.filter_full_notified;

        // 1. Inputs → gestures
        let raw = hw.read_inputs();
        self.ctx.inputs = InputSnapshot {
            touch: self.touch.poll_gesture(raw.touch_active, now_ms),
            reset: self.reset.poll_gesture(raw.reset_active, now_ms),
            filter_present: raw.filter_present,
        };

        // 2. Scheduled work due this tick
        let mut fired = FiredTasks::default();
        self.scheduler.poll(now_ms, &mut fired);
        if fired.sensor_poll && self.ctx.commands.sensor_power {
            self.poll_sensor(hw, sink);
        }

        // 3. FSM tick (pure state logic)
        self.fsm.tick(&mut self.ctx);

        // 4. Actuators, display, buzzer
        self.apply_outputs(hw, ui);

        // 5. Ledger persistence
        if self.ctx.commands.ledger == Some(LedgerRequest::Reset) {
            self.persist(0.0, ledger, sink);
            sink.emit(&AppEvent::FilterReset);
        }
        if fired.usage_accrual && self.accrual_allowed() {
            let speed = self.ctx.commands.motor.speed_percent;
            let before = self.ctx.filter_usage;
            let after = self.accumulator.accrue(before, speed);
            if after > before {
                self.ctx.filter_usage = after;
                debug!("Usage {:.2}% -> {:.2}% at {}%", before, after, speed);
                self.persist(after, ledger, sink);
            }
        }

        // 6. Events
        if self.ctx.filter_full_notified && !was_full {
            sink.emit(&AppEvent::FilterFull {
                percent: self.ctx.filter_usage,
            });
        }
        let new_state = self.device_state();
        if new_state != prev_state {
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: new_state,
            });
        }
        if fired.telemetry {
            sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current context.
    pub fn build_telemetry(&self) -> TelemetryData {
        let reading = self.ctx.reading;
        let motor = self.ctx.commands.motor;
        TelemetryData {
            uptime_ms: self.ctx.now_ms,
            state: self.device_state(),
            mode: self.ctx.mode,
            filter_usage_percent: self.ctx.filter_usage,
            pm1: reading.map(|r| r.pm1),
            pm25: reading.map(|r| r.pm25),
            pm10: reading.map(|r| r.pm10),
            reading_stale: self.reading_stale(),
            motor_speed_percent: if motor.brake { 0 } else { motor.speed_percent },
            brake: motor.brake,
            filter_present: self.ctx.inputs.filter_present,
            ledger_degraded: self.ledger_degraded,
        }
    }

    /// Current FSM table state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Current state with the active mode folded in.
    pub fn device_state(&self) -> DeviceState {
        self.ctx.device_state(self.fsm.current_state())
    }

    pub fn mode(&self) -> Mode {
        self.ctx.mode
    }

    /// In-memory filter usage (authoritative while the ledger is degraded).
    pub fn filter_usage(&self) -> f32 {
        self.ctx.filter_usage
    }

    /// Last decoded sensor reading, if any.
    pub fn reading(&self) -> Option<SensorReading> {
        self.ctx.reading
    }

    pub fn is_ledger_degraded(&self) -> bool {
        self.ledger_degraded
    }

    // ── Internal ──────────────────────────────────────────────

    fn reading_stale(&self) -> bool {
        self.ctx.reading.map_or(true, |r| {
            r.is_stale(self.ctx.now_ms, self.ctx.config.sensor_stale_after_ms)
        })
    }

    fn poll_sensor(&mut self, hw: &mut impl SensorPort, sink: &mut impl EventSink) {
        if let Some(reading) = hw.read_particulates(self.ctx.now_ms) {
            if self.sensor_stale_reported {
                info!("Sensor: readings resumed");
            }
            self.ctx.reading = Some(reading);
            self.sensor_stale_reported = false;
            return;
        }

        // Keep the last reading; only report once per outage.
        if let Some(last) = self.ctx.reading {
            if !self.sensor_stale_reported
                && last.is_stale(self.ctx.now_ms, self.ctx.config.sensor_stale_after_ms)
            {
                warn!("Sensor: no valid frame since {} ms", last.read_at_ms);
                self.sensor_stale_reported = true;
                sink.emit(&AppEvent::SensorStale {
                    last_read_ms: last.read_at_ms,
                });
            }
        }
    }

    /// Wear accrues only while the fan turns with a filter in place and the
    /// device awake.
    fn accrual_allowed(&self) -> bool {
        self.ctx.commands.motor.is_running()
            && self.ctx.inputs.filter_present
            && self.fsm.current_state() != StateId::Sleep
    }

    /// Translate FSM commands into port calls.  Levels are only written when
    /// they change; one-shot requests are always honoured.
    fn apply_outputs(&mut self, hw: &mut impl ActuatorPort, ui: &mut (impl DisplayPort + BuzzerPort)) {
        let cmds = self.ctx.commands;

        // ── Fan ──────────────────────────────────────────────
        if self.applied_motor != Some(cmds.motor) {
            let was_running = self.applied_motor.is_some_and(|m| m.is_running());
            if cmds.motor.brake {
                hw.set_motor_speed(0);
                hw.set_brake(true);
            } else {
                hw.set_direction(cmds.motor.forward);
                hw.set_brake(false);
                hw.set_motor_speed(cmds.motor.speed_percent);
            }
            if cmds.motor.is_running() && !was_running {
                self.scheduler.restart(TaskId::UsageAccrual, self.ctx.now_ms);
            }
            self.applied_motor = Some(cmds.motor);
        }

        // ── Sensor power ─────────────────────────────────────
        if self.applied_sensor_power != Some(cmds.sensor_power) {
            hw.set_sensor_power(cmds.sensor_power);
            self.applied_sensor_power = Some(cmds.sensor_power);
        }

        // ── Display / buzzer ─────────────────────────────────
        if let Some(screen) = cmds.screen {
            ui.show(&screen);
        }
        if let Some(pattern) = cmds.beep {
            ui.play(pattern);
        }
    }

    /// Write `value` with bounded retries, tracking degraded state.
    fn persist(&mut self, value: f32, ledger: &mut impl UsageLedger, sink: &mut impl EventSink) {
        let attempts = self.ctx.config.ledger_write_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match ledger.write(value) {
                Ok(()) => {
                    if self.ledger_degraded {
                        self.ledger_degraded = false;
                        info!("Ledger: recovered, {:.2}% persisted", value);
                        sink.emit(&AppEvent::LedgerRecovered);
                    }
                    return;
                }
                Err(e) => {
                    warn!("Ledger: write {}/{} failed: {}", attempt, attempts, e);
                    last_error = Some(e);
                }
            }
        }

        if let Some(error) = last_error {
            if !self.ledger_degraded {
                self.ledger_degraded = true;
                sink.emit(&AppEvent::LedgerDegraded { attempts, error });
            }
        }
    }
}

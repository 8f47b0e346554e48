//! Mock hardware adapters for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history without touching real GPIO/PWM registers.  The FRAM mock sits
//! underneath the real `NonvolatileLedger`, and the sensor mock feeds raw
//! bytes through the real frame decoder.

use atomu::app::events::AppEvent;
use atomu::app::ports::{
    ActuatorPort, BeepPattern, BuzzerPort, DisplayPort, EventSink, FrameSource, InputPort,
    NvStore, RawInputs, Screen, SensorPort, UsageLedger,
};
use atomu::app::service::AppService;
use atomu::config::SystemConfig;
use atomu::error::{SensorError, StoreError};
use atomu::fsm::{DeviceState, StateId};
use atomu::ledger::NonvolatileLedger;
use atomu::sensors::pms::{SensorFrameReader, SensorReading, FRAME_LEN, FRAME_MAGIC};
use embedded_hal::delay::DelayNs;
use std::cell::Cell;
use std::rc::Rc;

/// Control loop period used by the harness.
pub const TICK_MS: u32 = 10;

// ── Sensor frames ─────────────────────────────────────────────

/// A well-formed 32-byte frame with a valid checksum.
pub fn frame(pm1: u16, pm25: u16, pm10: u16) -> [u8; FRAME_LEN] {
    let mut f = [0u8; FRAME_LEN];
    f[..2].copy_from_slice(&FRAME_MAGIC);
    f[2..4].copy_from_slice(&28u16.to_be_bytes());
    f[10..12].copy_from_slice(&pm1.to_be_bytes());
    f[12..14].copy_from_slice(&pm25.to_be_bytes());
    f[14..16].copy_from_slice(&pm10.to_be_bytes());
    let sum: u16 = f[..30].iter().map(|&b| u16::from(b)).sum();
    f[30..].copy_from_slice(&sum.to_be_bytes());
    f
}

/// UART stand-in that returns the same frame on every read.
#[derive(Default)]
pub struct MockUart {
    pub frame: Option<[u8; FRAME_LEN]>,
    pub reads: u32,
}

impl FrameSource for MockUart {
    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize, SensorError> {
        self.reads += 1;
        match self.frame {
            Some(f) => {
                buf[..FRAME_LEN].copy_from_slice(&f);
                Ok(FRAME_LEN)
            }
            None => Err(SensorError::NoData),
        }
    }
}

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    Speed(u8),
    Brake(bool),
    Direction(bool),
    SensorPower(bool),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub inputs: RawInputs,
    pub sensor: SensorFrameReader<MockUart>,
    pub calls: Vec<ActuatorCall>,
    pub speed: u8,
    pub brake: bool,
    pub sensor_power: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            inputs: RawInputs {
                touch_active: false,
                reset_active: false,
                filter_present: true,
            },
            sensor: SensorFrameReader::new(
                MockUart::default(),
                config.sensor_read_attempts,
                config.sensor_verify_checksum,
            ),
            calls: Vec::new(),
            speed: 0,
            brake: true,
            sensor_power: false,
        }
    }

    /// Fan actually turning: brake released and non-zero speed.
    pub fn fan_running(&self) -> bool {
        !self.brake && self.speed > 0
    }
}

impl InputPort for MockHardware {
    fn read_inputs(&mut self) -> RawInputs {
        self.inputs
    }
}

impl SensorPort for MockHardware {
    fn read_particulates(&mut self, now_ms: u32) -> Option<SensorReading> {
        self.sensor.read_particulates(now_ms)
    }
}

impl ActuatorPort for MockHardware {
    fn set_motor_speed(&mut self, percent: u8) {
        self.speed = percent;
        self.calls.push(ActuatorCall::Speed(percent));
    }

    fn set_brake(&mut self, engaged: bool) {
        self.brake = engaged;
        self.calls.push(ActuatorCall::Brake(engaged));
    }

    fn set_direction(&mut self, forward: bool) {
        self.calls.push(ActuatorCall::Direction(forward));
    }

    fn set_sensor_power(&mut self, on: bool) {
        self.sensor_power = on;
        self.calls.push(ActuatorCall::SensorPower(on));
    }
}

// ── MockPanel (display + buzzer) ──────────────────────────────

#[derive(Default)]
pub struct MockPanel {
    pub screens: Vec<Screen>,
    pub patterns: Vec<BeepPattern>,
}

#[allow(dead_code)]
impl MockPanel {
    pub fn current(&self) -> Option<&Screen> {
        self.screens.last()
    }
}

impl DisplayPort for MockPanel {
    fn show(&mut self, screen: &Screen) {
        self.screens.push(*screen);
    }
}

impl BuzzerPort for MockPanel {
    fn beep(&mut self, _duration_ms: u32) {}

    fn play(&mut self, pattern: BeepPattern) {
        self.patterns.push(pattern);
    }
}

// ── MockFram ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MockFram {
    pub bytes: [u8; 4],
    pub writes: u32,
    /// Accept writes but keep the old contents (worn cell).  Shared so a
    /// test can flip it after the ledger has taken ownership.
    pub drop_writes: Rc<Cell<bool>>,
}

#[allow(dead_code)]
impl MockFram {
    pub fn holding(percent: f32) -> Self {
        Self {
            bytes: percent.to_le_bytes(),
            ..Self::default()
        }
    }

    pub fn value(&self) -> f32 {
        f32::from_le_bytes(self.bytes)
    }
}

impl NvStore for MockFram {
    fn probe(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), StoreError> {
        let a = address as usize;
        if a + buf.len() > self.bytes.len() {
            return Err(StoreError::AddressOutOfRange {
                address,
                len: buf.len(),
            });
        }
        buf.copy_from_slice(&self.bytes[a..a + buf.len()]);
        Ok(())
    }

    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), StoreError> {
        self.writes += 1;
        if self.drop_writes.get() {
            return Ok(());
        }
        let a = address as usize;
        self.bytes[a..a + data.len()].copy_from_slice(data);
        Ok(())
    }
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig: the whole device on the bench ────────────────────────

pub struct Rig {
    pub app: AppService,
    pub hw: MockHardware,
    pub ledger: NonvolatileLedger<MockFram, NoDelay>,
    pub ui: MockPanel,
    pub sink: RecordingSink,
    pub now: u32,
}

#[allow(dead_code)]
impl Rig {
    /// Power on with the given FRAM contents and default config.
    pub fn boot(fram: MockFram) -> Self {
        Self::boot_with(SystemConfig::default(), fram)
    }

    pub fn boot_with(config: SystemConfig, fram: MockFram) -> Self {
        let mut hw = MockHardware::new(&config);
        let mut ledger = NonvolatileLedger::open(fram, NoDelay, config.ledger_settle_ms)
            .expect("mock FRAM always answers");
        let mut ui = MockPanel::default();
        let mut sink = RecordingSink::default();
        let mut app = AppService::new(config);
        app.start(0, &mut hw, &mut ledger, &mut ui, &mut sink);
        Self {
            app,
            hw,
            ledger,
            ui,
            sink,
            now: 0,
        }
    }

    pub fn tick(&mut self) {
        self.now += TICK_MS;
        self.app.tick(
            self.now,
            &mut self.hw,
            &mut self.ledger,
            &mut self.ui,
            &mut self.sink,
        );
    }

    pub fn run_for(&mut self, ms: u32) {
        for _ in 0..ms / TICK_MS {
            self.tick();
        }
    }

    /// Short touch: press 300 ms, release, settle past the debounce window.
    pub fn tap(&mut self) {
        self.hw.inputs.touch_active = true;
        self.run_for(300);
        self.hw.inputs.touch_active = false;
        self.run_for(300);
    }

    pub fn hold_touch(&mut self, ms: u32) {
        self.hw.inputs.touch_active = true;
        self.run_for(ms);
        self.hw.inputs.touch_active = false;
        self.run_for(300);
    }

    pub fn hold_reset(&mut self, ms: u32) {
        self.hw.inputs.reset_active = true;
        self.run_for(ms);
        self.hw.inputs.reset_active = false;
        self.run_for(300);
    }

    /// Sleep → Awake → FilterCheck → ModeSelect, tap `taps` times, lock in.
    pub fn activate(&mut self, taps: usize) {
        self.tap();
        assert_eq!(self.app.state(), StateId::Awake);
        self.tap();
        assert_eq!(self.app.state(), StateId::FilterCheck);
        self.run_for(3_100);
        assert_eq!(self.app.state(), StateId::ModeSelect);
        for _ in 0..taps {
            self.tap();
        }
        self.run_for(3_100);
        assert_eq!(self.app.state(), StateId::ModeActivated);
    }

    pub fn state(&self) -> DeviceState {
        self.app.device_state()
    }

    /// Value currently persisted in FRAM, read through the ledger.
    pub fn stored_usage(&mut self) -> f32 {
        self.ledger.read()
    }

    /// Tear down and hand back the FRAM for byte-level checks.
    pub fn into_fram(self) -> MockFram {
        self.ledger.release().0
    }
}

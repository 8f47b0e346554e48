//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the panel inputs, the particulate sensor reader, the fan motor
//! controller and the sensor SET line, exposing them through
//! [`InputPort`], [`SensorPort`] and [`ActuatorPort`].  Everything is
//! generic over `embedded-hal`, so host tests plug in recording mocks.

use embedded_hal::digital::{OutputPin, PinState};
use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::{ActuatorPort, InputPort, RawInputs, SensorPort};
use crate::drivers::motor::MotorController;
use crate::error::{ActuatorError, Result};
use crate::sensors::pms::SensorReading;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I, S, P, B, D, W> {
    inputs: I,
    sensor: S,
    motor: MotorController<P, B, D>,
    sensor_set: W,
}

impl<I, S, P, B, D, W> HardwareAdapter<I, S, P, B, D, W>
where
    I: InputPort,
    S: SensorPort,
    P: SetDutyCycle,
    B: OutputPin,
    D: OutputPin,
    W: OutputPin,
{
    /// Take ownership of every line; the fan starts braked and the sensor
    /// asleep.
    pub fn new(inputs: I, sensor: S, pwm: P, brake: B, dir: D, mut sensor_set: W) -> Result<Self> {
        let motor = MotorController::new(pwm, brake, dir)?;
        sensor_set
            .set_low()
            .map_err(|_| ActuatorError::GpioWriteFailed)?;
        Ok(Self {
            inputs,
            sensor,
            motor,
            sensor_set,
        })
    }

    pub fn motor(&self) -> &MotorController<P, B, D> {
        &self.motor
    }
}

// ── InputPort implementation ──────────────────────────────────

impl<I: InputPort, S, P, B, D, W> InputPort for HardwareAdapter<I, S, P, B, D, W> {
    fn read_inputs(&mut self) -> RawInputs {
        self.inputs.read_inputs()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I, S: SensorPort, P, B, D, W> SensorPort for HardwareAdapter<I, S, P, B, D, W> {
    fn read_particulates(&mut self, now_ms: u32) -> Option<SensorReading> {
        self.sensor.read_particulates(now_ms)
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<I, S, P, B, D, W> ActuatorPort for HardwareAdapter<I, S, P, B, D, W>
where
    P: SetDutyCycle,
    B: OutputPin,
    D: OutputPin,
    W: OutputPin,
{
    fn set_motor_speed(&mut self, percent: u8) {
        if let Err(e) = self.motor.set_speed(percent) {
            warn!("Fan: speed {}% not applied: {}", percent, e);
        }
    }

    fn set_brake(&mut self, engaged: bool) {
        if let Err(e) = self.motor.set_brake(engaged) {
            warn!("Fan: brake={} not applied: {}", engaged, e);
        }
    }

    fn set_direction(&mut self, forward: bool) {
        if let Err(e) = self.motor.set_direction(forward) {
            warn!("Fan: direction not applied: {}", e);
        }
    }

    fn set_sensor_power(&mut self, on: bool) {
        if self.sensor_set.set_state(PinState::from(on)).is_err() {
            warn!("Sensor: SET line write failed");
        }
    }
}

//! BLDC fan driver: inverted PWM speed input, brake and direction lines.
//!
//! The driver board's speed input is active-low: full duty stops the fan,
//! zero duty is full speed.  So `duty = (100 - percent) / 100 * max_duty`.
//! The tachometer line is not read.
//!
//! ## Dual-target design
//!
//! Generic over `embedded_hal` 1.0 traits: LEDC + GPIO drivers on the
//! device, recording mocks on the host.

use embedded_hal::digital::{OutputPin, PinState};
use embedded_hal::pwm::SetDutyCycle;

use crate::error::ActuatorError;

/// Inverted duty cycle for a speed percentage (clamped to 100).
pub fn inverted_duty(percent: u8, max_duty: u16) -> u16 {
    let off = 100 - u32::from(percent.min(100));
    (off * u32::from(max_duty) / 100) as u16
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorState {
    Braked,
    Running { percent: u8, forward: bool },
}

pub struct MotorController<P, B, D> {
    pwm: P,
    brake: B,
    dir: D,
    percent: u8,
    braked: bool,
    forward: bool,
}

impl<P, B, D> MotorController<P, B, D>
where
    P: SetDutyCycle,
    B: OutputPin,
    D: OutputPin,
{
    /// Take ownership of the lines and put the fan in a safe stopped state.
    pub fn new(pwm: P, brake: B, dir: D) -> Result<Self, ActuatorError> {
        let mut motor = Self {
            pwm,
            brake,
            dir,
            percent: 0,
            braked: true,
            forward: true,
        };
        motor.set_direction(true)?;
        motor.stop()?;
        Ok(motor)
    }

    /// Apply a speed percentage (0–100).
    pub fn set_speed(&mut self, percent: u8) -> Result<(), ActuatorError> {
        let percent = percent.min(100);
        let duty = inverted_duty(percent, self.pwm.max_duty_cycle());
        self.pwm
            .set_duty_cycle(duty)
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        self.percent = percent;
        Ok(())
    }

    /// Drive the brake line; HIGH = engaged.
    pub fn set_brake(&mut self, engaged: bool) -> Result<(), ActuatorError> {
        self.brake
            .set_state(PinState::from(engaged))
            .map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.braked = engaged;
        Ok(())
    }

    /// Drive the direction line; HIGH = forward.
    pub fn set_direction(&mut self, forward: bool) -> Result<(), ActuatorError> {
        self.dir
            .set_state(PinState::from(forward))
            .map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.forward = forward;
        Ok(())
    }

    /// Engage the brake and command 0 %.
    pub fn stop(&mut self) -> Result<(), ActuatorError> {
        self.set_brake(true)?;
        self.set_speed(0)
    }

    pub fn state(&self) -> MotorState {
        if self.braked || self.percent == 0 {
            MotorState::Braked
        } else {
            MotorState::Running {
                percent: self.percent,
                forward: self.forward,
            }
        }
    }
}

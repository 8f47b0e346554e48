//! Actuator and peripheral drivers, generic over `embedded-hal` 1.0.

pub mod buzzer;
pub mod debounce;
pub mod fram;
pub mod motor;

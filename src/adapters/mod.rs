//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                          | Connects to            |
//! |------------|-------------------------------------|------------------------|
//! | `hardware` | InputPort, SensorPort, ActuatorPort | GPIO, LEDC PWM, sensor |
//! | `display`  | DisplayPort, BuzzerPort             | LCD (log), buzzer      |
//! | `log_sink` | EventSink                           | Serial log output      |
//! | `time`     | —                                   | ESP32 system timer     |
//! | `uart`     | FrameSource                         | PMS sensor UART        |

pub mod display;
pub mod hardware;
pub mod log_sink;
pub mod time;
#[cfg(feature = "espidf")]
pub mod uart;

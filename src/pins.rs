//! GPIO / peripheral pin assignments for the Atomu main board.
//!
//! Single source of truth: the boot code in `main` references this module
//! rather than hard-coding pin numbers.  Input polarities live next to the
//! pins they describe.

use crate::sensors::switches::Polarity;

// ---------------------------------------------------------------------------
// Fan motor (BLDC driver with inverted PWM input)
// ---------------------------------------------------------------------------

/// LEDC PWM output for fan speed.  Duty is inverted: full duty = stopped.
pub const FAN_PWM_GPIO: i32 = 4;
/// Digital output: HIGH = brake engaged.
pub const FAN_BRAKE_GPIO: i32 = 5;
/// Digital output: HIGH = forward rotation.
pub const FAN_DIR_GPIO: i32 = 6;
/// Tachometer output from the driver.  Wired but not used for control.
pub const FAN_FG_GPIO: i32 = 7;

// ---------------------------------------------------------------------------
// User inputs
// ---------------------------------------------------------------------------

/// Capacitive touch pad module output.
pub const TOUCH_GPIO: i32 = 2;
pub const TOUCH_POLARITY: Polarity = Polarity::ActiveHigh;

/// Momentary filter-reset button to ground, internal pull-up.
pub const RESET_BUTTON_GPIO: i32 = 3;
pub const RESET_POLARITY: Polarity = Polarity::ActiveLow;

/// Filter-presence microswitch to ground, internal pull-up.
/// LOW = filter seated, HIGH = filter absent.
pub const FILTER_SWITCH_GPIO: i32 = 8;
pub const FILTER_POLARITY: Polarity = Polarity::ActiveLow;

// ---------------------------------------------------------------------------
// Particulate sensor (PMS-series, UART 9600 8N1)
// ---------------------------------------------------------------------------

pub const PM_UART_TX_GPIO: i32 = 17;
pub const PM_UART_RX_GPIO: i32 = 18;
pub const PM_UART_BAUD: u32 = 9_600;
/// Sensor SET pin: HIGH = running, LOW = sleep.
pub const PM_SET_GPIO: i32 = 9;

// ---------------------------------------------------------------------------
// FRAM (MB85RC04, I²C)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 15;
pub const I2C_SCL_GPIO: i32 = 16;
/// 100 kHz for reliability over the ribbon cable to the filter bay.
pub const I2C_FREQ_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// Buzzer
// ---------------------------------------------------------------------------

/// Active buzzer, HIGH = sounding.
pub const BUZZER_GPIO: i32 = 10;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC base frequency for the fan.
pub const FAN_PWM_FREQ_HZ: u32 = 25_000;

//! Atomu Firmware — Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        FrontPanel          LogEventSink       │
//! │  (Input+Sensor+Actuator)(Display+Buzzer)    (EventSink)        │
//! │  NonvolatileLedger      MonotonicClock                         │
//! │  (UsageLedger, FRAM)                                           │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Debounce · FSM · Scheduler · Wear accounting          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, PinDriver, Pull};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};
use esp_idf_hal::units::Hertz;
use log::info;

use atomu::adapters::display::{FrontPanel, LogDisplay};
use atomu::adapters::hardware::HardwareAdapter;
use atomu::adapters::log_sink::LogEventSink;
use atomu::adapters::time::MonotonicClock;
use atomu::adapters::uart::UartFrameSource;
use atomu::app::service::AppService;
use atomu::config::SystemConfig;
use atomu::drivers::buzzer::Buzzer;
use atomu::drivers::fram::{Mb85rc04, DEFAULT_ADDRESS};
use atomu::ledger::NonvolatileLedger;
use atomu::pins;
use atomu::sensors::pms::SensorFrameReader;
use atomu::sensors::switches::{PanelInput, PanelInputs};

/// Build-time JSON overrides for [`SystemConfig`], if any.
const CONFIG_OVERRIDES: Option<&str> = option_env!("ATOMU_CONFIG_JSON");

fn load_config() -> Result<SystemConfig> {
    let config = match CONFIG_OVERRIDES {
        Some(json) => SystemConfig::from_json(json).context("config overrides rejected")?,
        None => SystemConfig::default(),
    };
    config.validate().context("config invalid")?;
    Ok(config)
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Atomu v{}                          ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = load_config()?;
    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let p = peripherals.pins;

    // ── 2. Filter-usage ledger (FRAM over I²C) ────────────────
    // GPIO numbers mirror `pins`: SDA 15, SCL 16.
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        p.gpio15,
        p.gpio16,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ)),
    )
    .context("I2C init")?;
    let mut ledger = NonvolatileLedger::open(
        Mb85rc04::new(i2c, DEFAULT_ADDRESS),
        FreeRtos,
        config.ledger_settle_ms,
    )
    .context("filter ledger unavailable")?;

    // ── 3. Panel inputs (touch 2, reset 3, filter 8) ──────────
    let touch = PinDriver::input(p.gpio2)?;
    let mut reset = PinDriver::input(p.gpio3)?;
    reset.set_pull(Pull::Up)?;
    let mut filter = PinDriver::input(p.gpio8)?;
    filter.set_pull(Pull::Up)?;
    let inputs = PanelInputs::new(
        PanelInput::new(touch, pins::TOUCH_POLARITY, "touch"),
        PanelInput::new(reset, pins::RESET_POLARITY, "reset"),
        PanelInput::new(filter, pins::FILTER_POLARITY, "filter"),
    );

    // ── 4. Particulate sensor (UART1 TX 17 / RX 18, SET 9) ────
    let uart = UartDriver::new(
        peripherals.uart1,
        p.gpio17,
        p.gpio18,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::default().baudrate(Hertz(pins::PM_UART_BAUD)),
    )
    .context("sensor UART init")?;
    let sensor = SensorFrameReader::new(
        UartFrameSource::new(uart),
        config.sensor_read_attempts,
        config.sensor_verify_checksum,
    );
    let sensor_set = PinDriver::output(p.gpio9)?;

    // ── 5. Fan (PWM 4, brake 5, direction 6) ──────────────────
    let timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::default()
            .frequency(Hertz(pins::FAN_PWM_FREQ_HZ))
            .resolution(Resolution::Bits10),
    )
    .context("LEDC timer init")?;
    let pwm = LedcDriver::new(peripherals.ledc.channel0, &timer, p.gpio4)?;
    let brake = PinDriver::output(p.gpio5)?;
    let dir = PinDriver::output(p.gpio6)?;

    let mut hw = HardwareAdapter::new(inputs, sensor, pwm, brake, dir, sensor_set)
        .context("fan init")?;

    // ── 6. Front panel (buzzer 10) ────────────────────────────
    let buzzer = Buzzer::new(PinDriver::output(p.gpio10)?, FreeRtos);
    let mut ui = FrontPanel::new(LogDisplay::new(), buzzer);
    let mut sink = LogEventSink::new();

    // ── 7. Application core ───────────────────────────────────
    let clock = MonotonicClock::new();
    let loop_ms = config.control_loop_interval_ms;
    let mut app = AppService::new(config);
    app.start(clock.uptime_ms(), &mut hw, &mut ledger, &mut ui, &mut sink);

    info!("System ready. Entering control loop ({} ms).", loop_ms);

    // ── 8. Control loop ───────────────────────────────────────
    loop {
        app.tick(clock.uptime_ms(), &mut hw, &mut ledger, &mut ui, &mut sink);
        FreeRtos::delay_ms(loop_ms);
    }
}

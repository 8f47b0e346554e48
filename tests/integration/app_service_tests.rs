//! End-to-end scenarios: panel gestures → AppService → FSM → fan, display,
//! buzzer and the verified FRAM ledger.

use std::cell::Cell;
use std::rc::Rc;

use atomu::app::events::AppEvent;
use atomu::app::ports::{BeepPattern, Screen};
use atomu::control::speed::{AirQuality, Mode};
use atomu::control::usage::FilterBand;
use atomu::fsm::{DeviceState, StateId};

use crate::mock_hw::{frame, MockFram, Rig};

fn count(rig: &Rig, pred: impl Fn(&AppEvent) -> bool) -> usize {
    rig.sink.events.iter().filter(|e| pred(e)).count()
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boots_into_sleep_with_everything_off() {
    let rig = Rig::boot(MockFram::holding(12.5));
    assert_eq!(rig.state(), DeviceState::Sleep);
    assert_eq!(rig.app.filter_usage(), 12.5);
    assert!(rig.hw.brake);
    assert!(!rig.hw.sensor_power);
    assert_eq!(rig.ui.current(), Some(&Screen::Blank));
    assert!(matches!(
        rig.sink.events.first(),
        Some(AppEvent::Started(DeviceState::Sleep))
    ));
}

#[test]
fn corrupt_ledger_boots_at_zero_and_rewrites_cell() {
    let fram = MockFram {
        bytes: [0xFF; 4],
        ..MockFram::default()
    };
    let rig = Rig::boot(fram);
    assert_eq!(rig.app.filter_usage(), 0.0);

    let fram = rig.into_fram();
    assert_eq!(fram.value(), 0.0);
    assert_eq!(fram.writes, 1);
}

#[test]
fn out_of_range_ledger_value_is_corrected() {
    let mut rig = Rig::boot(MockFram::holding(250.0));
    assert_eq!(rig.app.filter_usage(), 0.0);
    assert_eq!(rig.stored_usage(), 0.0);
}

// ── Navigation ────────────────────────────────────────────────

#[test]
fn tap_walks_through_filter_check_into_mode_select() {
    let mut rig = Rig::boot(MockFram::holding(90.0));
    assert_eq!(rig.ui.patterns, vec![BeepPattern::CLICK]);

    rig.tap();
    assert_eq!(rig.state(), DeviceState::Awake);
    assert!(rig.hw.sensor_power);
    assert!(rig.hw.brake);
    assert_eq!(rig.ui.current(), Some(&Screen::Logo));
    assert_eq!(rig.ui.patterns.len(), 2, "wake is acknowledged");

    rig.tap();
    assert_eq!(rig.state(), DeviceState::FilterCheck);
    assert!(matches!(
        rig.ui.current(),
        Some(Screen::FilterStatus {
            band: FilterBand::Warning,
            ..
        })
    ));
    assert_eq!(rig.ui.patterns.len(), 3, "seated filter is acknowledged");

    rig.run_for(3_100);
    assert_eq!(rig.state(), DeviceState::ModeSelect);
    assert_eq!(rig.ui.current(), Some(&Screen::ModeIcon(Mode::Low)));
    assert!(rig.hw.brake, "fan stays off until a mode locks in");
    assert_eq!(rig.ui.patterns.len(), 3);

    rig.run_for(3_100);
    assert_eq!(rig.state(), DeviceState::ModeActivated(Mode::Low));
    assert_eq!(rig.ui.patterns.len(), 4, "lock-in is acknowledged");
    assert!(rig.ui.patterns.iter().all(|p| *p == BeepPattern::CLICK));
}

#[test]
fn missing_filter_at_check_skips_status_screen() {
    let mut rig = Rig::boot(MockFram::holding(30.0));
    rig.tap();
    rig.hw.inputs.filter_present = false;
    rig.tap();

    assert_eq!(rig.state(), DeviceState::NoFilter);
    assert!(!rig
        .ui
        .screens
        .iter()
        .any(|s| matches!(s, Screen::FilterStatus { .. })));
    assert_eq!(rig.ui.patterns.last(), Some(&BeepPattern::NO_FILTER));
}

#[test]
fn taps_cycle_modes_and_inactivity_locks_in() {
    let mut rig = Rig::boot(MockFram::holding(0.0));
    rig.activate(2);

    assert_eq!(rig.state(), DeviceState::ModeActivated(Mode::High));
    assert!(rig.hw.fan_running());
    assert_eq!(rig.hw.speed, 75);
    let clicks = rig
        .ui
        .patterns
        .iter()
        .filter(|p| **p == BeepPattern::CLICK)
        .count();
    // Boot, wake, filter check, two mode taps, lock-in.
    assert_eq!(clicks, 6);
}

#[test]
fn tap_in_mode_activated_reopens_selection() {
    let mut rig = Rig::boot(MockFram::holding(0.0));
    rig.activate(1);
    assert_eq!(rig.state(), DeviceState::ModeActivated(Mode::Medium));

    rig.tap();
    assert_eq!(rig.state(), DeviceState::ModeSelect);
    assert_eq!(rig.app.mode(), Mode::Medium);

    rig.tap();
    rig.run_for(3_100);
    assert_eq!(rig.state(), DeviceState::ModeActivated(Mode::High));
}

#[test]
fn touch_hold_in_mode_activated_sleeps_and_brakes() {
    let mut rig = Rig::boot(MockFram::holding(0.0));
    rig.activate(0);
    assert!(rig.hw.fan_running());

    rig.hold_touch(2_500);
    assert_eq!(rig.state(), DeviceState::Sleep);
    assert!(rig.hw.brake);
    assert_eq!(rig.hw.speed, 0);
    assert!(!rig.hw.sensor_power);
    assert_eq!(rig.ui.current(), Some(&Screen::Blank));

    // Releasing a hold is not a tap.
    rig.run_for(500);
    assert_eq!(rig.state(), DeviceState::Sleep);
}

// ── Filter presence ───────────────────────────────────────────

#[test]
fn removing_filter_stops_fan_until_reinserted() {
    let mut rig = Rig::boot(MockFram::holding(0.0));
    rig.activate(0);

    rig.hw.inputs.filter_present = false;
    rig.tick();
    assert_eq!(rig.state(), DeviceState::NoFilter);
    assert!(rig.hw.brake);
    assert_eq!(rig.ui.current(), Some(&Screen::NoFilter));
    assert_eq!(rig.ui.patterns.last(), Some(&BeepPattern::NO_FILTER));

    let usage = rig.app.filter_usage();
    rig.run_for(3_000);
    assert_eq!(rig.app.filter_usage(), usage, "no wear without a filter");

    rig.hw.inputs.filter_present = true;
    rig.tick();
    assert_eq!(rig.state(), DeviceState::FilterCheck);
    rig.run_for(3_000);
    assert_eq!(rig.state(), DeviceState::ModeSelect);
}

// ── Filter wear ───────────────────────────────────────────────

#[test]
fn wear_accrues_while_running_and_persists() {
    let mut rig = Rig::boot(MockFram::holding(10.0));
    rig.activate(0);
    let start = rig.app.filter_usage();

    rig.run_for(4_000);
    let usage = rig.app.filter_usage();
    // Low is 40 % → 0.5 %/s.
    assert!(usage >= start + 1.5 && usage <= start + 2.0 + 1e-3, "usage {usage}");
    assert!((rig.stored_usage() - usage).abs() < 0.01);
}

#[test]
fn no_wear_while_asleep() {
    let mut rig = Rig::boot(MockFram::holding(10.0));
    rig.run_for(5_000);
    assert_eq!(rig.app.filter_usage(), 10.0);
    assert_eq!(rig.into_fram().writes, 0);
}

#[test]
fn near_full_filter_reaches_full_and_alerts_once() {
    let mut rig = Rig::boot(MockFram::holding(99.8));
    rig.activate(1);
    assert_eq!(rig.state(), DeviceState::ModeActivated(Mode::Medium));

    rig.run_for(2_000);
    assert_eq!(rig.app.filter_usage(), 100.0);
    assert_eq!(rig.stored_usage(), 100.0);
    assert!(matches!(rig.ui.current(), Some(Screen::FilterFull { .. })));
    assert_eq!(
        count(&rig, |e| matches!(e, AppEvent::FilterFull { .. })),
        1
    );
    assert_eq!(
        rig.ui
            .patterns
            .iter()
            .filter(|p| **p == BeepPattern::FILTER_FULL)
            .count(),
        1
    );

    // Still running, still capped, no repeat alert.
    rig.run_for(3_000);
    assert!(rig.hw.fan_running());
    assert_eq!(rig.app.filter_usage(), 100.0);
    assert_eq!(
        count(&rig, |e| matches!(e, AppEvent::FilterFull { .. })),
        1
    );
}

#[test]
fn reset_hold_from_awake_clears_full_filter() {
    let mut rig = Rig::boot(MockFram::holding(100.0));
    rig.tap();
    assert_eq!(rig.state(), DeviceState::Awake);

    rig.hold_reset(3_200);
    assert_eq!(rig.state(), DeviceState::FilterReset);
    assert_eq!(rig.ui.current(), Some(&Screen::ResetConfirmation));
    assert_eq!(rig.ui.patterns.last(), Some(&BeepPattern::RESET));
    assert_eq!(rig.app.filter_usage(), 0.0);
    assert_eq!(rig.stored_usage(), 0.0);
    assert_eq!(count(&rig, |e| matches!(e, AppEvent::FilterReset)), 1);

    rig.run_for(3_000);
    assert_eq!(rig.state(), DeviceState::Awake);
}

#[test]
fn short_reset_press_does_nothing() {
    let mut rig = Rig::boot(MockFram::holding(50.0));
    rig.tap();
    rig.hold_reset(1_500);
    assert_eq!(rig.state(), DeviceState::Awake);
    assert_eq!(rig.app.filter_usage(), 50.0);
}

#[test]
fn simultaneous_holds_favour_reset_over_touch() {
    let mut rig = Rig::boot(MockFram::holding(40.0));
    rig.activate(0);

    // Reset pressed 1 s before touch: both thresholds land on the same tick.
    rig.hw.inputs.reset_active = true;
    rig.run_for(1_000);
    rig.hw.inputs.touch_active = true;
    rig.run_for(2_100);
    rig.hw.inputs.reset_active = false;
    rig.hw.inputs.touch_active = false;
    rig.run_for(300);

    assert_eq!(rig.state(), DeviceState::FilterReset);
    assert_eq!(rig.app.filter_usage(), 0.0);
}

// ── Ledger degradation ────────────────────────────────────────

#[test]
fn failed_verification_degrades_then_recovers() {
    let worn = Rc::new(Cell::new(true));
    let fram = MockFram {
        bytes: 20.0f32.to_le_bytes(),
        drop_writes: Rc::clone(&worn),
        ..MockFram::default()
    };
    let mut rig = Rig::boot(fram);
    rig.activate(2);

    rig.run_for(3_000);
    assert!(rig.app.is_ledger_degraded());
    assert!(rig.app.filter_usage() > 20.0, "in-memory value keeps counting");
    assert_eq!(
        count(&rig, |e| matches!(e, AppEvent::LedgerDegraded { attempts: 3, .. })),
        1
    );

    worn.set(false);
    rig.run_for(1_100);
    assert!(!rig.app.is_ledger_degraded());
    assert_eq!(count(&rig, |e| matches!(e, AppEvent::LedgerRecovered)), 1);
    let usage = rig.app.filter_usage();
    assert!((rig.stored_usage() - usage).abs() < 0.01);
}

// ── Particulate sensor ────────────────────────────────────────

#[test]
fn automatic_follows_air_quality() {
    let mut rig = Rig::boot(MockFram::holding(0.0));
    rig.hw.sensor.source_mut().frame = Some(frame(5, 80, 90));
    rig.activate(3);

    assert_eq!(rig.state(), DeviceState::ModeActivated(Mode::Automatic));
    assert_eq!(rig.hw.speed, 55);
    assert_eq!(
        rig.ui.current(),
        Some(&Screen::ModeLocked {
            mode: Mode::Automatic,
            pm25: Some(80),
            air: Some(AirQuality::Moderate),
        })
    );

    rig.hw.sensor.source_mut().frame = Some(frame(50, 200, 220));
    rig.run_for(600);
    assert_eq!(rig.hw.speed, 75);
    assert!(matches!(
        rig.ui.current(),
        Some(Screen::ModeLocked {
            pm25: Some(200),
            air: Some(AirQuality::Poor),
            ..
        })
    ));
}

#[test]
fn bad_frames_keep_last_reading_and_speed() {
    let mut rig = Rig::boot(MockFram::holding(0.0));
    rig.hw.sensor.source_mut().frame = Some(frame(5, 80, 90));
    rig.activate(3);
    assert_eq!(rig.hw.speed, 55);

    let mut bad = frame(1, 500, 500);
    bad[0] = 0x00;
    rig.hw.sensor.source_mut().frame = Some(bad);
    rig.run_for(2_000);
    assert_eq!(rig.hw.speed, 55);
    assert_eq!(rig.app.reading().map(|r| r.pm25), Some(80));

    rig.run_for(5_000);
    assert_eq!(rig.hw.speed, 55);
    assert_eq!(
        count(&rig, |e| matches!(e, AppEvent::SensorStale { .. })),
        1
    );
}

#[test]
fn automatic_without_any_reading_runs_low() {
    let mut rig = Rig::boot(MockFram::holding(0.0));
    rig.activate(3);
    assert_eq!(rig.app.reading(), None);
    assert_eq!(rig.hw.speed, 40);
}

#[test]
fn sensor_is_not_polled_while_asleep() {
    let mut rig = Rig::boot(MockFram::holding(0.0));
    rig.hw.sensor.source_mut().frame = Some(frame(1, 2, 3));
    rig.run_for(3_000);
    assert_eq!(rig.hw.sensor.source_mut().reads, 0);
    assert_eq!(rig.app.reading(), None);
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn telemetry_is_emitted_on_schedule() {
    let mut rig = Rig::boot(MockFram::holding(3.0));
    rig.run_for(60_000);
    let telem: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Telemetry(t) => Some(t.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(telem.len(), 1);
    assert_eq!(telem[0].state, DeviceState::Sleep);
    assert_eq!(telem[0].filter_usage_percent, 3.0);
    assert!(telem[0].brake);
}

#[test]
fn state_changes_are_reported() {
    let mut rig = Rig::boot(MockFram::holding(0.0));
    rig.tap();
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::StateChanged {
            from: DeviceState::Sleep,
            to: DeviceState::Awake
        }
    )));
    assert_eq!(rig.app.state(), StateId::Awake);
}

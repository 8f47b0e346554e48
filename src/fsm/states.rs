//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers — no closures, no dynamic
//! dispatch, no heap.  This is the classic embedded C FSM pattern expressed
//! in safe Rust.
//!
//! ```text
//!  SLEEP ──[tap]──▶ AWAKE ──[tap]──▶ FILTER_CHECK ──[dwell]──▶ MODE_SELECT
//!    ▲               │  ▲                 │                      │    ▲
//!    │            [hold] │             [no filter]          [timeout] [tap]
//!    │               │  [dwell]           ▼                      ▼    │
//!    └───────────────┘  │            NO_FILTER ◀──[removed]── MODE_ACTIVATED
//!                       │                                         │
//!                  FILTER_RESET ◀────────────[reset hold]─────────┘
//! ```
//!
//! Every update checks its inputs in the same order: filter presence, then
//! the reset button, then the touch pad.  The first one that applies wins.

use super::context::{FsmContext, LedgerRequest, MotorCommand};
use super::{StateDescriptor, StateId};
use crate::app::ports::{BeepPattern, Screen};
use crate::control::speed::Mode;
use crate::control::usage::{FilterBand, USAGE_MAX_PERCENT};
use crate::drivers::debounce::Gesture;
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — Sleep
        StateDescriptor {
            id: StateId::Sleep,
            name: "Sleep",
            on_enter: Some(sleep_enter),
            on_exit: None,
            on_update: sleep_update,
        },
        // Index 1 — Awake
        StateDescriptor {
            id: StateId::Awake,
            name: "Awake",
            on_enter: Some(awake_enter),
            on_exit: None,
            on_update: awake_update,
        },
        // Index 2 — FilterCheck
        StateDescriptor {
            id: StateId::FilterCheck,
            name: "FilterCheck",
            on_enter: Some(filter_check_enter),
            on_exit: None,
            on_update: filter_check_update,
        },
        // Index 3 — NoFilter
        StateDescriptor {
            id: StateId::NoFilter,
            name: "NoFilter",
            on_enter: Some(no_filter_enter),
            on_exit: None,
            on_update: no_filter_update,
        },
        // Index 4 — FilterReset
        StateDescriptor {
            id: StateId::FilterReset,
            name: "FilterReset",
            on_enter: Some(filter_reset_enter),
            on_exit: None,
            on_update: filter_reset_update,
        },
        // Index 5 — ModeSelect
        StateDescriptor {
            id: StateId::ModeSelect,
            name: "ModeSelect",
            on_enter: Some(mode_select_enter),
            on_exit: None,
            on_update: mode_select_update,
        },
        // Index 6 — ModeActivated
        StateDescriptor {
            id: StateId::ModeActivated,
            name: "ModeActivated",
            on_enter: Some(mode_activated_enter),
            on_exit: Some(mode_activated_exit),
            on_update: mode_activated_update,
        },
    ]
}

fn touch_is(ctx: &FsmContext, g: Gesture) -> bool {
    ctx.inputs.touch == Some(g)
}

fn reset_held(ctx: &FsmContext) -> bool {
    ctx.inputs.reset == Some(Gesture::Hold)
}

// ═══════════════════════════════════════════════════════════════════════════
//  SLEEP — fan braked, sensor off, display dark
// ═══════════════════════════════════════════════════════════════════════════

fn sleep_enter(ctx: &mut FsmContext) {
    ctx.commands.motor = MotorCommand::STOPPED;
    ctx.commands.sensor_power = false;
    ctx.commands.screen = Some(Screen::Blank);
    ctx.commands.beep = Some(BeepPattern::CLICK);
    info!("SLEEP: fan braked, sensor powered down");
}

fn sleep_update(ctx: &mut FsmContext) -> Option<StateId> {
    if touch_is(ctx, Gesture::Tap) {
        return Some(StateId::Awake);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  AWAKE — logo shown, waiting for the user
// ═══════════════════════════════════════════════════════════════════════════

fn awake_enter(ctx: &mut FsmContext) {
    ctx.commands.motor = MotorCommand::STOPPED;
    ctx.commands.sensor_power = true;
    ctx.commands.screen = Some(Screen::Logo);
    ctx.commands.beep = Some(BeepPattern::CLICK);
    info!("AWAKE: filter at {:.1}%", ctx.filter_usage);
}

fn awake_update(ctx: &mut FsmContext) -> Option<StateId> {
    if reset_held(ctx) {
        return Some(StateId::FilterReset);
    }
    if touch_is(ctx, Gesture::Hold) {
        return Some(StateId::Sleep);
    }
    if touch_is(ctx, Gesture::Tap) {
        return Some(StateId::FilterCheck);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  FILTER_CHECK — show filter wear for a fixed dwell
// ═══════════════════════════════════════════════════════════════════════════

fn filter_check_enter(ctx: &mut FsmContext) {
    // The update hands over to NoFilter without drawing the status first.
    if !ctx.inputs.filter_present {
        return;
    }
    let band = FilterBand::from_percent(ctx.filter_usage, ctx.config.filter_warning_percent);
    ctx.commands.screen = Some(Screen::FilterStatus {
        band,
        percent: ctx.filter_usage,
    });
    ctx.commands.beep = Some(BeepPattern::CLICK);
    info!(
        "FILTER_CHECK: {:.1}% ({:?}), showing for {} ms",
        ctx.filter_usage, band, ctx.config.filter_check_dwell_ms
    );
}

fn filter_check_update(ctx: &mut FsmContext) -> Option<StateId> {
    if !ctx.inputs.filter_present {
        return Some(StateId::NoFilter);
    }
    if ctx.ms_in_state >= ctx.config.filter_check_dwell_ms {
        ctx.mode = Mode::Low;
        return Some(StateId::ModeSelect);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  NO_FILTER — fan stopped until a filter is seated
// ═══════════════════════════════════════════════════════════════════════════

fn no_filter_enter(ctx: &mut FsmContext) {
    ctx.commands.motor = MotorCommand::STOPPED;
    ctx.commands.screen = Some(Screen::NoFilter);
    ctx.commands.beep = Some(BeepPattern::NO_FILTER);
    warn!("NO_FILTER: filter missing, fan stopped");
}

fn no_filter_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.inputs.filter_present {
        info!("NO_FILTER: filter re-inserted");
        return Some(StateId::FilterCheck);
    }
    if touch_is(ctx, Gesture::Hold) {
        return Some(StateId::Sleep);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  FILTER_RESET — zero the ledger, confirm, return to Awake
// ═══════════════════════════════════════════════════════════════════════════

fn filter_reset_enter(ctx: &mut FsmContext) {
    ctx.commands.motor = MotorCommand::STOPPED;
    ctx.commands.ledger = Some(LedgerRequest::Reset);
    ctx.commands.screen = Some(Screen::ResetConfirmation);
    ctx.commands.beep = Some(BeepPattern::RESET);
    info!(
        "FILTER_RESET: usage {:.1}% -> 0.0%",
        ctx.filter_usage
    );
    ctx.filter_usage = 0.0;
    ctx.filter_full_notified = false;
}

fn filter_reset_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.ms_in_state >= ctx.config.filter_reset_dwell_ms {
        return Some(StateId::Awake);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  MODE_SELECT — taps cycle the mode, inactivity locks it in
// ═══════════════════════════════════════════════════════════════════════════

fn mode_select_enter(ctx: &mut FsmContext) {
    ctx.select_activity_ms = ctx.now_ms;
    ctx.commands.screen = Some(Screen::ModeIcon(ctx.mode));
    info!("MODE_SELECT: starting at {}", ctx.mode.name());
}

fn mode_select_update(ctx: &mut FsmContext) -> Option<StateId> {
    if !ctx.inputs.filter_present {
        return Some(StateId::NoFilter);
    }
    if touch_is(ctx, Gesture::Hold) {
        return Some(StateId::Sleep);
    }
    if touch_is(ctx, Gesture::Tap) {
        ctx.mode = ctx.mode.next();
        ctx.select_activity_ms = ctx.now_ms;
        ctx.commands.screen = Some(Screen::ModeIcon(ctx.mode));
        ctx.commands.beep = Some(BeepPattern::CLICK);
        info!("MODE_SELECT: {}", ctx.mode.name());
        return None;
    }
    if ctx.now_ms.wrapping_sub(ctx.select_activity_ms) >= ctx.config.mode_select_timeout_ms {
        return Some(StateId::ModeActivated);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  MODE_ACTIVATED — fan running at the mode's target
// ═══════════════════════════════════════════════════════════════════════════

fn mode_activated_enter(ctx: &mut FsmContext) {
    ctx.commands.motor = MotorCommand::run(ctx.target_speed());
    ctx.commands.sensor_power = true;
    ctx.shown_pm25 = ctx.reading.map(|r| r.pm25);
    ctx.commands.screen = Some(if ctx.filter_full_notified {
        Screen::FilterFull {
            percent: ctx.filter_usage,
        }
    } else {
        ctx.mode_locked_screen()
    });
    ctx.commands.beep = Some(BeepPattern::CLICK);
    info!(
        "MODE_ACTIVATED: {} at {}%",
        ctx.mode.name(),
        ctx.commands.motor.speed_percent
    );
}

fn mode_activated_exit(ctx: &mut FsmContext) {
    ctx.shown_pm25 = None;
}

fn mode_activated_update(ctx: &mut FsmContext) -> Option<StateId> {
    if !ctx.inputs.filter_present {
        return Some(StateId::NoFilter);
    }
    if reset_held(ctx) {
        return Some(StateId::FilterReset);
    }
    if touch_is(ctx, Gesture::Hold) {
        return Some(StateId::Sleep);
    }
    if touch_is(ctx, Gesture::Tap) {
        return Some(StateId::ModeSelect);
    }

    // Automatic re-evaluates every tick; fixed modes are constant.
    ctx.commands.motor = MotorCommand::run(ctx.target_speed());

    if ctx.filter_usage >= USAGE_MAX_PERCENT {
        if !ctx.filter_full_notified {
            ctx.filter_full_notified = true;
            ctx.commands.screen = Some(Screen::FilterFull {
                percent: ctx.filter_usage,
            });
            ctx.commands.beep = Some(BeepPattern::FILTER_FULL);
            warn!("MODE_ACTIVATED: filter full, hold reset to clear");
        }
        return None;
    }

    let pm25 = ctx.reading.map(|r| r.pm25);
    let moved = match (ctx.shown_pm25, pm25) {
        (Some(shown), Some(now)) => shown.abs_diff(now) >= ctx.config.pm25_redraw_delta,
        (None, Some(_)) => true,
        _ => false,
    };
    if moved {
        ctx.shown_pm25 = pm25;
        ctx.commands.screen = Some(ctx.mode_locked_screen());
    }

    None
}

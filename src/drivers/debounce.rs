//! Polled input debouncer with tap / hold gesture classification.
//!
//! ## Algorithm
//!
//! The control loop samples each input once per tick and feeds the logical
//! level to [`Debouncer::poll`].  A level change is accepted only if at
//! least `debounce_window_ms` has passed since the previous accepted change;
//! otherwise the sample is discarded and the latched level is kept.
//!
//! | Raw event                       | Emitted                       |
//! |---------------------------------|-------------------------------|
//! | accepted 0 → 1                  | `PressStart(now)`             |
//! | still 1, `held ≥ hold_min_ms`   | `HoldThresholdCrossed(held)`  (once per press) |
//! | accepted 1 → 0                  | `ReleaseAfter(held)`          |
//!
//! [`Debouncer::classify`] turns those into [`Gesture`]s:
//!
//! | Event                                    | Gesture |
//! |------------------------------------------|---------|
//! | `ReleaseAfter(d)`, `d < tap_max_ms`      | `Tap`   |
//! | `HoldThresholdCrossed(_)`                | `Hold`  |
//! | `ReleaseAfter(d)`, `d ≥ hold_min_ms`, hold not yet reported | `Hold` |
//! | anything else                            | none    |
//!
//! All timestamps are `u32` milliseconds and use wrapping arithmetic, so the
//! ~49-day rollover of the uptime counter is harmless.

use crate::config::SystemConfig;

/// Raw debounced edge/hold event for one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    /// Accepted press edge, carrying its timestamp.
    PressStart(u32),
    /// Accepted release edge, carrying how long the press lasted.
    ReleaseAfter(u32),
    /// The press has lasted `hold_min_ms`; carries the held duration.
    HoldThresholdCrossed(u32),
}

/// Semantic gesture consumed by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Tap,
    Hold,
}

/// Per-instance timing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    pub debounce_window_ms: u32,
    pub tap_max_ms: u32,
    pub hold_min_ms: u32,
}

impl DebounceConfig {
    /// Touch pad: tap below `tap_max_ms`, hold at `touch_hold_ms`.
    pub fn touch(cfg: &SystemConfig) -> Self {
        Self {
            debounce_window_ms: cfg.debounce_window_ms,
            tap_max_ms: cfg.tap_max_ms,
            hold_min_ms: cfg.touch_hold_ms,
        }
    }

    /// Reset button: hold at `reset_hold_ms`.
    pub fn reset(cfg: &SystemConfig) -> Self {
        Self {
            debounce_window_ms: cfg.debounce_window_ms,
            tap_max_ms: cfg.tap_max_ms,
            hold_min_ms: cfg.reset_hold_ms,
        }
    }
}

/// Edge/hold classifier for a single boolean input.
#[derive(Debug, Clone)]
pub struct Debouncer {
    cfg: DebounceConfig,
    /// Latched (accepted) level.
    level: bool,
    /// Time of the last accepted transition; `None` until the first one.
    last_transition_ms: Option<u32>,
    press_start_ms: u32,
    /// `HoldThresholdCrossed` already emitted for the current press.
    hold_reported: bool,
}

impl Debouncer {
    pub fn new(cfg: DebounceConfig) -> Self {
        Self {
            cfg,
            level: false,
            last_transition_ms: None,
            press_start_ms: 0,
            hold_reported: false,
        }
    }

    pub fn config(&self) -> DebounceConfig {
        self.cfg
    }

    /// Current latched level.
    pub fn is_pressed(&self) -> bool {
        self.level
    }

    /// Feed one sample.  Returns at most one event per call.
    pub fn poll(&mut self, level: bool, now_ms: u32) -> Option<GestureEvent> {
        if level != self.level {
            if let Some(last) = self.last_transition_ms {
                if now_ms.wrapping_sub(last) < self.cfg.debounce_window_ms {
                    return None;
                }
            }
            self.level = level;
            self.last_transition_ms = Some(now_ms);

            if level {
                self.press_start_ms = now_ms;
                self.hold_reported = false;
                return Some(GestureEvent::PressStart(now_ms));
            }
            return Some(GestureEvent::ReleaseAfter(
                now_ms.wrapping_sub(self.press_start_ms),
            ));
        }

        if self.level && !self.hold_reported {
            let held = now_ms.wrapping_sub(self.press_start_ms);
            if held >= self.cfg.hold_min_ms {
                self.hold_reported = true;
                return Some(GestureEvent::HoldThresholdCrossed(held));
            }
        }

        None
    }

    /// Map a raw event from this instance to a gesture.
    ///
    /// Must be called before the next `poll`, since a release is only a
    /// `Hold` if the threshold was not already reported for that press.
    pub fn classify(&self, event: GestureEvent) -> Option<Gesture> {
        match event {
            GestureEvent::PressStart(_) => None,
            GestureEvent::HoldThresholdCrossed(_) => Some(Gesture::Hold),
            GestureEvent::ReleaseAfter(held) if held < self.cfg.tap_max_ms => Some(Gesture::Tap),
            GestureEvent::ReleaseAfter(held)
                if held >= self.cfg.hold_min_ms && !self.hold_reported =>
            {
                Some(Gesture::Hold)
            }
            GestureEvent::ReleaseAfter(_) => None,
        }
    }

    /// `poll` followed by `classify`.
    pub fn poll_gesture(&mut self, level: bool, now_ms: u32) -> Option<Gesture> {
        let event = self.poll(level, now_ms)?;
        self.classify(event)
    }
}

//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  StateTable                                                 │
//! │  ┌───────────────┬───────────┬──────────┬─────────────────┐ │
//! │  │ StateId       │ on_enter  │ on_exit  │ on_update       │ │
//! │  ├───────────────┼───────────┼──────────┼─────────────────┤ │
//! │  │ Sleep         │ fn(ctx)   │ -        │ fn(ctx)->Option │ │
//! │  │ Awake         │ fn(ctx)   │ -        │ fn(ctx)->Option │ │
//! │  │ FilterCheck   │ fn(ctx)   │ -        │ fn(ctx)->Option │ │
//! │  │ NoFilter      │ fn(ctx)   │ -        │ fn(ctx)->Option │ │
//! │  │ FilterReset   │ fn(ctx)   │ -        │ fn(ctx)->Option │ │
//! │  │ ModeSelect    │ fn(ctx)   │ -        │ fn(ctx)->Option │ │
//! │  │ ModeActivated │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option │ │
//! │  └───────────────┴───────────┴──────────┴─────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the
//! current pointer.  All functions receive `&mut FsmContext` which
//! holds gestures, the last sensor reading, cached filter usage,
//! actuator commands, config, and timing.
//!
//! The table is keyed by the payload-free [`StateId`]; the selected
//! [`Mode`] lives in the context, and [`DeviceState`] recombines the two
//! for reporting.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;
use serde::Serialize;

use crate::control::speed::Mode;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all table states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum StateId {
    Sleep = 0,
    Awake = 1,
    FilterCheck = 2,
    NoFilter = 3,
    FilterReset = 4,
    ModeSelect = 5,
    ModeActivated = 6,
}

impl StateId {
    /// Total number of states — used to size the table array.
    pub const COUNT: usize = 7;

    /// Convert an index back to `StateId`.  Panics on out-of-range in
    /// debug builds; returns `Sleep` in release (fan braked, safe).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Sleep,
            1 => Self::Awake,
            2 => Self::FilterCheck,
            3 => Self::NoFilter,
            4 => Self::FilterReset,
            5 => Self::ModeSelect,
            6 => Self::ModeActivated,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Sleep
            }
        }
    }
}

/// Externally visible device state, with the active mode folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeviceState {
    Sleep,
    Awake,
    FilterCheck,
    NoFilter,
    FilterReset,
    ModeSelect,
    ModeActivated(Mode),
}

impl DeviceState {
    pub fn from_parts(id: StateId, mode: Mode) -> Self {
        match id {
            StateId::Sleep => Self::Sleep,
            StateId::Awake => Self::Awake,
            StateId::FilterCheck => Self::FilterCheck,
            StateId::NoFilter => Self::NoFilter,
            StateId::FilterReset => Self::FilterReset,
            StateId::ModeSelect => Self::ModeSelect,
            StateId::ModeActivated => Self::ModeActivated(mode),
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array — no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table (array of [`StateDescriptor`]); the mutable
/// [`FsmContext`] is threaded through every handler call.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// `ctx.now_ms` at which the current state was entered.
    state_entry_ms: u32,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            state_entry_ms: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        self.state_entry_ms = ctx.now_ms;
        ctx.ms_in_state = 0;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    ///
    /// 1. Refresh `ctx.ms_in_state`.
    /// 2. Call `on_update` for the current state.
    /// 3. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        ctx.ms_in_state = ctx.now_ms.wrapping_sub(self.state_entry_ms);

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.state_entry_ms = ctx.now_ms;
        ctx.ms_in_state = 0;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

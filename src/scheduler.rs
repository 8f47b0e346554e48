//! Tick-driven periodic task scheduler.
//!
//! Replaces fixed `sleep`-based polling with due-time bookkeeping on the
//! monotonic millisecond clock.  The scheduler notifies a
//! [`SchedulerDelegate`] when a task is due; the
//! [`AppService`](crate::app::service::AppService) collects the fired set
//! and acts on it within the same tick.
//!
//! ```text
//!   uptime_ms ──▶ Scheduler::poll ──▶ SchedulerDelegate::on_task_fired
//!                                         │
//!                 ┌───────────────────────┼────────────────────┐
//!                 ▼                       ▼                    ▼
//!            SensorPoll             UsageAccrual           Telemetry
//! ```
//!
//! Due times advance by exactly one period per fire, so accrual intervals
//! do not drift with loop jitter.  A task that falls more than two periods
//! behind is resynchronised to `now` instead of firing a burst.

use crate::app::ports::SchedulerDelegate;
use log::{debug, info};

// ═══════════════════════════════════════════════════════════════
//  Task types
// ═══════════════════════════════════════════════════════════════

/// Periodic jobs owned by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskId {
    /// Read the particulate sensor.
    SensorPoll,
    /// Advance filter wear and persist it.
    UsageAccrual,
    /// Emit a telemetry snapshot.
    Telemetry,
}

/// A single periodic task registration.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicTask {
    pub id: TaskId,
    pub period_ms: u32,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent tasks (stack-allocated).
const MAX_TASKS: usize = 4;

/// Internal bookkeeping for a live task.
#[derive(Debug, Clone, Copy)]
struct TaskEntry {
    task: PeriodicTask,
    /// Time the current period started.
    last_ms: u32,
}

pub struct Scheduler {
    tasks: [Option<TaskEntry>; MAX_TASKS],
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: [None; MAX_TASKS],
        }
    }

    /// Register a task whose first period starts at `now_ms`.
    /// Returns the slot index, or `None` if full.
    pub fn add(&mut self, task: PeriodicTask, now_ms: u32) -> Option<usize> {
        for (i, slot) in self.tasks.iter_mut().enumerate() {
            if slot.is_none() {
                info!(
                    "Scheduler: added {:?} every {} ms at slot {}",
                    task.id, task.period_ms, i
                );
                *slot = Some(TaskEntry {
                    task,
                    last_ms: now_ms,
                });
                return Some(i);
            }
        }
        None
    }

    /// Start a fresh period for `id` at `now_ms` (e.g. when the fan starts).
    pub fn restart(&mut self, id: TaskId, now_ms: u32) {
        if let Some(entry) = self.entry_mut(id) {
            entry.last_ms = now_ms;
        }
    }

    /// Fire every due task.  Call once per control loop tick.
    pub fn poll(&mut self, now_ms: u32, delegate: &mut dyn SchedulerDelegate) {
        for entry in self.tasks.iter_mut().flatten() {
            let period = entry.task.period_ms;
            let elapsed = now_ms.wrapping_sub(entry.last_ms);
            if elapsed < period {
                continue;
            }

            if elapsed >= period.saturating_mul(2) {
                debug!(
                    "Scheduler: {:?} {} ms late, resynchronising",
                    entry.task.id,
                    elapsed - period
                );
                entry.last_ms = now_ms;
            } else {
                entry.last_ms = entry.last_ms.wrapping_add(period);
            }
            delegate.on_task_fired(entry.task.id);
        }
    }

    fn entry_mut(&mut self, id: TaskId) -> Option<&mut TaskEntry> {
        self.tasks.iter_mut().flatten().find(|e| e.task.id == id)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

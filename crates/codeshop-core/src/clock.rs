//! Simulation clock and the Clock Driver's `tick` command.
//!
//! The tick counter is the logical clock for every timestamp in the store.
//! Each tick advances the counter first, then adds one unit of progress to
//! every in-progress task with a live assignee. A task that reaches its
//! estimate moves to `review`; nothing ever regresses.

use codeshop_types::{Change, TaskId, TaskStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::store::EntityStore;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Monotonic tick counter plus the simulation pause flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    /// Current tick number (starts at 0, incremented by each tick).
    tick: u64,

    /// While set, `tick` is a no-op.
    paused: bool,
}

impl SimClock {
    /// Create a clock at tick 0, running.
    pub const fn new() -> Self {
        Self {
            tick: 0,
            paused: false,
        }
    }

    /// Create a clock from explicit parts (state restoration and tests).
    pub const fn from_parts(tick: u64, paused: bool) -> Self {
        Self { tick, paused }
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Whether the simulation is paused.
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause or resume the simulation.
    pub const fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }
}

/// Summary of a single executed tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Tasks that gained a unit of progress.
    pub progressed: u32,
    /// Tasks that reached their estimate and moved to `review`.
    pub completed: Vec<TaskId>,
}

impl EntityStore {
    /// Advance simulation time by one tick.
    ///
    /// Returns `None` without touching anything while the clock is paused
    /// or when the counter is exhausted.
    pub fn tick(&mut self) -> Option<TickSummary> {
        self.try_tick().unwrap_or_else(|err| {
            warn!(error = %err, "Clock cannot advance");
            None
        })
    }

    /// Advance simulation time by one tick, reporting counter exhaustion.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter is at its
    /// maximum.
    pub fn try_tick(&mut self) -> Result<Option<TickSummary>, ClockError> {
        if self.clock.is_paused() {
            debug!("Tick skipped while paused");
            return Ok(None);
        }
        let tick = self.clock.advance()?;

        let mut summary = TickSummary {
            tick,
            ..TickSummary::default()
        };

        for task in self.tasks.values_mut() {
            if task.status != TaskStatus::InProgress {
                continue;
            }
            let has_live_assignee = task.assignee_id.is_some_and(|id| {
                self.employees
                    .get(&id)
                    .is_some_and(|employee| employee.current_task_id == Some(task.id))
            });
            if !has_live_assignee {
                continue;
            }
            task.progress_ticks = task
                .progress_ticks
                .saturating_add(1)
                .min(task.estimated_ticks);
            summary.progressed = summary.progressed.saturating_add(1);

            if task.progress_ticks >= task.estimated_ticks {
                task.status = TaskStatus::Review;
                task.completed_at = Some(tick);
                summary.completed.push(task.id);
            }
        }

        self.emit(Change::Ticked);
        for task_id in &summary.completed {
            debug!(task_id = %task_id, tick, "Task reached review");
            self.emit(Change::TaskStatusChanged {
                task_id: *task_id,
                status: TaskStatus::Review,
            });
        }
        Ok(Some(summary))
    }
}

//! Run control shared by the clock loop, the queue loop and the observer
//! API.
//!
//! The run is always in one `RunMode`, published through a `watch`
//! channel: loops that must hold still while paused subscribe and wait for
//! the mode to change. Tick speed is a plain atomic read on every tick.
//! Stopping is terminal; neither pause nor resume leaves it.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Notify, watch};

use crate::config::SimulationSettings;

/// Smallest accepted tick interval.
pub const MIN_TICK_INTERVAL_MS: u64 = 100;

/// Why a run finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationEndReason {
    /// The clock hit `max_ticks`.
    MaxTicksReached,
    /// Wall-clock time hit `max_real_time_seconds`.
    MaxRealTimeReached,
    /// Stopped through the operator API.
    OperatorStop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    Running,
    Paused,
    Stopping,
}

/// Limits after which the clock loop ends the run. Zero means no limit.
#[derive(Debug, Clone, Copy)]
struct RunBounds {
    max_ticks: u64,
    max_real_time: Duration,
}

/// Shared run control, held in an `Arc` by every participant.
#[derive(Debug)]
pub struct OperatorState {
    mode: watch::Sender<RunMode>,
    process_now: Notify,
    tick_interval_ms: AtomicU64,
    queue_interval: Duration,
    bounds: RunBounds,
    started: Instant,
    started_at: DateTime<Utc>,
    end_reason: OnceLock<SimulationEndReason>,
}

impl OperatorState {
    /// Build run control from the simulation settings. The run starts in
    /// the running mode.
    pub fn new(settings: &SimulationSettings) -> Self {
        let (mode, _) = watch::channel(RunMode::Running);
        Self {
            mode,
            process_now: Notify::new(),
            tick_interval_ms: AtomicU64::new(settings.tick_interval_ms),
            queue_interval: Duration::from_millis(settings.queue_interval_ms.max(1)),
            bounds: RunBounds {
                max_ticks: settings.max_ticks,
                max_real_time: Duration::from_secs(settings.max_real_time_seconds),
            },
            started: Instant::now(),
            started_at: Utc::now(),
            end_reason: OnceLock::new(),
        }
    }

    fn current_mode(&self) -> RunMode {
        *self.mode.borrow()
    }

    // -----------------------------------------------------------------------
    // Mode
    // -----------------------------------------------------------------------

    /// True while paused. A stopping run is never reported as paused.
    pub fn is_paused(&self) -> bool {
        self.current_mode() == RunMode::Paused
    }

    /// True once a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.current_mode() == RunMode::Stopping
    }

    /// Hold both loops. No effect once stopping.
    pub fn pause(&self) {
        self.mode.send_if_modified(|mode| {
            let changed = *mode == RunMode::Running;
            if changed {
                *mode = RunMode::Paused;
            }
            changed
        });
    }

    /// Release both loops. No effect once stopping.
    pub fn resume(&self) {
        self.mode.send_if_modified(|mode| {
            let changed = *mode == RunMode::Paused;
            if changed {
                *mode = RunMode::Running;
            }
            changed
        });
    }

    /// Return as soon as the run is not paused.
    pub async fn wait_if_paused(&self) {
        let mut mode = self.mode.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = mode.wait_for(|mode| *mode != RunMode::Paused).await;
    }

    /// Move to the stopping mode and wake both loops.
    pub fn request_stop(&self) {
        self.mode.send_replace(RunMode::Stopping);
        self.process_now.notify_one();
    }

    /// Record why the run ended. Later calls are ignored.
    pub fn set_end_reason(&self, reason: SimulationEndReason) {
        let _ = self.end_reason.set(reason);
    }

    /// Why the run ended, once it has.
    pub fn end_reason(&self) -> Option<SimulationEndReason> {
        self.end_reason.get().copied()
    }

    // -----------------------------------------------------------------------
    // Queue pacing
    // -----------------------------------------------------------------------

    /// Wake the queue loop now instead of at the end of its interval.
    pub fn request_processing(&self) {
        self.process_now.notify_one();
    }

    /// Sleep for one queue interval, or less if processing is requested.
    pub async fn wait_for_queue_turn(&self) {
        tokio::select! {
            () = tokio::time::sleep(self.queue_interval) => {}
            () = self.process_now.notified() => {}
        }
    }

    /// Queue loop interval in milliseconds.
    pub fn queue_interval_ms(&self) -> u64 {
        u64::try_from(self.queue_interval.as_millis()).unwrap_or(u64::MAX)
    }

    // -----------------------------------------------------------------------
    // Tick pacing
    // -----------------------------------------------------------------------

    /// Milliseconds the clock loop sleeps between ticks.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Change the tick interval and return the old one. Values under
    /// [`MIN_TICK_INTERVAL_MS`] are refused with `None`.
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        (ms >= MIN_TICK_INTERVAL_MS).then(|| self.tick_interval_ms.swap(ms, Ordering::AcqRel))
    }

    // -----------------------------------------------------------------------
    // Limits
    // -----------------------------------------------------------------------

    /// Whether the clock has hit the tick limit.
    pub const fn tick_limit_reached(&self, current_tick: u64) -> bool {
        let limit = self.bounds.max_ticks;
        limit != 0 && current_tick >= limit
    }

    /// Whether the run has used up its wall-clock allowance.
    pub fn time_limit_reached(&self) -> bool {
        let limit = self.bounds.max_real_time;
        !limit.is_zero() && self.started.elapsed() >= limit
    }

    /// Whole seconds since the run started.
    pub fn elapsed_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Tick limit, 0 when unbounded.
    pub const fn max_ticks(&self) -> u64 {
        self.bounds.max_ticks
    }

    /// Wall-clock limit in seconds, 0 when unbounded.
    pub const fn max_real_time_seconds(&self) -> u64 {
        self.bounds.max_real_time.as_secs()
    }

    /// Snapshot for the operator status endpoint, stamped with `tick`.
    pub fn status(&self, tick: u64) -> OperatorStatus {
        OperatorStatus {
            tick,
            paused: self.is_paused(),
            stop_requested: self.is_stop_requested(),
            tick_interval_ms: self.tick_interval_ms(),
            queue_interval_ms: self.queue_interval_ms(),
            elapsed_seconds: self.elapsed_seconds(),
            max_ticks: self.max_ticks(),
            max_real_time_seconds: self.max_real_time_seconds(),
            end_reason: self.end_reason(),
            started_at: self.started_at.to_rfc3339(),
        }
    }
}

/// What `GET /api/operator/status` reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorStatus {
    /// Clock tick at the time of the request.
    pub tick: u64,
    /// Loops are held.
    pub paused: bool,
    /// The run is winding down.
    pub stop_requested: bool,
    /// Clock loop sleep in milliseconds.
    pub tick_interval_ms: u64,
    /// Queue loop sleep in milliseconds.
    pub queue_interval_ms: u64,
    /// Whole seconds since start.
    pub elapsed_seconds: u64,
    /// Tick limit, 0 when unbounded.
    pub max_ticks: u64,
    /// Wall-clock limit in seconds, 0 when unbounded.
    pub max_real_time_seconds: u64,
    /// Set once the run has ended.
    pub end_reason: Option<SimulationEndReason>,
    /// Start time, RFC 3339.
    pub started_at: String,
}

//! Simulation driver with operator controls.
//!
//! [`run_simulation`] drives two interleaved loops over one shared store:
//!
//! - **Clock loop**: advances the clock once per tick interval, runs the
//!   advisor when it is due, and hands change events to the observer.
//! - **Queue loop**: processes one AI work item per queue interval (or on
//!   demand), releasing the store lock while the generator runs.
//!
//! Both loops honor pause, resume, and stop. The run ends on the first of
//! `max_ticks`, `max_real_time_seconds`, or an operator stop.

use std::sync::Arc;
use std::time::Duration;

use codeshop_types::ChangeEvent;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock::{ClockError, TickSummary};
use crate::generation::ArtifactGenerator;
use crate::operator::{OperatorState, SimulationEndReason};
use crate::queue::WorkOutcome;
use crate::store::EntityStore;

/// The store as shared between the loops and the observer API.
pub type SharedStore = Arc<Mutex<EntityStore>>;

/// Errors that end a run early.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The clock could not advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Outcome of a run.
#[derive(Debug)]
pub struct SimulationResult {
    /// Why the run ended.
    pub end_reason: SimulationEndReason,
    /// Summary of the last tick executed, if any.
    pub final_summary: Option<TickSummary>,
    /// Ticks executed during this run.
    pub total_ticks: u64,
    /// Work items the queue loop processed during this run.
    pub processed_items: u64,
}

/// Receives change events drained from the store.
///
/// Called without the store lock held.
pub trait ChangeObserver: Send + Sync {
    /// Handle a batch of change events, oldest first.
    fn on_events(&self, events: &[ChangeEvent]);
}

/// An observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl ChangeObserver for NoOpObserver {
    fn on_events(&self, _events: &[ChangeEvent]) {}
}

/// Process the head of the AI work queue, if any.
///
/// The store is locked to claim the item, unlocked while `generator`
/// runs, and locked again to merge the result. Returns `None` when there
/// was nothing to do.
pub async fn process_one<G: ArtifactGenerator>(
    store: &SharedStore,
    generator: &G,
) -> Option<WorkOutcome> {
    let request = store.lock().await.begin_ai_work()?;
    debug!(
        work_item_id = %request.work_item_id,
        task_id = %request.task_id,
        role = ?request.role,
        "Generating"
    );

    let result = generator.generate(&request).await;
    if let Err(err) = &result {
        warn!(work_item_id = %request.work_item_id, error = %err, "Generation failed");
    }
    Some(store.lock().await.finish_ai_work(request.work_item_id, result))
}

/// Run both loops until a termination condition is met.
///
/// # Errors
///
/// Returns [`RunnerError`] if the clock cannot advance.
pub async fn run_simulation<G: ArtifactGenerator>(
    store: &SharedStore,
    generator: &G,
    operator: &Arc<OperatorState>,
    observer: &dyn ChangeObserver,
) -> Result<SimulationResult, RunnerError> {
    info!(
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        queue_interval_ms = operator.queue_interval_ms(),
        "Simulation starting"
    );

    let (clock, processed_items) = tokio::join!(
        clock_loop(store, operator, observer),
        queue_loop(store, generator, operator, observer),
    );
    let (end_reason, final_summary, total_ticks) = clock?;

    Ok(SimulationResult {
        end_reason,
        final_summary,
        total_ticks,
        processed_items,
    })
}

async fn clock_loop(
    store: &SharedStore,
    operator: &OperatorState,
    observer: &dyn ChangeObserver,
) -> Result<(SimulationEndReason, Option<TickSummary>, u64), RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    let outcome = loop {
        if operator.is_paused() {
            info!("Simulation paused, waiting for resume");
            operator.wait_if_paused().await;
            info!("Simulation resumed");
        }

        if operator.is_stop_requested() {
            info!("Operator stop requested");
            break Ok(SimulationEndReason::OperatorStop);
        }
        if operator.time_limit_reached() {
            info!(
                max_seconds = operator.max_real_time_seconds(),
                elapsed = operator.elapsed_seconds(),
                "Real-time limit reached"
            );
            break Ok(SimulationEndReason::MaxRealTimeReached);
        }

        let (summary, events) = {
            let mut guard = store.lock().await;
            let summary = match guard.try_tick() {
                Ok(summary) => summary,
                Err(err) => break Err(RunnerError::from(err)),
            };
            let proposals = guard.run_advisor_if_due();
            if !proposals.is_empty() {
                debug!(count = proposals.len(), "Advisor proposed");
            }
            (summary, guard.drain_events())
        };
        if !events.is_empty() {
            observer.on_events(&events);
        }

        if let Some(summary) = summary {
            total_ticks = total_ticks.saturating_add(1);
            let tick = summary.tick;
            last_summary = Some(summary);
            if operator.tick_limit_reached(tick) {
                info!(tick, max_ticks = operator.max_ticks(), "Tick limit reached");
                break Ok(SimulationEndReason::MaxTicksReached);
            }
        }

        let interval_ms = operator.tick_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
        }
    };

    // Whatever ended the clock also ends the queue loop.
    operator.request_stop();
    let reason = outcome?;
    operator.set_end_reason(reason);
    Ok((reason, last_summary, total_ticks))
}

async fn queue_loop<G: ArtifactGenerator>(
    store: &SharedStore,
    generator: &G,
    operator: &OperatorState,
    observer: &dyn ChangeObserver,
) -> u64 {
    let mut processed: u64 = 0;
    loop {
        operator.wait_if_paused().await;
        if operator.is_stop_requested() {
            break;
        }

        if let Some(outcome) = process_one(store, generator).await {
            processed = processed.saturating_add(1);
            debug!(outcome = ?outcome, "Work item processed");
            let events = store.lock().await.drain_events();
            if !events.is_empty() {
                observer.on_events(&events);
            }
        }

        if operator.is_stop_requested() {
            break;
        }
        operator.wait_for_queue_turn().await;
    }
    info!(processed, "Queue loop stopped");
    processed
}

/// Log the end of a run.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        processed_items = result.processed_items,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "Simulation ended"
    );
    if result.final_summary.is_none() {
        warn!("Simulation ended with no ticks executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use codeshop_types::{
        Change, EmployeeRole, GenerationOutput, GenerationRequest, TaskDefinition, TaskStatus,
        TaskType,
    };

    use super::*;
    use crate::config::{CompanyConfig, SimulationSettings};
    use crate::generation::{GenerationError, ScriptedGenerator};

    #[derive(Default)]
    struct Recorder {
        events: StdMutex<Vec<ChangeEvent>>,
    }

    impl ChangeObserver for Recorder {
        fn on_events(&self, events: &[ChangeEvent]) {
            self.events.lock().unwrap().extend_from_slice(events);
        }
    }

    struct FailingGenerator;

    impl ArtifactGenerator for FailingGenerator {
        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<GenerationOutput, GenerationError> {
            Err(GenerationError::Provider {
                message: "quota exhausted".to_owned(),
            })
        }
    }

    fn fast_config(max_ticks: u64) -> CompanyConfig {
        CompanyConfig {
            simulation: SimulationSettings {
                tick_interval_ms: 1,
                queue_interval_ms: 1,
                max_ticks,
                ..SimulationSettings::default()
            },
            ..CompanyConfig::default()
        }
    }

    fn shared(config: CompanyConfig) -> (SharedStore, Arc<OperatorState>) {
        let operator = Arc::new(OperatorState::new(&config.simulation));
        (Arc::new(Mutex::new(EntityStore::new(config))), operator)
    }

    #[tokio::test]
    async fn runs_until_tick_limit() {
        let (store, operator) = shared(fast_config(5));
        let recorder = Recorder::default();

        let result = run_simulation(&store, &ScriptedGenerator::new(), &operator, &recorder)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(store.lock().await.current_tick(), 5);
        let ticked = recorder
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.change == Change::Ticked)
            .count();
        assert_eq!(ticked, 5);
        assert_eq!(
            operator.end_reason(),
            Some(SimulationEndReason::MaxTicksReached)
        );
    }

    #[tokio::test]
    async fn operator_stop_ends_run() {
        let (store, operator) = shared(fast_config(0));
        operator.request_stop();
        let result = run_simulation(&store, &ScriptedGenerator::new(), &operator, &NoOpObserver)
            .await
            .unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert_eq!(result.total_ticks, 0);
    }

    #[tokio::test]
    async fn assigned_work_is_generated_while_ticking() {
        let (store, operator) = shared(fast_config(20));
        let task = {
            let mut guard = store.lock().await;
            let ada = guard.hire("Ada", EmployeeRole::Engineer).unwrap();
            let task = guard.create_task(&TaskDefinition::new("Login", "", TaskType::Feature, 50));
            guard.assign(task, ada);
            task
        };

        let result = run_simulation(&store, &ScriptedGenerator::new(), &operator, &NoOpObserver)
            .await
            .unwrap();

        let guard = store.lock().await;
        let task = guard.task(task).unwrap();
        assert!(result.processed_items >= 1);
        assert!(task.ai_work_completed);
        assert_eq!(task.status, TaskStatus::Review);
        assert!(!task.artifacts.is_empty());
        assert!(guard.queue().is_empty());
    }

    #[tokio::test]
    async fn process_one_drops_after_repeated_failure() {
        let (store, _operator) = shared(CompanyConfig::default());
        let task = {
            let mut guard = store.lock().await;
            let ada = guard.hire("Ada", EmployeeRole::Engineer).unwrap();
            let task = guard.create_task(&TaskDefinition::new("Login", "", TaskType::Feature, 5));
            guard.assign(task, ada);
            task
        };

        for _ in 0..2 {
            assert_eq!(
                process_one(&store, &FailingGenerator).await,
                Some(WorkOutcome::Retried)
            );
        }
        assert_eq!(
            process_one(&store, &FailingGenerator).await,
            Some(WorkOutcome::Dropped)
        );
        assert_eq!(process_one(&store, &FailingGenerator).await, None);

        let guard = store.lock().await;
        assert!(!guard.queue().contains_task(task));
        assert!(!guard.task(task).unwrap().ai_work_completed);
    }

    #[tokio::test]
    async fn empty_queue_is_a_no_op() {
        let (store, _operator) = shared(CompanyConfig::default());
        assert_eq!(process_one(&store, &ScriptedGenerator::new()).await, None);
    }
}

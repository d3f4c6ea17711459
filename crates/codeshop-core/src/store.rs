//! The Entity Store: every collection of the company plus the outbox of
//! change events.
//!
//! The store is an explicit service object. Each loop (clock, queue
//! processor, advisor) and the observer API mutate it only through its
//! command methods, which are spread over the modules of this crate as
//! `impl EntityStore` blocks. Commands never return errors: unknown ids are
//! no-ops and user-visible failures go to the notification side-channel.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::Utc;
use codeshop_types::{
    Change, ChangeEvent, CompanyStats, Employee, EmployeeId, EmployeeStatus, HireIntent,
    LedgerEntry, Mission, MissionId, Notification, NotificationId, Proposal, ProposalId,
    Severity, Task, TaskDefinition, TaskId, TaskStatus, Upgrade,
};
use rust_decimal::Decimal;
use tracing::info;

use crate::advisor::AdvisorState;
use crate::clock::SimClock;
use crate::config::CompanyConfig;
use crate::queue::WorkQueue;
use crate::treasury::Treasury;

/// All mutable simulation state behind one owner.
#[derive(Debug, Clone)]
pub struct EntityStore {
    pub(crate) config: CompanyConfig,
    pub(crate) clock: SimClock,
    pub(crate) tasks: BTreeMap<TaskId, Task>,
    pub(crate) employees: BTreeMap<EmployeeId, Employee>,
    pub(crate) missions: BTreeMap<MissionId, Mission>,
    pub(crate) active_mission: Option<MissionId>,
    pub(crate) proposals: BTreeMap<ProposalId, Proposal>,
    pub(crate) queue: WorkQueue,
    pub(crate) generation_enabled: bool,
    pub(crate) treasury: Treasury,
    pub(crate) upgrades: Vec<Upgrade>,
    pub(crate) hire_intents: Vec<HireIntent>,
    pub(crate) notifications: VecDeque<Notification>,
    pub(crate) advisor: AdvisorState,
    pub(crate) stats: CompanyStats,
    pub(crate) next_pull_request: u32,
    outbox: Vec<ChangeEvent>,
}

impl EntityStore {
    /// Create an empty company: no tasks, no staff, the treasury seeded
    /// with the configured starting funds.
    pub fn new(config: CompanyConfig) -> Self {
        let treasury = Treasury::seeded(config.economy.starting_funds, 0);
        let upgrades = config
            .upgrades
            .iter()
            .map(|u| Upgrade {
                id: u.id.clone(),
                name: u.name.clone(),
                description: u.description.clone(),
                cost: u.cost,
                unlock_after_tasks: u.unlock_after_tasks,
                purchased: false,
            })
            .collect();
        let advisor = AdvisorState::new(config.advisor.max_thoughts);
        let generation_enabled = config.queue.generation_enabled;

        info!(
            company = %config.simulation.name,
            funds = %config.economy.starting_funds,
            "Company founded"
        );

        Self {
            config,
            clock: SimClock::new(),
            tasks: BTreeMap::new(),
            employees: BTreeMap::new(),
            missions: BTreeMap::new(),
            active_mission: None,
            proposals: BTreeMap::new(),
            queue: WorkQueue::new(),
            generation_enabled,
            treasury,
            upgrades,
            hire_intents: Vec::new(),
            notifications: VecDeque::new(),
            advisor,
            stats: CompanyStats::default(),
            next_pull_request: 1,
            outbox: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Change events and notifications
    // -----------------------------------------------------------------------

    /// Append a change event to the outbox, stamped with the current tick.
    pub(crate) fn emit(&mut self, change: Change) {
        self.outbox.push(ChangeEvent {
            tick: self.clock.tick(),
            change,
        });
    }

    /// Take every change event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Raise a user-facing notification. The oldest notification is evicted
    /// once `max_notifications` is exceeded.
    pub fn notify(&mut self, message: impl Into<String>, severity: Severity) {
        let notification = Notification {
            id: NotificationId::new(),
            message: message.into(),
            severity,
            tick: self.clock.tick(),
            created_at: Utc::now(),
        };
        let notification_id = notification.id;
        self.notifications.push_back(notification);
        while self.notifications.len() > self.config.economy.max_notifications {
            let _ = self.notifications.pop_front();
        }
        self.emit(Change::Notified {
            notification_id,
            severity,
        });
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The configuration the store was created with.
    pub const fn config(&self) -> &CompanyConfig {
        &self.config
    }

    /// Current simulation tick.
    pub const fn current_tick(&self) -> u64 {
        self.clock.tick()
    }

    /// Whether the clock is paused.
    pub const fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// Look up a task.
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// All tasks in id order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Look up an employee.
    pub fn employee(&self, id: EmployeeId) -> Option<&Employee> {
        self.employees.get(&id)
    }

    /// All employees in id order.
    pub fn employees(&self) -> impl Iterator<Item = &Employee> {
        self.employees.values()
    }

    /// Look up a mission.
    pub fn mission(&self, id: MissionId) -> Option<&Mission> {
        self.missions.get(&id)
    }

    /// All missions in id order.
    pub fn missions(&self) -> impl Iterator<Item = &Mission> {
        self.missions.values()
    }

    /// The mission currently selected in the presentation layer.
    pub const fn active_mission(&self) -> Option<MissionId> {
        self.active_mission
    }

    /// Look up a proposal.
    pub fn proposal(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    /// All proposals, decided ones included.
    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    /// Proposals still awaiting a decision.
    pub fn pending_proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values().filter(|p| p.is_pending())
    }

    /// The AI work queue.
    pub const fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    /// Whether assignment submits tasks for generation.
    pub const fn generation_enabled(&self) -> bool {
        self.generation_enabled
    }

    /// Notifications, oldest first.
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    /// Funds available.
    pub const fn funds(&self) -> Decimal {
        self.treasury.funds()
    }

    /// The append-only treasury ledger.
    pub fn ledger(&self) -> &[LedgerEntry] {
        self.treasury.ledger()
    }

    /// The upgrade catalog with purchase state.
    pub fn upgrades(&self) -> &[Upgrade] {
        &self.upgrades
    }

    /// Hiring intents awaiting a hire.
    pub fn hire_intents(&self) -> &[HireIntent] {
        &self.hire_intents
    }

    /// Advisor thoughts and evaluation state.
    pub const fn advisor(&self) -> &AdvisorState {
        &self.advisor
    }

    /// Company-wide counters.
    pub const fn stats(&self) -> &CompanyStats {
        &self.stats
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Pause or resume the clock. While paused, [`tick`](Self::tick) is a
    /// no-op.
    pub const fn set_paused(&mut self, paused: bool) {
        self.clock.set_paused(paused);
    }

    /// Create a task in `todo`. Returns the new id.
    pub fn create_task(&mut self, definition: &TaskDefinition) -> TaskId {
        self.insert_task(definition, TaskStatus::Todo, None)
    }

    /// Insert a task with an explicit status and mission link.
    pub(crate) fn insert_task(
        &mut self,
        definition: &TaskDefinition,
        status: TaskStatus,
        mission_id: Option<MissionId>,
    ) -> TaskId {
        let mut task = Task::new(definition, status, self.clock.tick());
        task.mission_id = mission_id;
        let task_id = task.id;
        self.tasks.insert(task_id, task);
        self.emit(Change::TaskCreated { task_id });
        task_id
    }

    // -----------------------------------------------------------------------
    // Invariants
    // -----------------------------------------------------------------------

    /// Describe every violated store invariant. Empty means consistent.
    ///
    /// Checked: progress bounds, the working/current-task equivalence, one
    /// in-progress task per employee, queue uniqueness and retry bounds,
    /// mission task references, and artifact ownership.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let max_retries = self.config.queue.max_retries;

        let mut artifact_ids = BTreeSet::new();
        let mut in_progress_by_employee: BTreeMap<EmployeeId, u32> = BTreeMap::new();
        for task in self.tasks.values() {
            if task.estimated_ticks == 0 || task.progress_ticks > task.estimated_ticks {
                violations.push(format!(
                    "task {} progress {}/{} out of bounds",
                    task.id, task.progress_ticks, task.estimated_ticks
                ));
            }
            if task.status == TaskStatus::InProgress
                && let Some(assignee) = task.assignee_id
            {
                let count = in_progress_by_employee.entry(assignee).or_insert(0);
                *count = count.saturating_add(1);
            }
            for artifact in &task.artifacts {
                if !artifact_ids.insert(artifact.id) {
                    violations.push(format!("artifact {} owned twice", artifact.id));
                }
            }
        }

        for employee in self.employees.values() {
            let working = employee.status == EmployeeStatus::Working;
            if working != employee.current_task_id.is_some() {
                violations.push(format!(
                    "employee {} status {:?} with current task {:?}",
                    employee.id, employee.status, employee.current_task_id
                ));
            }
        }
        for (employee_id, count) in in_progress_by_employee {
            if count > 1 {
                violations.push(format!(
                    "employee {employee_id} assigned to {count} in-progress tasks"
                ));
            }
        }

        let mut queued_tasks = BTreeSet::new();
        for item in self.queue.iter() {
            if !queued_tasks.insert(item.task_id) {
                violations.push(format!("task {} queued twice", item.task_id));
            }
            if item.retries > max_retries {
                violations.push(format!("work item {} retried {} times", item.id, item.retries));
            }
        }

        for mission in self.missions.values() {
            for task_id in &mission.task_ids {
                if !self.tasks.contains_key(task_id) {
                    violations.push(format!(
                        "mission {} references missing task {task_id}",
                        mission.id
                    ));
                }
            }
        }

        violations
    }
}

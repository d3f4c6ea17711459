//! AI Work Queue: priority-ordered background generation jobs with a
//! single in-flight slot and bounded retry.
//!
//! Processing is split in two so the store is never locked across the
//! generator call:
//!
//! 1. [`EntityStore::begin_ai_work`] claims the head item and builds a
//!    [`GenerationRequest`] from current state.
//! 2. [`EntityStore::finish_ai_work`] re-reads current state and merges the
//!    result (or the failure) into it.
//!
//! Between the two, the clock keeps ticking and other commands keep
//! mutating the store.

use codeshop_types::{
    AiWorkItem, Artifact, ArtifactId, ArtifactKind, Change, EmployeeId, EmployeeRole,
    GenerationOutput, GenerationRequest, MemoryRecord, Severity, TaskDefinition, TaskId,
    TaskStatus, WorkItemId, WorkItemStatus,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::generation::GenerationError;
use crate::memory;
use crate::store::EntityStore;

/// Number of memory summaries passed to the generator.
const RECENT_MEMORY: usize = 5;

/// Sorted list of queued items plus the single in-flight slot.
///
/// Items are ordered by ascending priority rank, then by insertion
/// sequence, so equal priorities are served first-in first-out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkQueue {
    items: Vec<AiWorkItem>,
    in_flight: Option<AiWorkItem>,
    next_sequence: u64,
}

impl WorkQueue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            in_flight: None,
            next_sequence: 0,
        }
    }

    /// Items in the queue, the in-flight one included.
    pub fn len(&self) -> usize {
        self.items
            .len()
            .saturating_add(usize::from(self.in_flight.is_some()))
    }

    /// Whether nothing is queued or in flight.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every item, in-flight first, then queued in processing order.
    pub fn iter(&self) -> impl Iterator<Item = &AiWorkItem> {
        self.in_flight.iter().chain(self.items.iter())
    }

    /// Queued items in processing order.
    pub fn queued(&self) -> &[AiWorkItem] {
        &self.items
    }

    /// The item currently being generated, if any.
    pub const fn in_flight(&self) -> Option<&AiWorkItem> {
        self.in_flight.as_ref()
    }

    /// Whether an item for `task_id` is queued or in flight.
    pub fn contains_task(&self, task_id: TaskId) -> bool {
        self.iter().any(|item| item.task_id == task_id)
    }

    /// Add a new item for `task_id`. Returns its id.
    pub(crate) fn push(
        &mut self,
        task_id: TaskId,
        employee_id: EmployeeId,
        priority: u8,
        tick: u64,
    ) -> WorkItemId {
        let item = AiWorkItem {
            id: WorkItemId::new(),
            task_id,
            employee_id,
            priority,
            added_at: tick,
            status: WorkItemStatus::Queued,
            retries: 0,
            sequence: self.take_sequence(),
        };
        let id = item.id;
        self.insert_sorted(item);
        id
    }

    /// Remove and return the head item.
    pub(crate) fn pop_next(&mut self) -> Option<AiWorkItem> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items.remove(0))
        }
    }

    /// Move the head item into the in-flight slot. `None` if the slot is
    /// taken or the queue is empty.
    pub(crate) fn claim(&mut self) -> Option<AiWorkItem> {
        if self.in_flight.is_some() {
            return None;
        }
        let mut item = self.pop_next()?;
        item.status = WorkItemStatus::InProgress;
        self.in_flight = Some(item.clone());
        Some(item)
    }

    /// Empty the in-flight slot if it holds `item_id`.
    pub(crate) fn release(&mut self, item_id: WorkItemId) -> Option<AiWorkItem> {
        if self.in_flight.as_ref().is_some_and(|item| item.id == item_id) {
            self.in_flight.take()
        } else {
            None
        }
    }

    /// Put a failed item back. It goes behind the items of the same
    /// priority that are already waiting.
    pub(crate) fn requeue(&mut self, mut item: AiWorkItem) {
        item.status = WorkItemStatus::Queued;
        item.sequence = self.take_sequence();
        self.insert_sorted(item);
    }

    /// Remove every queued (not in-flight) item of `employee_id`.
    pub(crate) fn remove_queued_for_employee(&mut self, employee_id: EmployeeId) -> Vec<AiWorkItem> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|item| item.employee_id == employee_id);
        self.items = kept;
        removed
    }

    /// Return an in-flight item to the queue at its original position.
    /// Used after a restore, when nothing owns the generation call anymore.
    pub(crate) fn restore_in_flight(&mut self) {
        if let Some(mut item) = self.in_flight.take() {
            item.status = WorkItemStatus::Queued;
            self.insert_sorted(item);
        }
        for item in &mut self.items {
            item.status = WorkItemStatus::Queued;
        }
    }

    fn take_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        sequence
    }

    fn insert_sorted(&mut self, item: AiWorkItem) {
        let key = (item.priority, item.sequence);
        let pos = self
            .items
            .partition_point(|other| (other.priority, other.sequence) <= key);
        self.items.insert(pos, item);
    }
}

/// What [`EntityStore::finish_ai_work`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkOutcome {
    /// Output merged into the task.
    Completed,
    /// Failure recorded; the item is queued again.
    Retried,
    /// Failure limit reached; the item is gone.
    Dropped,
    /// Task or employee vanished while generating; the item is gone.
    Discarded,
    /// The id did not match the in-flight item.
    Ignored,
}

impl EntityStore {
    /// Enable or disable submission and processing of AI work.
    pub fn set_generation_enabled(&mut self, enabled: bool) {
        self.generation_enabled = enabled;
        info!(enabled, "AI generation toggled");
    }

    /// Submit a task for generation on behalf of an employee.
    ///
    /// Rejected (returns `None`) for unknown ids, for a task that was
    /// already submitted once, or when an item for the task exists. The
    /// task is marked `ai_work_started` immediately.
    pub fn enqueue_ai_work(
        &mut self,
        task_id: TaskId,
        employee_id: EmployeeId,
    ) -> Option<WorkItemId> {
        if !self.employees.contains_key(&employee_id) || self.queue.contains_task(task_id) {
            return None;
        }
        let task = self.tasks.get_mut(&task_id)?;
        if task.ai_work_started {
            return None;
        }
        task.ai_work_started = true;
        let priority = task.priority.queue_rank();

        let tick = self.clock.tick();
        let item_id = self.queue.push(task_id, employee_id, priority, tick);
        debug!(item_id = %item_id, task_id = %task_id, priority, "AI work enqueued");
        self.emit(Change::WorkEnqueued { item_id, task_id });
        Some(item_id)
    }

    /// Claim the head of the queue and describe the work to generate.
    ///
    /// `None` when generation is disabled, an item is already in flight,
    /// or the queue is empty. An item whose task or employee no longer
    /// exists is discarded.
    pub fn begin_ai_work(&mut self) -> Option<GenerationRequest> {
        if !self.generation_enabled {
            return None;
        }
        let item = self.queue.claim()?;

        let (Some(task), Some(employee)) =
            (self.tasks.get(&item.task_id), self.employees.get(&item.employee_id))
        else {
            warn!(item_id = %item.id, task_id = %item.task_id, "Discarding work item with missing task or employee");
            let _ = self.queue.release(item.id);
            return None;
        };

        let mission_context = task
            .mission_id
            .and_then(|id| self.missions.get(&id))
            .map(|m| format!("{}: {}", m.name, m.description));
        let recent_memory = employee
            .memory
            .iter()
            .rev()
            .take(RECENT_MEMORY)
            .map(|r| r.summary.clone())
            .collect();

        let request = GenerationRequest {
            work_item_id: item.id,
            task_id: task.id,
            task_title: task.title.clone(),
            task_description: task.description.clone(),
            task_type: task.task_type,
            priority: task.priority,
            employee_id: employee.id,
            employee_name: employee.name.clone(),
            role: employee.role,
            specializations: employee.specializations.clone(),
            company_name: self.config.simulation.name.clone(),
            mission_context,
            recent_memory,
            tick: self.clock.tick(),
        };

        info!(
            item_id = %item.id,
            task_id = %item.task_id,
            role = employee.role.as_str(),
            retries = item.retries,
            "AI work started"
        );
        self.emit(Change::WorkStarted {
            item_id: item.id,
            task_id: item.task_id,
        });
        Some(request)
    }

    /// Merge a generation result for the in-flight item into current state.
    ///
    /// Success attaches the role-specific output, forces the task to
    /// `review` at full progress (a task already `done` stays done), and
    /// records the experience on the employee. Failure (including output
    /// of the wrong shape for the role) requeues the item while it has
    /// retries left, then drops it and leaves the task as it was. A result
    /// whose task or employee is gone is discarded, and the task becomes
    /// eligible for generation again.
    pub fn finish_ai_work(
        &mut self,
        item_id: WorkItemId,
        result: Result<GenerationOutput, GenerationError>,
    ) -> WorkOutcome {
        let Some(mut item) = self.queue.release(item_id) else {
            debug!(item_id = %item_id, "Result for unknown work item ignored");
            return WorkOutcome::Ignored;
        };

        let role = match (
            self.tasks.contains_key(&item.task_id),
            self.employees.get(&item.employee_id),
        ) {
            (true, Some(employee)) => employee.role,
            _ => {
                warn!(item_id = %item.id, task_id = %item.task_id, "Task or employee gone during generation");
                // Nothing was merged, so the task may be generated again.
                if let Some(task) = self.tasks.get_mut(&item.task_id)
                    && !task.ai_work_completed
                {
                    task.ai_work_started = false;
                }
                return WorkOutcome::Discarded;
            }
        };

        let result = result.and_then(|output| {
            if output.matches_role(role) {
                Ok(output)
            } else {
                Err(GenerationError::RoleMismatch {
                    expected: role.as_str().to_owned(),
                    got: output.label().to_owned(),
                })
            }
        });

        match result {
            Ok(output) => {
                self.apply_output(&item, output);
                WorkOutcome::Completed
            }
            Err(err) => {
                if item.retries >= self.config.queue.max_retries {
                    warn!(
                        item_id = %item.id,
                        task_id = %item.task_id,
                        retries = item.retries,
                        error = %err,
                        "AI work dropped after repeated failures"
                    );
                    self.stats.ai_jobs_dropped = self.stats.ai_jobs_dropped.saturating_add(1);
                    self.emit(Change::WorkDropped {
                        item_id: item.id,
                        task_id: item.task_id,
                    });
                    WorkOutcome::Dropped
                } else {
                    item.retries = item.retries.saturating_add(1);
                    info!(
                        item_id = %item.id,
                        task_id = %item.task_id,
                        retries = item.retries,
                        error = %err,
                        "AI work failed, retrying"
                    );
                    let (item_id, task_id, retries) = (item.id, item.task_id, item.retries);
                    self.queue.requeue(item);
                    self.emit(Change::WorkRetried {
                        item_id,
                        task_id,
                        retries,
                    });
                    WorkOutcome::Retried
                }
            }
        }
    }

    fn apply_output(&mut self, item: &AiWorkItem, output: GenerationOutput) {
        let tick = self.clock.tick();
        let task_id = item.task_id;
        let employee_id = item.employee_id;
        let Some(task) = self.tasks.get(&task_id) else {
            return;
        };
        let (title, task_type, mission_id) = (task.title.clone(), task.task_type, task.mission_id);

        let mut tags = vec![task_type.as_str().to_owned()];
        let mut artifacts = Vec::new();
        let mut new_tasks = Vec::new();
        let mut commit_files = Vec::new();

        match output {
            GenerationOutput::Code { files, combined } => {
                tags.push(ArtifactKind::Code.as_str().to_owned());
                if files.is_empty() {
                    artifacts.push(artifact(ArtifactKind::Code, title.clone(), None, None, combined, employee_id, tick));
                } else {
                    for file in files {
                        let language = language_for(&file.file_path);
                        if let Some(lang) = language
                            && !tags.iter().any(|t| t == lang)
                        {
                            tags.push(lang.to_owned());
                        }
                        commit_files.push(file.file_path.clone());
                        artifacts.push(artifact(
                            ArtifactKind::Code,
                            file.file_path.clone(),
                            Some(file.file_path),
                            language.map(str::to_owned),
                            file.content,
                            employee_id,
                            tick,
                        ));
                    }
                }
            }
            GenerationOutput::Design { description, css } => {
                tags.push(ArtifactKind::Design.as_str().to_owned());
                tags.push("css".to_owned());
                artifacts.push(artifact(
                    ArtifactKind::Design,
                    format!("Design spec: {title}"),
                    None,
                    Some("css".to_owned()),
                    format!("{description}\n\n{css}"),
                    employee_id,
                    tick,
                ));
            }
            GenerationOutput::Copy { headline, body, cta } => {
                tags.push(ArtifactKind::Copy.as_str().to_owned());
                artifacts.push(artifact(
                    ArtifactKind::Copy,
                    headline.clone(),
                    None,
                    None,
                    format!("{headline}\n\n{body}\n\n{cta}"),
                    employee_id,
                    tick,
                ));
            }
            GenerationOutput::Plan { tasks } => {
                tags.push("planning".to_owned());
                new_tasks = tasks;
            }
        }

        let artifact_count = u32::try_from(artifacts.len()).unwrap_or(u32::MAX);
        let planned = new_tasks.len();
        let mut status = TaskStatus::Review;
        if let Some(task) = self.tasks.get_mut(&task_id) {
            task.artifacts.extend(artifacts);
            task.ai_work_completed = true;
            if task.status == TaskStatus::Done {
                // Finished by hand while generating; never move it back.
                status = TaskStatus::Done;
                debug!(task_id = %task_id, "Result merged into a task already done");
            } else {
                task.progress_ticks = task.estimated_ticks;
                task.status = TaskStatus::Review;
                if task.completed_at.is_none() {
                    task.completed_at = Some(tick);
                }
            }
        }

        self.create_planned_tasks(&new_tasks, mission_id);

        let summary = if planned > 0 {
            format!("Planned {planned} follow-up tasks from '{title}'")
        } else {
            format!("Delivered {artifact_count} artifact(s) for '{title}'")
        };
        let capacity = self.config.economy.memory_capacity;
        let mut role = None;
        if let Some(employee) = self.employees.get_mut(&employee_id) {
            role = Some(employee.role);
            memory::record_experience(
                employee,
                MemoryRecord {
                    tick,
                    task_id,
                    summary,
                    tags,
                },
                capacity,
            );
        }

        if role == Some(EmployeeRole::Engineer)
            && !commit_files.is_empty()
            && let Some(mission_id) = mission_id
        {
            let _ = self.append_commit(
                mission_id,
                format!("feat: {title}"),
                Some(employee_id),
                Some(task_id),
                commit_files,
            );
        }

        self.stats.ai_jobs_completed = self.stats.ai_jobs_completed.saturating_add(1);
        info!(
            item_id = %item.id,
            task_id = %task_id,
            artifacts = artifact_count,
            planned,
            "AI work completed"
        );
        self.emit(Change::WorkCompleted {
            item_id: item.id,
            task_id,
            artifacts: artifact_count,
        });
        self.emit(Change::TaskStatusChanged { task_id, status });
        self.notify(format!("AI finished work on '{title}'"), Severity::Success);
    }

    /// Create backlog tasks planned by a product manager, linked to the
    /// originating task's mission.
    fn create_planned_tasks(
        &mut self,
        definitions: &[TaskDefinition],
        mission_id: Option<codeshop_types::MissionId>,
    ) {
        let mission_id = mission_id.filter(|id| self.missions.contains_key(id));
        for definition in definitions {
            let new_id = self.insert_task(definition, TaskStatus::Backlog, mission_id);
            if let Some(mission) = mission_id.and_then(|id| self.missions.get_mut(&id)) {
                mission.task_ids.push(new_id);
            }
        }
    }
}

fn artifact(
    kind: ArtifactKind,
    title: String,
    file_path: Option<String>,
    language: Option<String>,
    content: String,
    author_id: EmployeeId,
    tick: u64,
) -> Artifact {
    Artifact {
        id: ArtifactId::new(),
        kind,
        title,
        file_path,
        language,
        content,
        author_id,
        created_at: tick,
    }
}

/// Language tag for a file path, from its extension.
fn language_for(path: &str) -> Option<&'static str> {
    let ext = path.rsplit_once('.').map(|(_, ext)| ext)?;
    match ext.to_ascii_lowercase().as_str() {
        "rs" => Some("rust"),
        "ts" | "tsx" => Some("typescript"),
        "js" | "jsx" => Some("javascript"),
        "py" => Some("python"),
        "css" => Some("css"),
        "html" => Some("html"),
        "sql" => Some("sql"),
        "md" => Some("markdown"),
        "json" => Some("json"),
        "toml" => Some("toml"),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use codeshop_types::{GeneratedFile, Priority, TaskType};

    use super::*;
    use crate::generation::ScriptedGenerator;
    use crate::store::tests::{assert_invariants, store_with};

    fn definition(title: &str, priority: Priority) -> TaskDefinition {
        TaskDefinition {
            priority,
            ..TaskDefinition::new(title, "", TaskType::Feature, 5)
        }
    }

    fn failure() -> Result<GenerationOutput, GenerationError> {
        Err(GenerationError::Provider {
            message: "503".to_owned(),
        })
    }

    #[test]
    fn double_enqueue_adds_one_item() {
        let mut store = store_with(|_| {});
        let employee = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let task = store.create_task(&definition("A", Priority::Medium));

        assert!(store.enqueue_ai_work(task, employee).is_some());
        assert!(store.enqueue_ai_work(task, employee).is_none());
        assert_eq!(store.queue().len(), 1);
        assert!(store.task(task).unwrap().ai_work_started);
        assert_invariants(&store);
    }

    #[test]
    fn queue_orders_by_priority_then_insertion() {
        let mut store = store_with(|_| {});
        let employee = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let low = store.create_task(&definition("low", Priority::Low));
        let first_high = store.create_task(&definition("high 1", Priority::High));
        let critical = store.create_task(&definition("critical", Priority::Critical));
        let second_high = store.create_task(&definition("high 2", Priority::High));
        for task in [low, first_high, critical, second_high] {
            let _ = store.enqueue_ai_work(task, employee);
        }
        let order: Vec<TaskId> = store.queue().queued().iter().map(|i| i.task_id).collect();
        assert_eq!(order, vec![critical, first_high, second_high, low]);
    }

    #[test]
    fn single_item_in_flight() {
        let mut store = store_with(|_| {});
        let employee = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let a = store.create_task(&definition("A", Priority::Medium));
        let b = store.create_task(&definition("B", Priority::Medium));
        let _ = store.enqueue_ai_work(a, employee);
        let _ = store.enqueue_ai_work(b, employee);

        let request = store.begin_ai_work().unwrap();
        assert_eq!(request.task_id, a);
        assert!(store.begin_ai_work().is_none());
        assert_eq!(store.queue().len(), 2);
        assert_eq!(
            store.queue().in_flight().map(|i| i.status),
            Some(WorkItemStatus::InProgress)
        );
        assert_invariants(&store);
    }

    #[test]
    fn disabled_generation_processes_nothing() {
        let mut store = store_with(|_| {});
        let employee = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let task = store.create_task(&definition("A", Priority::Medium));
        let _ = store.enqueue_ai_work(task, employee);
        store.set_generation_enabled(false);
        assert!(store.begin_ai_work().is_none());
        assert_eq!(store.queue().queued().len(), 1);
    }

    #[test]
    fn engineer_success_attaches_files_and_forces_review() {
        let mut store = store_with(|_| {});
        let employee = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let task = store.create_task(&definition("Search Bar", Priority::High));
        store.assign(task, employee);

        let request = store.begin_ai_work().unwrap();
        let output = ScriptedGenerator::output_for(&request);
        let outcome = store.finish_ai_work(request.work_item_id, Ok(output));
        assert_eq!(outcome, WorkOutcome::Completed);

        let t = store.task(task).unwrap();
        assert_eq!(t.status, TaskStatus::Review);
        assert_eq!(t.progress_ticks, t.estimated_ticks);
        assert!(t.ai_work_completed);
        assert_eq!(t.artifacts.len(), 2);
        assert_eq!(t.artifacts.first().unwrap().language.as_deref(), Some("rust"));
        assert!(store.queue().is_empty());

        let e = store.employee(employee).unwrap();
        assert_eq!(e.memory.len(), 1);
        assert!(e.specializations.contains(&"rust".to_owned()));
        assert_eq!(store.stats().ai_jobs_completed, 1);
        assert_invariants(&store);
    }

    #[test]
    fn code_without_files_uses_combined_blob() {
        let mut store = store_with(|_| {});
        let employee = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let task = store.create_task(&definition("Blob", Priority::Medium));
        let _ = store.enqueue_ai_work(task, employee);
        let request = store.begin_ai_work().unwrap();
        let output = GenerationOutput::Code {
            files: Vec::new(),
            combined: "fn main() {}".to_owned(),
        };
        let _ = store.finish_ai_work(request.work_item_id, Ok(output));
        let artifacts = &store.task(task).unwrap().artifacts;
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts.first().unwrap().content, "fn main() {}");
        assert!(artifacts.first().unwrap().file_path.is_none());
    }

    #[test]
    fn pm_output_creates_backlog_tasks() {
        let mut store = store_with(|_| {});
        let pm = store.hire("Pat", EmployeeRole::Pm).unwrap();
        let task = store.create_task(&definition("Roadmap", Priority::Medium));
        store.assign(task, pm);

        let request = store.begin_ai_work().unwrap();
        let output = GenerationOutput::Plan {
            tasks: vec![
                TaskDefinition::new("Follow-up 1", "", TaskType::Bug, 2),
                TaskDefinition::new("Follow-up 2", "", TaskType::Feature, 2),
            ],
        };
        let _ = store.finish_ai_work(request.work_item_id, Ok(output));

        assert_eq!(store.tasks().count(), 3);
        assert_eq!(
            store.tasks().filter(|t| t.status == TaskStatus::Backlog).count(),
            2
        );
        let t = store.task(task).unwrap();
        assert!(t.artifacts.is_empty());
        assert_eq!(t.status, TaskStatus::Review);
        assert_invariants(&store);
    }

    /// Two failures requeue; the third attempt's failure drops the item.
    #[test]
    fn third_failure_drops_the_item() {
        let mut store = store_with(|_| {});
        let employee = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let task = store.create_task(&definition("Flaky", Priority::Medium));
        store.assign(task, employee);

        for expected_retries in 1..=2 {
            let request = store.begin_ai_work().unwrap();
            assert_eq!(
                store.finish_ai_work(request.work_item_id, failure()),
                WorkOutcome::Retried
            );
            assert_eq!(store.queue().queued().first().unwrap().retries, expected_retries);
        }

        let request = store.begin_ai_work().unwrap();
        assert_eq!(store.finish_ai_work(request.work_item_id, failure()), WorkOutcome::Dropped);

        assert!(store.queue().is_empty());
        let t = store.task(task).unwrap();
        assert!(t.ai_work_started);
        assert!(!t.ai_work_completed);
        assert_eq!(t.status, TaskStatus::InProgress);
        assert_eq!(store.stats().ai_jobs_dropped, 1);
        assert_invariants(&store);
    }

    #[test]
    fn retried_item_goes_behind_same_priority_peers() {
        let mut store = store_with(|_| {});
        let employee = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let a = store.create_task(&definition("A", Priority::Medium));
        let b = store.create_task(&definition("B", Priority::Medium));
        let _ = store.enqueue_ai_work(a, employee);
        let _ = store.enqueue_ai_work(b, employee);

        let request = store.begin_ai_work().unwrap();
        let _ = store.finish_ai_work(request.work_item_id, failure());
        let order: Vec<TaskId> = store.queue().queued().iter().map(|i| i.task_id).collect();
        assert_eq!(order, vec![b, a]);
    }

    #[test]
    fn wrong_shape_counts_as_failure() {
        let mut store = store_with(|_| {});
        let designer = store.hire("Dee", EmployeeRole::Designer).unwrap();
        let task = store.create_task(&definition("Logo", Priority::Medium));
        let _ = store.enqueue_ai_work(task, designer);
        let request = store.begin_ai_work().unwrap();
        let output = GenerationOutput::Code {
            files: vec![GeneratedFile {
                file_path: "a.rs".to_owned(),
                content: String::new(),
            }],
            combined: String::new(),
        };
        assert_eq!(
            store.finish_ai_work(request.work_item_id, Ok(output)),
            WorkOutcome::Retried
        );
        assert!(store.task(task).unwrap().artifacts.is_empty());
    }

    #[test]
    fn result_for_fired_employee_is_discarded() {
        let mut store = store_with(|_| {});
        let employee = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let task = store.create_task(&definition("A", Priority::Medium));
        store.assign(task, employee);
        let request = store.begin_ai_work().unwrap();
        store.fire(employee);
        // In-flight items survive the firing; the merge notices.
        assert_eq!(store.queue().len(), 1);
        let output = ScriptedGenerator::output_for(&request);
        assert_eq!(
            store.finish_ai_work(request.work_item_id, Ok(output)),
            WorkOutcome::Discarded
        );
        assert!(store.queue().is_empty());

        // The discarded result never landed, so a new hire can pick it up.
        let t = store.task(task).unwrap();
        assert!(!t.ai_work_started);
        assert!(t.artifacts.is_empty());
        let bob = store.hire("Bob", EmployeeRole::Engineer).unwrap();
        store.assign(task, bob);
        assert_eq!(store.queue().len(), 1);
        assert_invariants(&store);
    }

    #[test]
    fn done_during_generation_stays_done_and_counts_once() {
        let mut store = store_with(|_| {});
        let employee = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let task = store.create_task(&definition("Search Bar", Priority::High));
        store.assign(task, employee);
        let request = store.begin_ai_work().unwrap();

        let _ = store.tick();
        store.update_status(task, TaskStatus::Done);
        let finished_at = store.task(task).unwrap().completed_at;

        let output = ScriptedGenerator::output_for(&request);
        assert_eq!(
            store.finish_ai_work(request.work_item_id, Ok(output)),
            WorkOutcome::Completed
        );
        store.update_status(task, TaskStatus::Done);

        let t = store.task(task).unwrap();
        assert_eq!(t.status, TaskStatus::Done);
        assert!(t.ai_work_completed);
        assert!(!t.artifacts.is_empty());
        assert_eq!(t.progress_ticks, 1);
        assert_eq!(t.completed_at, finished_at);
        assert_eq!(store.stats().tasks_completed, 1);
        assert_eq!(store.employee(employee).unwrap().tasks_completed, 1);
        assert_invariants(&store);
    }

    #[test]
    fn unknown_result_is_ignored() {
        let mut store = store_with(|_| {});
        assert_eq!(
            store.finish_ai_work(WorkItemId::new(), failure()),
            WorkOutcome::Ignored
        );
    }

    #[test]
    fn clock_progress_continues_while_in_flight() {
        let mut store = store_with(|_| {});
        let ada = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let bob = store.hire("Bob", EmployeeRole::Engineer).unwrap();
        let slow = store.create_task(&definition("Slow", Priority::Medium));
        let other = store.create_task(&definition("Other", Priority::Medium));
        store.assign(slow, ada);
        store.assign(other, bob);

        let request = store.begin_ai_work().unwrap();
        for _ in 0..3 {
            let _ = store.tick();
        }
        assert_eq!(store.task(other).unwrap().progress_ticks, 3);

        let output = ScriptedGenerator::output_for(&request);
        let _ = store.finish_ai_work(request.work_item_id, Ok(output));
        let t = store.task(slow).unwrap();
        assert_eq!(t.progress_ticks, t.estimated_ticks);
        assert_eq!(t.completed_at, Some(3));
    }

    #[test]
    fn language_from_extension() {
        assert_eq!(language_for("src/app.tsx"), Some("typescript"));
        assert_eq!(language_for("styles/MAIN.CSS"), Some("css"));
        assert_eq!(language_for("Makefile"), None);
    }
}

//! Core entity structs for the Codeshop simulation.
//!
//! Tasks, employees, missions, AI work items, proposals, and the small
//! records hanging off them (artifacts, memory, commits, notifications,
//! ledger entries). All timestamps are simulation ticks unless the field
//! name says otherwise.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{
    ArtifactKind, EmployeeRole, EmployeeStatus, LedgerEntryKind, MissionStatus, Priority,
    ProposalKind, ProposalStatus, Severity, TaskStatus, TaskType, WorkItemStatus,
};
use crate::ids::{
    ArtifactId, CommitId, EmployeeId, MissionId, NotificationId, ProposalId, TaskId, WorkItemId,
};

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// A generated work output attached to exactly one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Artifact {
    /// Unique artifact identifier.
    pub id: ArtifactId,
    /// What the artifact contains.
    pub kind: ArtifactKind,
    /// Short display title.
    pub title: String,
    /// Repository path for code artifacts.
    pub file_path: Option<String>,
    /// Language hint derived from the file extension (`rust`, `css`, ...).
    pub language: Option<String>,
    /// The generated content.
    pub content: String,
    /// Employee whose work produced the artifact.
    pub author_id: EmployeeId,
    /// Tick the artifact was attached.
    pub created_at: u64,
}

/// A unit of work with a bounded progress counter.
///
/// `progress_ticks` never exceeds `estimated_ticks`, and `estimated_ticks`
/// is at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,
    /// Short title.
    pub title: String,
    /// Longer description handed to the generation collaborator.
    pub description: String,
    /// Kind of work.
    pub task_type: TaskType,
    /// Workflow position.
    pub status: TaskStatus,
    /// Urgency; also decides AI queue order.
    pub priority: Priority,
    /// Assigned employee. Review and done tasks keep it as history.
    pub assignee_id: Option<EmployeeId>,
    /// Ticks of work needed to finish.
    pub estimated_ticks: u64,
    /// Ticks of work done so far.
    pub progress_ticks: u64,
    /// Tick the task was created.
    pub created_at: u64,
    /// Tick the task reached review (or done, if forced there directly).
    pub completed_at: Option<u64>,
    /// Generated outputs, in attachment order.
    pub artifacts: Vec<Artifact>,
    /// Set once the task has been submitted to the AI work queue.
    pub ai_work_started: bool,
    /// Set once AI generation finished successfully.
    pub ai_work_completed: bool,
    /// Mission this task belongs to, if any.
    pub mission_id: Option<MissionId>,
}

impl Task {
    /// Create an unassigned task with the given status and no progress.
    ///
    /// An `estimated_ticks` of zero is raised to 1 so the task can still
    /// complete through the clock.
    pub fn new(definition: &TaskDefinition, status: TaskStatus, created_at: u64) -> Self {
        Self {
            id: TaskId::new(),
            title: definition.title.clone(),
            description: definition.description.clone(),
            task_type: definition.task_type,
            status,
            priority: definition.priority,
            assignee_id: None,
            estimated_ticks: definition.estimated_ticks.max(1),
            progress_ticks: 0,
            created_at,
            completed_at: None,
            artifacts: Vec::new(),
            ai_work_started: false,
            ai_work_completed: false,
            mission_id: None,
        }
    }

    /// Progress as a whole percentage (0 to 100).
    pub fn progress_percent(&self) -> u64 {
        self.progress_ticks
            .saturating_mul(100)
            .checked_div(self.estimated_ticks)
            .unwrap_or(0)
            .min(100)
    }
}

/// Everything needed to create a task; used by mission proposals and by
/// PM generation output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TaskDefinition {
    /// Short title.
    pub title: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Kind of work.
    #[serde(default = "default_task_type")]
    pub task_type: TaskType,
    /// Urgency.
    #[serde(default)]
    pub priority: Priority,
    /// Ticks of work needed.
    #[serde(default = "default_estimated_ticks")]
    pub estimated_ticks: u64,
}

impl TaskDefinition {
    /// Convenience constructor with medium priority.
    pub fn new(title: &str, description: &str, task_type: TaskType, estimated_ticks: u64) -> Self {
        Self {
            title: title.to_owned(),
            description: description.to_owned(),
            task_type,
            priority: Priority::Medium,
            estimated_ticks,
        }
    }
}

const fn default_task_type() -> TaskType {
    TaskType::Feature
}

const fn default_estimated_ticks() -> u64 {
    10
}

// ---------------------------------------------------------------------------
// Employees
// ---------------------------------------------------------------------------

/// One entry of an employee's experience memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MemoryRecord {
    /// Tick the experience was recorded.
    pub tick: u64,
    /// Task the experience came from.
    pub task_id: TaskId,
    /// Human-readable summary.
    pub summary: String,
    /// Tags counted when deriving specializations.
    pub tags: Vec<String>,
}

/// A worker at the company.
///
/// `status == Working` exactly when `current_task_id` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Employee {
    /// Unique employee identifier.
    pub id: EmployeeId,
    /// Display name.
    pub name: String,
    /// Job role.
    pub role: EmployeeRole,
    /// Availability.
    pub status: EmployeeStatus,
    /// Task the employee is bound to while working.
    pub current_task_id: Option<TaskId>,
    /// Tick the employee was hired.
    pub hired_at: u64,
    /// Hiring cost paid from the funds pool.
    #[ts(as = "String")]
    pub salary: Decimal,
    /// Bounded experience log, oldest first.
    pub memory: Vec<MemoryRecord>,
    /// Number of tasks this employee has seen through to done.
    pub tasks_completed: u32,
    /// Most frequent memory tags (at most five).
    pub specializations: Vec<String>,
}

// ---------------------------------------------------------------------------
// AI work queue
// ---------------------------------------------------------------------------

/// A queued background job that generates artifacts for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AiWorkItem {
    /// Unique work item identifier.
    pub id: WorkItemId,
    /// Task the job generates output for.
    pub task_id: TaskId,
    /// Employee whose role shapes the output.
    pub employee_id: EmployeeId,
    /// Queue rank derived from the task priority (1 = critical).
    pub priority: u8,
    /// Tick the item was enqueued.
    pub added_at: u64,
    /// Queued or in flight.
    pub status: WorkItemStatus,
    /// Failed attempts so far.
    pub retries: u8,
    /// Insertion sequence; breaks priority ties in FIFO order.
    pub sequence: u64,
}

// ---------------------------------------------------------------------------
// Missions
// ---------------------------------------------------------------------------

/// An append-only commit record on a mission branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Commit {
    /// Unique commit identifier.
    pub id: CommitId,
    /// Short hash shown in the history.
    pub sha: String,
    /// Commit message.
    pub message: String,
    /// Employee credited with the commit.
    pub author_id: Option<EmployeeId>,
    /// Task the commit came from.
    pub task_id: Option<TaskId>,
    /// Paths touched by the commit.
    pub files: Vec<String>,
    /// Tick the commit was recorded.
    pub tick: u64,
}

/// Reference to the pull request opened for a mission branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PullRequestRef {
    /// Sequential pull request number.
    pub number: u32,
    /// Pull request title.
    pub title: String,
    /// Tick the pull request was opened.
    pub opened_at: u64,
}

/// A named feature initiative grouping tasks under one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Mission {
    /// Unique mission identifier.
    pub id: MissionId,
    /// Display name.
    pub name: String,
    /// What the initiative delivers.
    pub description: String,
    /// Urgency.
    pub priority: Priority,
    /// Lifecycle position.
    pub status: MissionStatus,
    /// Branch name derived from the mission name.
    pub branch_name: String,
    /// Member tasks in insertion order, without duplicates.
    pub task_ids: Vec<TaskId>,
    /// Commit history, append-only.
    pub commits: Vec<Commit>,
    /// Pull request opened when the mission entered review.
    pub pull_request: Option<PullRequestRef>,
    /// Tick the mission was created.
    pub created_at: u64,
    /// Tick the mission completed or was abandoned.
    pub closed_at: Option<u64>,
}

// ---------------------------------------------------------------------------
// Proposals
// ---------------------------------------------------------------------------

/// The type-specific data carried by a proposal.
///
/// The payload variant is the proposal's kind, so a mismatch between the
/// two cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ProposalPayload {
    /// Create a mission pre-populated with tasks.
    Mission {
        /// Name of the mission to create.
        mission_name: String,
        /// Mission description.
        description: String,
        /// Mission priority.
        priority: Priority,
        /// One task is created per definition.
        tasks: Vec<TaskDefinition>,
    },
    /// Hire for a role.
    Hire {
        /// Role to hire.
        role: EmployeeRole,
    },
    /// Purchase an upgrade.
    Tech {
        /// Catalog id of the upgrade.
        upgrade_id: String,
    },
}

impl ProposalPayload {
    /// The proposal kind implied by this payload.
    pub const fn kind(&self) -> ProposalKind {
        match self {
            Self::Mission { .. } => ProposalKind::Mission,
            Self::Hire { .. } => ProposalKind::Hire,
            Self::Tech { .. } => ProposalKind::Tech,
        }
    }
}

/// An advisory suggestion awaiting a human decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Proposal {
    /// Unique proposal identifier.
    pub id: ProposalId,
    /// Short title.
    pub title: String,
    /// What would happen on approval.
    pub description: String,
    /// Why the advisor suggests it.
    pub reasoning: String,
    /// Urgency.
    pub priority: Priority,
    /// Tick the proposal was created.
    pub created_at: u64,
    /// Decision state; terminal once it leaves `pending`.
    pub status: ProposalStatus,
    /// Type-specific data.
    pub payload: ProposalPayload,
}

impl Proposal {
    /// The kind of proposal, derived from its payload.
    pub const fn kind(&self) -> ProposalKind {
        self.payload.kind()
    }

    /// Whether the proposal is still awaiting a decision.
    pub fn is_pending(&self) -> bool {
        self.status == ProposalStatus::Pending
    }
}

/// A hiring intent surfaced by approving a hire proposal. The human
/// completes it through the hire command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HireIntent {
    /// Proposal that produced the intent.
    pub proposal_id: ProposalId,
    /// Role to hire.
    pub role: EmployeeRole,
    /// Tick the intent was recorded.
    pub created_at: u64,
}

// ---------------------------------------------------------------------------
// Notifications, advisor, treasury
// ---------------------------------------------------------------------------

/// A user-facing message on the notification side-channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Notification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// Message text.
    pub message: String,
    /// Severity.
    pub severity: Severity,
    /// Simulation tick when the notification was raised.
    pub tick: u64,
    /// Wall-clock time when the notification was raised.
    pub created_at: DateTime<Utc>,
}

/// A line of advisor reasoning kept for observability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Thought {
    /// Tick of the evaluation that produced the thought.
    pub tick: u64,
    /// The thought itself.
    pub text: String,
}

/// An append-only record of a treasury movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LedgerEntry {
    /// Tick of the movement.
    pub tick: u64,
    /// Category.
    pub kind: LedgerEntryKind,
    /// Amount moved (positive for the seed, cost for spends).
    #[ts(as = "String")]
    pub amount: Decimal,
    /// Human-readable memo.
    pub memo: String,
    /// Funds remaining after the movement.
    #[ts(as = "String")]
    pub balance_after: Decimal,
}

/// A purchasable upgrade and whether it has been bought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Upgrade {
    /// Catalog id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// What the upgrade does.
    pub description: String,
    /// Purchase cost.
    #[ts(as = "String")]
    pub cost: Decimal,
    /// Completed tasks required before the advisor suggests it.
    pub unlock_after_tasks: u32,
    /// Whether the upgrade has been purchased.
    pub purchased: bool,
}

/// Company-wide counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CompanyStats {
    /// Tasks moved to done.
    pub tasks_completed: u32,
    /// Missions completed.
    pub features_shipped: u32,
    /// AI jobs that finished successfully.
    pub ai_jobs_completed: u32,
    /// AI jobs dropped after exhausting retries.
    pub ai_jobs_dropped: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(ticks: u64) -> TaskDefinition {
        TaskDefinition::new("Login page", "Build the login page", TaskType::Feature, ticks)
    }

    #[test]
    fn zero_estimate_is_raised_to_one() {
        let task = Task::new(&definition(0), TaskStatus::Todo, 3);
        assert_eq!(task.estimated_ticks, 1);
        assert_eq!(task.created_at, 3);
        assert_eq!(task.progress_ticks, 0);
    }

    #[test]
    fn progress_percent_is_bounded() {
        let mut task = Task::new(&definition(4), TaskStatus::InProgress, 0);
        task.progress_ticks = 1;
        assert_eq!(task.progress_percent(), 25);
        task.progress_ticks = 4;
        assert_eq!(task.progress_percent(), 100);
    }

    #[test]
    fn payload_determines_kind() {
        let payload = ProposalPayload::Hire {
            role: EmployeeRole::Designer,
        };
        assert_eq!(payload.kind(), ProposalKind::Hire);
        let payload = ProposalPayload::Tech {
            upgrade_id: "ci".to_owned(),
        };
        assert_eq!(payload.kind(), ProposalKind::Tech);
    }

    #[test]
    fn task_definition_defaults_when_fields_missing() {
        let parsed: Result<TaskDefinition, _> = serde_json::from_str(r#"{"title": "Docs"}"#);
        assert!(parsed.is_ok());
        if let Ok(def) = parsed {
            assert_eq!(def.task_type, TaskType::Feature);
            assert_eq!(def.priority, Priority::Medium);
            assert_eq!(def.estimated_ticks, 10);
            assert!(def.description.is_empty());
        }
    }

    #[test]
    fn payload_serializes_with_type_tag() {
        let payload = ProposalPayload::Hire {
            role: EmployeeRole::Pm,
        };
        let json = serde_json::to_value(&payload).ok();
        assert_eq!(
            json,
            Some(serde_json::json!({"type": "hire", "role": "pm"}))
        );
    }
}

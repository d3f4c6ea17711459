//! Enumeration types for the Codeshop simulation.
//!
//! Every enum serializes in `snake_case` so the presentation layer sees
//! `in_progress` rather than `InProgress`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// The kind of work a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TaskType {
    /// New product functionality.
    Feature,
    /// A defect fix.
    Bug,
    /// Visual or interaction design work.
    Design,
    /// Marketing copy or campaigns.
    Marketing,
    /// Build, deploy, or tooling work.
    Infrastructure,
}

impl TaskType {
    /// Lowercase tag used in memory records and prompts.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Bug => "bug",
            Self::Design => "design",
            Self::Marketing => "marketing",
            Self::Infrastructure => "infrastructure",
        }
    }
}

/// Position of a task in its workflow.
///
/// The normal path is `backlog -> todo -> in_progress -> review -> done`.
/// Only the clock drives `in_progress -> review` automatically; every other
/// transition is an explicit command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TaskStatus {
    /// Captured but not yet planned.
    Backlog,
    /// Planned and ready to be picked up.
    Todo,
    /// Assigned and accumulating progress ticks.
    InProgress,
    /// Work finished, awaiting sign-off.
    Review,
    /// Signed off.
    Done,
}

impl TaskStatus {
    /// Whether the task still counts as unstarted work (`backlog` or `todo`).
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Backlog | Self::Todo)
    }
}

/// Urgency of a task, mission, or proposal.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Priority {
    /// Nice to have.
    Low,
    /// Default urgency.
    #[default]
    Medium,
    /// Should be picked up soon.
    High,
    /// Drop everything.
    Critical,
}

impl Priority {
    /// Sort rank used by the AI work queue: `critical = 1` through `low = 4`.
    /// Lower ranks are processed first.
    pub const fn queue_rank(self) -> u8 {
        match self {
            Self::Critical => 1,
            Self::High => 2,
            Self::Medium => 3,
            Self::Low => 4,
        }
    }
}

// ---------------------------------------------------------------------------
// Employees
// ---------------------------------------------------------------------------

/// The job an employee was hired for.
///
/// The role decides how a generation result is interpreted when the AI work
/// queue finishes a job for that employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EmployeeRole {
    /// Writes code; produces code artifacts with file paths.
    Engineer,
    /// Produces a design-spec artifact.
    Designer,
    /// Product manager; produces new backlog tasks instead of an artifact.
    Pm,
    /// Produces a marketing-copy artifact.
    Marketer,
}

impl EmployeeRole {
    /// Core roles the advisor tries to staff, in fill order.
    pub const CORE: [Self; 3] = [Self::Engineer, Self::Designer, Self::Pm];

    /// Lowercase label used in prompts, logs, and notifications.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Engineer => "engineer",
            Self::Designer => "designer",
            Self::Pm => "pm",
            Self::Marketer => "marketer",
        }
    }
}

/// Availability of an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EmployeeStatus {
    /// Free to take a task.
    Idle,
    /// Bound to exactly one task (`current_task_id` is set).
    Working,
    /// Unable to progress.
    Blocked,
    /// Temporarily away.
    OnBreak,
}

// ---------------------------------------------------------------------------
// AI work queue
// ---------------------------------------------------------------------------

/// Lifecycle of an AI work item. Completed items are removed rather than
/// marked, so there is no `done` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum WorkItemStatus {
    /// Waiting in the priority queue.
    Queued,
    /// Claimed by the processor; a generation call is outstanding.
    InProgress,
}

/// What kind of output an artifact holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ArtifactKind {
    /// Source code for one file.
    Code,
    /// A design specification with CSS.
    Design,
    /// Marketing copy.
    Copy,
}

impl ArtifactKind {
    /// Lowercase tag used in memory records.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Design => "design",
            Self::Copy => "copy",
        }
    }
}

// ---------------------------------------------------------------------------
// Missions
// ---------------------------------------------------------------------------

/// Lifecycle of a mission.
///
/// `planning -> active -> review -> merging -> completed` is monotonic.
/// `abandoned` is reachable from every state except `completed` and is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MissionStatus {
    /// Being scoped; tasks sit in the backlog.
    Planning,
    /// Work under way.
    Active,
    /// Pull request open for review.
    Review,
    /// Being merged into the main line.
    Merging,
    /// Shipped. Terminal.
    Completed,
    /// Given up. Terminal.
    Abandoned,
}

impl MissionStatus {
    /// Position on the forward path, or `None` for `abandoned`.
    pub const fn stage(self) -> Option<u8> {
        match self {
            Self::Planning => Some(0),
            Self::Active => Some(1),
            Self::Review => Some(2),
            Self::Merging => Some(3),
            Self::Completed => Some(4),
            Self::Abandoned => None,
        }
    }

    /// Whether no further transition is possible.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }

    /// Whether moving from `self` to `next` respects the mission state
    /// machine: strictly forward along the stage order, or to `abandoned`
    /// from any non-terminal state.
    pub fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.stage(), next.stage()) {
            (_, None) => true,
            (Some(from), Some(to)) => to > from,
            (None, Some(_)) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Proposals
// ---------------------------------------------------------------------------

/// What an advisory proposal suggests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ProposalKind {
    /// Start a new mission with generated tasks.
    Mission,
    /// Hire someone for a missing role.
    Hire,
    /// Buy a technology upgrade.
    Tech,
}

/// Decision state of a proposal. Leaving `pending` is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ProposalStatus {
    /// Awaiting a human decision.
    Pending,
    /// Approved and executed.
    Approved,
    /// Rejected; kept as an audit record.
    Rejected,
}

// ---------------------------------------------------------------------------
// Notifications, advisor, ledger
// ---------------------------------------------------------------------------

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Severity {
    /// Neutral information.
    Info,
    /// Something the player asked for happened.
    Success,
    /// Something was skipped or looks off.
    Warning,
    /// An action was rejected.
    Error,
}

/// Coarse stage of the product, derived by the advisor from task and
/// mission counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ProductPhase {
    /// No tasks exist yet.
    Inception,
    /// Less than half of all tasks are done.
    Building,
    /// Most work is done but few features have shipped.
    Shipping,
    /// Several features have shipped.
    Scaling,
}

/// Category of a treasury ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum LedgerEntryKind {
    /// Funds seeded at company creation.
    Seed,
    /// Hiring cost paid for a new employee.
    Hire,
    /// Upgrade purchase.
    Upgrade,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_rank_orders_critical_first() {
        assert_eq!(Priority::Critical.queue_rank(), 1);
        assert_eq!(Priority::High.queue_rank(), 2);
        assert_eq!(Priority::Medium.queue_rank(), 3);
        assert_eq!(Priority::Low.queue_rank(), 4);
    }

    #[test]
    fn mission_moves_forward_only() {
        assert!(MissionStatus::Planning.can_transition_to(MissionStatus::Active));
        assert!(MissionStatus::Active.can_transition_to(MissionStatus::Completed));
        assert!(!MissionStatus::Review.can_transition_to(MissionStatus::Active));
        assert!(!MissionStatus::Active.can_transition_to(MissionStatus::Active));
    }

    #[test]
    fn abandonment_is_terminal_and_unreachable_from_completed() {
        assert!(MissionStatus::Merging.can_transition_to(MissionStatus::Abandoned));
        assert!(!MissionStatus::Completed.can_transition_to(MissionStatus::Abandoned));
        assert!(!MissionStatus::Abandoned.can_transition_to(MissionStatus::Active));
        assert!(!MissionStatus::Abandoned.can_transition_to(MissionStatus::Abandoned));
    }

    #[test]
    fn statuses_serialize_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).ok();
        assert_eq!(json.as_deref(), Some("\"in_progress\""));
        let json = serde_json::to_string(&EmployeeStatus::OnBreak).ok();
        assert_eq!(json.as_deref(), Some("\"on_break\""));
    }

    #[test]
    fn pending_covers_backlog_and_todo() {
        assert!(TaskStatus::Backlog.is_pending());
        assert!(TaskStatus::Todo.is_pending());
        assert!(!TaskStatus::InProgress.is_pending());
    }
}

//! Change events emitted by the entity store.
//!
//! Every command appends one or more [`ChangeEvent`]s to the store's
//! outbox. The runner drains the outbox and forwards events to observers,
//! which rebroadcast them to connected dashboards.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{EmployeeRole, MissionStatus, ProposalKind, ProposalStatus, Severity, TaskStatus};
use crate::ids::{
    CommitId, EmployeeId, MissionId, NotificationId, ProposalId, TaskId, WorkItemId,
};

/// A single state change, stamped with the tick it happened on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ChangeEvent {
    /// Simulation tick of the change.
    pub tick: u64,
    /// What changed.
    pub change: Change,
}

/// The kinds of change the store reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Change {
    /// The clock advanced.
    Ticked,
    /// A task was created.
    TaskCreated {
        /// New task.
        task_id: TaskId,
    },
    /// A task changed status.
    TaskStatusChanged {
        /// Task affected.
        task_id: TaskId,
        /// New status.
        status: TaskStatus,
    },
    /// A task was bound to an employee.
    TaskAssigned {
        /// Task affected.
        task_id: TaskId,
        /// Employee now working on it.
        employee_id: EmployeeId,
    },
    /// A task lost its assignee.
    TaskUnassigned {
        /// Task affected.
        task_id: TaskId,
    },
    /// An employee joined.
    EmployeeHired {
        /// New employee.
        employee_id: EmployeeId,
        /// Their role.
        role: EmployeeRole,
    },
    /// An employee left.
    EmployeeFired {
        /// Departed employee.
        employee_id: EmployeeId,
    },
    /// A task entered the AI work queue.
    WorkEnqueued {
        /// Queued item.
        item_id: WorkItemId,
        /// Task it generates for.
        task_id: TaskId,
    },
    /// The processor claimed an item.
    WorkStarted {
        /// Claimed item.
        item_id: WorkItemId,
        /// Task it generates for.
        task_id: TaskId,
    },
    /// Generation succeeded and the result was merged.
    WorkCompleted {
        /// Finished item.
        item_id: WorkItemId,
        /// Task that received the output.
        task_id: TaskId,
        /// Artifacts attached to the task.
        artifacts: u32,
    },
    /// Generation failed and the item went back in the queue.
    WorkRetried {
        /// Requeued item.
        item_id: WorkItemId,
        /// Task it generates for.
        task_id: TaskId,
        /// Failed attempts so far.
        retries: u8,
    },
    /// Generation failed too often and the item was discarded.
    WorkDropped {
        /// Discarded item.
        item_id: WorkItemId,
        /// Task left without output.
        task_id: TaskId,
    },
    /// A mission was created.
    MissionCreated {
        /// New mission.
        mission_id: MissionId,
    },
    /// A mission moved along its lifecycle.
    MissionStatusChanged {
        /// Mission affected.
        mission_id: MissionId,
        /// New status.
        status: MissionStatus,
    },
    /// The active mission selection changed.
    ActiveMissionChanged {
        /// Newly selected mission, if any.
        mission_id: Option<MissionId>,
    },
    /// A commit was appended to a mission.
    CommitRecorded {
        /// Mission affected.
        mission_id: MissionId,
        /// New commit.
        commit_id: CommitId,
    },
    /// The advisor emitted a proposal.
    ProposalCreated {
        /// New proposal.
        proposal_id: ProposalId,
        /// Its kind.
        kind: ProposalKind,
    },
    /// A proposal was approved or rejected.
    ProposalDecided {
        /// Proposal affected.
        proposal_id: ProposalId,
        /// Decision.
        status: ProposalStatus,
    },
    /// A proposal was deleted without a decision.
    ProposalDismissed {
        /// Removed proposal.
        proposal_id: ProposalId,
    },
    /// An approved hire proposal is waiting for the human to hire.
    HireRequested {
        /// Source proposal.
        proposal_id: ProposalId,
        /// Role to hire.
        role: EmployeeRole,
    },
    /// An upgrade was purchased.
    UpgradePurchased {
        /// Catalog id.
        upgrade_id: String,
    },
    /// A notification was raised.
    Notified {
        /// New notification.
        notification_id: NotificationId,
        /// Its severity.
        severity: Severity,
    },
}

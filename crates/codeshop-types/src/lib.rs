//! Shared type definitions for the Codeshop company simulation.
//!
//! Every crate in the workspace speaks these types. They flow downstream to
//! `TypeScript` via `ts-rs` for the dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for entity identifiers
//! - [`enums`] -- Statuses, roles, priorities, and other enumerations
//! - [`structs`] -- Tasks, employees, missions, proposals, and their records
//! - [`generation`] -- Request/response contract for artifact generation
//! - [`events`] -- Change events emitted by the entity store

pub mod enums;
pub mod events;
pub mod generation;
pub mod ids;
pub mod structs;

pub use enums::{
    ArtifactKind, EmployeeRole, EmployeeStatus, LedgerEntryKind, MissionStatus, Priority,
    ProductPhase, ProposalKind, ProposalStatus, Severity, TaskStatus, TaskType, WorkItemStatus,
};
pub use events::{Change, ChangeEvent};
pub use generation::{GeneratedFile, GenerationOutput, GenerationRequest};
pub use ids::{
    ArtifactId, CommitId, EmployeeId, MissionId, NotificationId, ProposalId, TaskId, WorkItemId,
};
pub use structs::{
    AiWorkItem, Artifact, Commit, CompanyStats, Employee, HireIntent, LedgerEntry, MemoryRecord,
    Mission, Notification, Proposal, ProposalPayload, PullRequestRef, Task, TaskDefinition,
    Thought, Upgrade,
};

//! Identifier newtypes.
//!
//! Each entity kind gets its own wrapper so a task id can never be handed
//! to an employee lookup. Ids are UUID v7, which sort by creation time, so
//! `BTreeMap` iteration roughly follows creation order.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

macro_rules! entity_ids {
    ($( $(#[$doc:meta])* $name:ident; )+) => {$(
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Fresh time-ordered id.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// The wrapped UUID.
            pub const fn as_uuid(self) -> Uuid {
                self.0
            }

            /// Leading eight hex digits, used in log lines and commit
            /// hashes.
            pub fn short(&self) -> String {
                self.0.simple().to_string().chars().take(8).collect()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    )+};
}

entity_ids! {
    /// Identifies a task.
    TaskId;
    /// Identifies an employee.
    EmployeeId;
    /// Identifies a mission.
    MissionId;
    /// Identifies an entry in the AI work queue.
    WorkItemId;
    /// Identifies an advisor proposal.
    ProposalId;
    /// Identifies a generated artifact.
    ArtifactId;
    /// Identifies a commit recorded on a mission.
    CommitId;
    /// Identifies a notification.
    NotificationId;
}

//! Contract types for the artifact-generation collaborator.
//!
//! The AI work queue builds a [`GenerationRequest`] from fresh store state,
//! hands it to a generator, and interprets the returned
//! [`GenerationOutput`] according to the employee's role.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{EmployeeRole, Priority, TaskType};
use crate::ids::{EmployeeId, TaskId, WorkItemId};
use crate::structs::TaskDefinition;

/// Everything a generator needs to produce role-appropriate output for one
/// task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GenerationRequest {
    /// Work item being processed.
    pub work_item_id: WorkItemId,
    /// Task to generate output for.
    pub task_id: TaskId,
    /// Task title.
    pub task_title: String,
    /// Task description.
    pub task_description: String,
    /// Kind of work.
    pub task_type: TaskType,
    /// Task urgency.
    pub priority: Priority,
    /// Employee doing the work.
    pub employee_id: EmployeeId,
    /// Employee display name.
    pub employee_name: String,
    /// Employee role; decides the expected output shape.
    pub role: EmployeeRole,
    /// Employee specialization tags.
    pub specializations: Vec<String>,
    /// Company name, for project context.
    pub company_name: String,
    /// Name and description of the mission the task belongs to.
    pub mission_context: Option<String>,
    /// Summaries of the employee's most recent experiences.
    pub recent_memory: Vec<String>,
    /// Simulation tick when the request was built.
    pub tick: u64,
}

/// One generated source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GeneratedFile {
    /// Repository-relative path.
    pub file_path: String,
    /// File contents.
    pub content: String,
}

/// Role-shaped output returned by a generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum GenerationOutput {
    /// Engineer output.
    Code {
        /// Individual files.
        files: Vec<GeneratedFile>,
        /// All code concatenated, used when no files were split out.
        combined: String,
    },
    /// Designer output.
    Design {
        /// Prose design specification.
        description: String,
        /// Accompanying stylesheet.
        css: String,
    },
    /// Marketer output.
    Copy {
        /// Headline.
        headline: String,
        /// Body text.
        body: String,
        /// Call to action.
        cta: String,
    },
    /// Product manager output: new backlog work.
    Plan {
        /// Tasks to create.
        tasks: Vec<TaskDefinition>,
    },
}

impl GenerationOutput {
    /// Whether this output shape is the one expected from `role`.
    pub const fn matches_role(&self, role: EmployeeRole) -> bool {
        matches!(
            (self, role),
            (Self::Code { .. }, EmployeeRole::Engineer)
                | (Self::Design { .. }, EmployeeRole::Designer)
                | (Self::Copy { .. }, EmployeeRole::Marketer)
                | (Self::Plan { .. }, EmployeeRole::Pm)
        )
    }

    /// Short label for logs.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Code { .. } => "code",
            Self::Design { .. } => "design",
            Self::Copy { .. } => "copy",
            Self::Plan { .. } => "plan",
        }
    }
}

//! Artifact generator trait and the scripted implementation.
//!
//! The AI work queue hands a [`GenerationRequest`] to an
//! [`ArtifactGenerator`] and awaits a role-shaped [`GenerationOutput`]. The
//! generator is the only suspension point of the engine; it may fail, and
//! its own error is the only failure signal (there is no engine timeout).
//!
//! [`ScriptedGenerator`] produces deterministic output from the request
//! alone. It runs the simulation offline and drives the tests. The LLM
//! backed generator lives in `codeshop-runner`.

use codeshop_types::{
    EmployeeRole, GeneratedFile, GenerationOutput, GenerationRequest, Priority, TaskDefinition,
    TaskType,
};

use crate::mission::slugify;

/// Errors a generator can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// The provider failed (network, HTTP status, quota).
    #[error("provider error: {message}")]
    Provider {
        /// Description of the failure.
        message: String,
    },

    /// The provider answered with something unusable.
    #[error("unparsable generation output: {message}")]
    Parse {
        /// Description of the problem.
        message: String,
    },

    /// The output shape does not fit the employee's role.
    #[error("expected output for a {expected}, got {got}")]
    RoleMismatch {
        /// Role label of the employee.
        expected: String,
        /// Label of the output received.
        got: String,
    },
}

/// A source of role-appropriate work output.
///
/// Implementations may suspend for a long time. The queue processor
/// releases the store lock for the duration of the call.
#[allow(async_fn_in_trait)]
pub trait ArtifactGenerator {
    /// Produce output for one work item.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] when no usable output could be produced;
    /// the queue then retries or drops the item.
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError>;
}

/// A generator that derives its output from the request text without any
/// external call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedGenerator;

impl ScriptedGenerator {
    /// Create a new scripted generator.
    pub const fn new() -> Self {
        Self
    }

    /// The output for `request`, computed synchronously.
    pub fn output_for(request: &GenerationRequest) -> GenerationOutput {
        let slug = {
            let s = slugify(&request.task_title);
            if s.is_empty() { "task".to_owned() } else { s }
        };
        let module = slug.replace('-', "_");

        match request.role {
            EmployeeRole::Engineer => {
                let files = vec![
                    GeneratedFile {
                        file_path: format!("src/{module}.rs"),
                        content: format!(
                            "//! {title}\n\n/// {description}\npub fn {module}() -> bool {{\n    true\n}}\n",
                            title = request.task_title,
                            description = first_line(&request.task_description),
                        ),
                    },
                    GeneratedFile {
                        file_path: format!("tests/{module}_test.rs"),
                        content: format!(
                            "#[test]\nfn {module}_works() {{\n    assert!(app::{module}());\n}}\n"
                        ),
                    },
                ];
                let combined = files
                    .iter()
                    .map(|f| format!("// {}\n{}", f.file_path, f.content))
                    .collect::<Vec<_>>()
                    .join("\n");
                GenerationOutput::Code { files, combined }
            }
            EmployeeRole::Designer => GenerationOutput::Design {
                description: format!(
                    "Layout for {}: a single column card with a clear primary action.",
                    request.task_title
                ),
                css: format!(
                    ".{slug} {{\n  display: flex;\n  flex-direction: column;\n  gap: 1rem;\n  padding: 1.5rem;\n}}\n"
                ),
            },
            EmployeeRole::Marketer => GenerationOutput::Copy {
                headline: format!("Meet {}", request.task_title),
                body: format!(
                    "{} brings {} to your workflow.",
                    request.company_name,
                    request.task_title.to_lowercase()
                ),
                cta: "Start free today".to_owned(),
            },
            EmployeeRole::Pm => GenerationOutput::Plan {
                tasks: vec![
                    TaskDefinition {
                        title: format!("Test coverage for {}", request.task_title),
                        description: format!("Add tests around {}", request.task_title),
                        task_type: TaskType::Infrastructure,
                        priority: request.priority,
                        estimated_ticks: 4,
                    },
                    TaskDefinition {
                        title: format!("Polish {}", request.task_title),
                        description: format!("UI polish pass for {}", request.task_title),
                        task_type: TaskType::Design,
                        priority: Priority::Low,
                        estimated_ticks: 3,
                    },
                ],
            },
        }
    }
}

impl ArtifactGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        Ok(Self::output_for(request))
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default().trim()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use codeshop_types::{EmployeeId, TaskId, WorkItemId};

    use super::*;

    fn request(role: EmployeeRole) -> GenerationRequest {
        GenerationRequest {
            work_item_id: WorkItemId::new(),
            task_id: TaskId::new(),
            task_title: "Password Reset".to_owned(),
            task_description: "Email a reset link".to_owned(),
            task_type: TaskType::Feature,
            priority: Priority::High,
            employee_id: EmployeeId::new(),
            employee_name: "Ada".to_owned(),
            role,
            specializations: Vec::new(),
            company_name: "Codeshop".to_owned(),
            mission_context: None,
            recent_memory: Vec::new(),
            tick: 4,
        }
    }

    #[tokio::test]
    async fn scripted_output_matches_every_role() {
        let generator = ScriptedGenerator::new();
        for role in [
            EmployeeRole::Engineer,
            EmployeeRole::Designer,
            EmployeeRole::Pm,
            EmployeeRole::Marketer,
        ] {
            let output = generator.generate(&request(role)).await.unwrap();
            assert!(output.matches_role(role), "{role:?} got {}", output.label());
        }
    }

    #[test]
    fn engineer_files_use_task_slug() {
        let output = ScriptedGenerator::output_for(&request(EmployeeRole::Engineer));
        let GenerationOutput::Code { files, combined } = output else {
            panic!("expected code output");
        };
        assert_eq!(files.len(), 2);
        assert_eq!(files.first().unwrap().file_path, "src/password_reset.rs");
        assert!(combined.contains("tests/password_reset_test.rs"));
    }

    #[test]
    fn pm_plan_inherits_priority() {
        let output = ScriptedGenerator::output_for(&request(EmployeeRole::Pm));
        let GenerationOutput::Plan { tasks } = output else {
            panic!("expected plan output");
        };
        assert_eq!(tasks.first().unwrap().priority, Priority::High);
    }
}

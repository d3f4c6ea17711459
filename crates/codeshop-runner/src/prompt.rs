//! Prompt rendering via `minijinja`.
//!
//! The built-in templates are compiled into the binary. A templates
//! directory, when configured, overrides any of them file by file so
//! prompts can be tuned without recompiling.

use std::path::Path;

use codeshop_types::{EmployeeRole, GenerationRequest};
use minijinja::Environment;
use tracing::info;

use crate::error::LlmError;

/// Template names and their built-in sources.
const TEMPLATES: &[(&str, &str)] = &[
    ("system", include_str!("../templates/system.j2")),
    ("context", include_str!("../templates/context.j2")),
    ("engineer", include_str!("../templates/engineer.j2")),
    ("designer", include_str!("../templates/designer.j2")),
    ("marketer", include_str!("../templates/marketer.j2")),
    ("pm", include_str!("../templates/pm.j2")),
];

/// A rendered prompt ready for a backend.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message: who the employee is and the answer format.
    pub system: String,
    /// User message: the task and the deliverable for the role.
    pub user: String,
}

/// Holds the loaded templates.
#[derive(Debug)]
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// Load the templates, preferring `<dir>/<name>.j2` over the built-in
    /// version when `templates_dir` is set and the file exists.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Template`] if an override cannot be read or any
    /// template fails to compile.
    pub fn new(templates_dir: Option<&Path>) -> Result<Self, LlmError> {
        let mut env = Environment::new();
        for (name, builtin) in TEMPLATES {
            let source = match templates_dir.map(|dir| dir.join(format!("{name}.j2"))) {
                Some(path) if path.is_file() => {
                    info!(template = *name, path = %path.display(), "Using prompt override");
                    std::fs::read_to_string(&path).map_err(|e| {
                        LlmError::Template(format!("failed to read {}: {e}", path.display()))
                    })?
                }
                _ => (*builtin).to_owned(),
            };
            env.add_template_owned(*name, source)
                .map_err(|e| LlmError::Template(format!("failed to add {name} template: {e}")))?;
        }
        Ok(Self { env })
    }

    /// Render the prompt for `request`, picking the template for its role.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Template`] if rendering fails.
    pub fn render(&self, request: &GenerationRequest) -> Result<RenderedPrompt, LlmError> {
        let context = serde_json::to_value(request)?;
        let system = self.render_one("system", &context)?;
        let user = self.render_one(role_template(request.role), &context)?;
        Ok(RenderedPrompt { system, user })
    }

    fn render_one(&self, name: &str, context: &serde_json::Value) -> Result<String, LlmError> {
        self.env
            .get_template(name)
            .map_err(|e| LlmError::Template(format!("missing {name} template: {e}")))?
            .render(context)
            .map_err(|e| LlmError::Template(format!("{name} render failed: {e}")))
    }
}

const fn role_template(role: EmployeeRole) -> &'static str {
    match role {
        EmployeeRole::Engineer => "engineer",
        EmployeeRole::Designer => "designer",
        EmployeeRole::Marketer => "marketer",
        EmployeeRole::Pm => "pm",
    }
}

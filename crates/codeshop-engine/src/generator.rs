//! Generator selection.
//!
//! The engine runs with the LLM generator when credentials are present in
//! the environment and falls back to the scripted generator otherwise.

use codeshop_core::config::LlmConfig;
use codeshop_core::{ArtifactGenerator, GenerationError, ScriptedGenerator};
use codeshop_runner::{LlmBackendConfig, LlmError, LlmGenerator};
use codeshop_types::{GenerationOutput, GenerationRequest};
use tracing::info;

/// The generator the engine drives the queue with.
#[derive(Debug)]
pub enum EngineGenerator {
    /// Calls an LLM over HTTP.
    Llm(Box<LlmGenerator>),
    /// Deterministic offline output.
    Scripted(ScriptedGenerator),
}

impl EngineGenerator {
    /// Pick the generator from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] when credentials are present but unusable, for
    /// example `LLM_API_KEY` without `LLM_MODEL`.
    pub fn from_env(llm: &LlmConfig) -> Result<Self, LlmError> {
        let backend = LlmBackendConfig::from_env(llm)?;
        Self::select(backend.as_ref(), llm)
    }

    /// The LLM generator for `backend`, or the scripted one without it.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] if the LLM generator cannot be built.
    pub fn select(backend: Option<&LlmBackendConfig>, llm: &LlmConfig) -> Result<Self, LlmError> {
        match backend {
            Some(backend) => Ok(Self::Llm(Box::new(LlmGenerator::new(backend, llm)?))),
            None => {
                info!("LLM_API_KEY not set, using the scripted generator");
                Ok(Self::Scripted(ScriptedGenerator::new()))
            }
        }
    }

    /// Name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Llm(_) => "llm",
            Self::Scripted(_) => "scripted",
        }
    }
}

impl ArtifactGenerator for EngineGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        match self {
            Self::Llm(generator) => generator.generate(request).await,
            Self::Scripted(generator) => generator.generate(request).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use codeshop_runner::BackendType;
    use codeshop_types::{EmployeeId, EmployeeRole, Priority, TaskId, TaskType, WorkItemId};

    use super::*;

    #[test]
    fn no_backend_means_scripted() {
        let generator = EngineGenerator::select(None, &LlmConfig::default()).unwrap();
        assert_eq!(generator.name(), "scripted");
    }

    #[test]
    fn backend_means_llm() {
        let backend = LlmBackendConfig {
            backend_type: BackendType::Anthropic,
            api_url: "http://localhost:1".to_owned(),
            api_key: "key".to_owned(),
            model: "model".to_owned(),
            request_timeout: Duration::from_secs(1),
            max_tokens: 64,
        };
        let generator = EngineGenerator::select(Some(&backend), &LlmConfig::default()).unwrap();
        assert_eq!(generator.name(), "llm");
    }

    #[tokio::test]
    async fn scripted_output_fits_role() {
        let generator = EngineGenerator::select(None, &LlmConfig::default()).unwrap();
        let request = GenerationRequest {
            work_item_id: WorkItemId::new(),
            task_id: TaskId::new(),
            task_title: "Hero banner".to_owned(),
            task_description: String::new(),
            task_type: TaskType::Design,
            priority: Priority::Low,
            employee_id: EmployeeId::new(),
            employee_name: "Kai".to_owned(),
            role: EmployeeRole::Designer,
            specializations: Vec::new(),
            company_name: "Codeshop".to_owned(),
            mission_context: None,
            recent_memory: Vec::new(),
            tick: 1,
        };
        let output = generator.generate(&request).await.unwrap();
        assert!(output.matches_role(EmployeeRole::Designer));
    }
}

//! [`ArtifactGenerator`] backed by an LLM.

use std::path::Path;

use codeshop_core::config::LlmConfig;
use codeshop_core::{ArtifactGenerator, GenerationError};
use codeshop_types::{GenerationOutput, GenerationRequest};
use tracing::{debug, info, warn};

use crate::config::LlmBackendConfig;
use crate::error::LlmError;
use crate::llm::{LlmBackend, create_backend};
use crate::parse::parse_generation;
use crate::prompt::PromptEngine;

/// Renders a prompt per request, calls the backend, and parses the reply
/// into the output shape of the employee's role.
#[derive(Debug)]
pub struct LlmGenerator {
    backend: LlmBackend,
    prompts: PromptEngine,
}

impl LlmGenerator {
    /// Build a generator from backend settings and the prompt settings in
    /// `llm`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] if the HTTP client cannot be built or the
    /// templates fail to load.
    pub fn new(backend: &LlmBackendConfig, llm: &LlmConfig) -> Result<Self, LlmError> {
        let prompts = PromptEngine::new(llm.templates_dir.as_deref().map(Path::new))?;
        let backend = create_backend(backend)?;
        info!(
            backend = backend.name(),
            model = backend.model(),
            "LLM generator ready"
        );
        Ok(Self { backend, prompts })
    }

    async fn try_generate(&self, request: &GenerationRequest) -> Result<GenerationOutput, LlmError> {
        let prompt = self.prompts.render(request)?;
        let raw = self.backend.complete(&prompt).await?;
        debug!(
            work_item_id = %request.work_item_id,
            chars = raw.len(),
            "Parsing LLM output"
        );
        parse_generation(&raw, request.role)
    }
}

impl ArtifactGenerator for LlmGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        self.try_generate(request).await.map_err(|err| {
            warn!(
                work_item_id = %request.work_item_id,
                backend = self.backend.name(),
                error = %err,
                "LLM generation failed"
            );
            GenerationError::from(err)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::routing::post;
    use axum::{Json, Router};
    use codeshop_types::{EmployeeId, EmployeeRole, Priority, TaskId, TaskType, WorkItemId};

    use super::*;
    use crate::config::BackendType;

    fn request(role: EmployeeRole) -> GenerationRequest {
        GenerationRequest {
            work_item_id: WorkItemId::new(),
            task_id: TaskId::new(),
            task_title: "Pricing page".to_owned(),
            task_description: String::new(),
            task_type: TaskType::Marketing,
            priority: Priority::Medium,
            employee_id: EmployeeId::new(),
            employee_name: "Lin".to_owned(),
            role,
            specializations: Vec::new(),
            company_name: "Codeshop".to_owned(),
            mission_context: None,
            recent_memory: Vec::new(),
            tick: 3,
        }
    }

    /// Serve a fixed chat-completions reply on a local port.
    async fn fake_openai(content: &'static str) -> String {
        let app = Router::new().route(
            "/chat/completions",
            post(move || async move {
                Json(serde_json::json!({
                    "choices": [{"message": {"content": content}}]
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{addr}")
    }

    fn backend(api_url: String) -> LlmBackendConfig {
        LlmBackendConfig {
            backend_type: BackendType::OpenAi,
            api_url,
            api_key: "test".to_owned(),
            model: "test-model".to_owned(),
            request_timeout: Duration::from_secs(5),
            max_tokens: 256,
        }
    }

    #[tokio::test]
    async fn marketer_copy_round_trip() {
        let url = fake_openai(r#"{"headline": "Simple pricing", "body": "One plan.", "cta": "Buy"}"#)
            .await;
        let generator = LlmGenerator::new(&backend(url), &LlmConfig::default()).unwrap();

        let output = generator
            .generate(&request(EmployeeRole::Marketer))
            .await
            .unwrap();
        assert!(output.matches_role(EmployeeRole::Marketer));
    }

    #[tokio::test]
    async fn wrong_shape_is_a_parse_failure() {
        let url = fake_openai(r#"{"headline": "Simple pricing"}"#).await;
        let generator = LlmGenerator::new(&backend(url), &LlmConfig::default()).unwrap();

        let err = generator
            .generate(&request(EmployeeRole::Pm))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Parse { .. }));
    }

    #[test]
    fn no_credentials_means_no_generator() {
        let found = LlmBackendConfig::from_lookup(|_| None, &LlmConfig::default()).unwrap();
        assert!(found.is_none());
    }
}

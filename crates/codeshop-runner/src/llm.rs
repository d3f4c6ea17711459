//! HTTP clients for the two supported completion APIs.
//!
//! An enum rather than a trait object, because async methods are not
//! dyn-compatible. Both shapes send one system and one user message and
//! hand back the first text block of the reply.

use std::time::Duration;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{BackendType, LlmBackendConfig};
use crate::error::LlmError;
use crate::prompt::RenderedPrompt;

/// Header value for the Anthropic Messages API version.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Sampling temperature for `OpenAI`-compatible requests.
const TEMPERATURE: f32 = 0.7;

/// A configured completion API.
#[derive(Debug)]
pub enum LlmBackend {
    /// `OpenAI`-compatible `/chat/completions`.
    OpenAi(HttpBackend),
    /// Anthropic `/messages`.
    Anthropic(HttpBackend),
}

impl LlmBackend {
    /// Send `prompt` and return the reply text.
    ///
    /// # Errors
    ///
    /// [`LlmError::Backend`] when the request fails, the provider answers
    /// with an error status, or the reply holds no text.
    pub async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, LlmError> {
        let name = self.name();
        match self {
            Self::OpenAi(http) => {
                let body = ChatRequest {
                    model: &http.model,
                    messages: [
                        Message::new("system", &prompt.system),
                        Message::new("user", &prompt.user),
                    ],
                    temperature: TEMPERATURE,
                    max_tokens: http.max_tokens,
                    response_format: ResponseFormat {
                        kind: "json_object",
                    },
                };
                let request = http
                    .client
                    .post(format!("{}/chat/completions", http.api_url))
                    .bearer_auth(&http.api_key)
                    .json(&body);
                http.send::<ChatResponse>(name, request).await?.into_text()
            }
            Self::Anthropic(http) => {
                let body = MessagesRequest {
                    model: &http.model,
                    max_tokens: http.max_tokens,
                    system: &prompt.system,
                    messages: [Message::new("user", &prompt.user)],
                };
                let request = http
                    .client
                    .post(format!("{}/messages", http.api_url))
                    .header("x-api-key", &http.api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .json(&body);
                http.send::<MessagesResponse>(name, request).await?.into_text()
            }
        }
    }

    /// Short name used in logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
        }
    }

    /// Model the backend asks for.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAi(http) | Self::Anthropic(http) => &http.model,
        }
    }
}

/// Client and credentials shared by both API shapes.
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

// Keeps the key out of debug output.
impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl HttpBackend {
    fn new(config: &LlmBackendConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout.max(Duration::from_millis(1)))
            .build()
            .map_err(|e| LlmError::Config(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    async fn send<R: DeserializeOwned>(
        &self,
        backend: &'static str,
        request: RequestBuilder,
    ) -> Result<R, LlmError> {
        let response = request
            .send()
            .await
            .map_err(|e| LlmError::Backend(format!("{backend}: {e}")))?;

        let status = response.status();
        debug!(backend, model = %self.model, %status, "Completion answered");
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(LlmError::Backend(format!("{backend} answered {status}: {detail}")));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| LlmError::Backend(format!("{backend} reply is not the expected JSON: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> Message<'a> {
    const fn new(role: &'static str, content: &'a str) -> Self {
        Self { role, content }
    }
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Result<String, LlmError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Backend("completion has no message content".to_owned()))
    }
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    fn into_text(self) -> Result<String, LlmError> {
        self.content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| LlmError::Backend("message has no text block".to_owned()))
    }
}

/// Build the backend `config` names.
///
/// # Errors
///
/// [`LlmError::Config`] if the HTTP client cannot be built.
pub fn create_backend(config: &LlmBackendConfig) -> Result<LlmBackend, LlmError> {
    let http = HttpBackend::new(config)?;
    Ok(match config.backend_type {
        BackendType::OpenAi => LlmBackend::OpenAi(http),
        BackendType::Anthropic => LlmBackend::Anthropic(http),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn config(backend_type: BackendType) -> LlmBackendConfig {
        LlmBackendConfig {
            backend_type,
            api_url: "http://localhost:1/".to_owned(),
            api_key: "secret-key".to_owned(),
            model: "test-model".to_owned(),
            request_timeout: Duration::from_secs(1),
            max_tokens: 256,
        }
    }

    #[test]
    fn chat_reply_yields_first_choice() {
        let reply: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"css\": \"a {}\"}"}}]
        }))
        .unwrap();
        assert!(reply.into_text().unwrap().contains("css"));
    }

    #[test]
    fn chat_reply_without_choices_is_an_error() {
        let reply: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(reply.into_text(), Err(LlmError::Backend(_))));
        assert!(serde_json::from_value::<ChatResponse>(json!({"error": "rate_limit"})).is_err());
    }

    #[test]
    fn messages_reply_skips_non_text_blocks() {
        let reply: MessagesResponse = serde_json::from_value(json!({
            "content": [
                {"type": "tool_use", "id": "t1"},
                {"type": "text", "text": "{\"headline\": \"Hi\"}"}
            ]
        }))
        .unwrap();
        assert!(reply.into_text().unwrap().contains("headline"));
    }

    #[test]
    fn chat_request_matches_the_wire_format() {
        let body = serde_json::to_value(ChatRequest {
            model: "m",
            messages: [Message::new("system", "s"), Message::new("user", "u")],
            temperature: TEMPERATURE,
            max_tokens: 10,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        })
        .unwrap();
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn backend_follows_config_and_hides_the_key() {
        let backend = create_backend(&config(BackendType::OpenAi)).unwrap();
        assert_eq!(backend.name(), "openai-compatible");
        let backend = create_backend(&config(BackendType::Anthropic)).unwrap();
        assert_eq!(backend.name(), "anthropic");
        assert_eq!(backend.model(), "test-model");
        assert!(!format!("{backend:?}").contains("secret-key"));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_backend_error() {
        let backend = create_backend(&config(BackendType::OpenAi)).unwrap();
        let prompt = RenderedPrompt {
            system: "s".to_owned(),
            user: "u".to_owned(),
        };
        let err = backend.complete(&prompt).await.unwrap_err();
        assert!(matches!(err, LlmError::Backend(_)));
    }
}

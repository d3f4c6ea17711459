//! Backend selection and credentials, read from the environment.
//!
//! Credentials never live in `codeshop-config.yaml`. Without an API key the
//! engine falls back to the scripted generator.

use std::time::Duration;

use codeshop_core::config::LlmConfig;

use crate::error::LlmError;

/// Supported LLM API shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// `OpenAI`-compatible chat completions (`OpenAI`, `DeepSeek`, Ollama).
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
}

impl BackendType {
    /// Parse a backend name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "openai" | "deepseek" | "ollama" => Some(Self::OpenAi),
            "anthropic" | "claude" => Some(Self::Anthropic),
            _ => None,
        }
    }

    const fn default_api_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
        }
    }
}

/// Everything needed to talk to one LLM backend.
#[derive(Debug, Clone)]
pub struct LlmBackendConfig {
    /// API shape.
    pub backend_type: BackendType,
    /// Base URL, without a trailing slash.
    pub api_url: String,
    /// API key.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Completion token limit.
    pub max_tokens: u32,
}

impl LlmBackendConfig {
    /// Build a backend config from `lookup` (normally the process
    /// environment) and the file settings.
    ///
    /// Reads `LLM_BACKEND` (default `openai`), `LLM_API_URL`,
    /// `LLM_API_KEY`, and `LLM_MODEL`. Returns `Ok(None)` when no API key is
    /// set.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Config`] for an unknown backend name or a missing
    /// model.
    pub fn from_lookup<F>(lookup: F, settings: &LlmConfig) -> Result<Option<Self>, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(api_key) = lookup("LLM_API_KEY").filter(|k| !k.trim().is_empty()) else {
            return Ok(None);
        };

        let backend_name = lookup("LLM_BACKEND").unwrap_or_else(|| "openai".to_owned());
        let backend_type = BackendType::parse(&backend_name)
            .ok_or_else(|| LlmError::Config(format!("unknown backend type: {backend_name}")))?;
        let api_url = lookup("LLM_API_URL")
            .unwrap_or_else(|| backend_type.default_api_url().to_owned())
            .trim_end_matches('/')
            .to_owned();
        let model = lookup("LLM_MODEL")
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| LlmError::Config("LLM_MODEL is required with LLM_API_KEY".to_owned()))?;

        Ok(Some(Self {
            backend_type,
            api_url,
            api_key,
            model,
            request_timeout: Duration::from_millis(settings.request_timeout_ms),
            max_tokens: settings.max_tokens,
        }))
    }

    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// See [`from_lookup`](Self::from_lookup).
    pub fn from_env(settings: &LlmConfig) -> Result<Option<Self>, LlmError> {
        Self::from_lookup(|key| std::env::var(key).ok(), settings)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn no_key_means_no_backend() {
        let config = LlmBackendConfig::from_lookup(lookup(&[]), &LlmConfig::default()).unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn defaults_to_openai_url() {
        let config = LlmBackendConfig::from_lookup(
            lookup(&[("LLM_API_KEY", "k"), ("LLM_MODEL", "m")]),
            &LlmConfig::default(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(config.backend_type, BackendType::OpenAi);
        assert_eq!(config.api_url, "https://api.openai.com/v1");
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn anthropic_with_custom_url() {
        let config = LlmBackendConfig::from_lookup(
            lookup(&[
                ("LLM_API_KEY", "k"),
                ("LLM_MODEL", "m"),
                ("LLM_BACKEND", "Claude"),
                ("LLM_API_URL", "http://localhost:9000/v1/"),
            ]),
            &LlmConfig::default(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(config.backend_type, BackendType::Anthropic);
        assert_eq!(config.api_url, "http://localhost:9000/v1");
    }

    #[test]
    fn unknown_backend_is_an_error() {
        let result = LlmBackendConfig::from_lookup(
            lookup(&[("LLM_API_KEY", "k"), ("LLM_MODEL", "m"), ("LLM_BACKEND", "bard")]),
            &LlmConfig::default(),
        );
        assert!(matches!(result, Err(LlmError::Config(_))));
    }

    #[test]
    fn key_without_model_is_an_error() {
        let result =
            LlmBackendConfig::from_lookup(lookup(&[("LLM_API_KEY", "k")]), &LlmConfig::default());
        assert!(matches!(result, Err(LlmError::Config(_))));
    }
}

//! Failures of LLM-backed generation.

use codeshop_core::GenerationError;

/// Why an LLM-backed generation attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Missing or inconsistent backend settings.
    #[error("LLM settings: {0}")]
    Config(String),

    /// A prompt template could not be loaded or rendered.
    #[error("prompt template: {0}")]
    Template(String),

    /// Transport failure, error status, or a reply without text.
    #[error("completion call: {0}")]
    Backend(String),

    /// The reply text does not describe the expected work output.
    #[error("unusable completion: {0}")]
    Parse(String),

    /// The prompt context could not be serialized.
    #[error("prompt context: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<LlmError> for GenerationError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Parse(message) => Self::Parse { message },
            other => Self::Provider {
                message: other.to_string(),
            },
        }
    }
}

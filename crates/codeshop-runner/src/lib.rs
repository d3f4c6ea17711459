//! LLM-backed artifact generation for the Codeshop simulation.
//!
//! [`LlmGenerator`] implements [`codeshop_core::ArtifactGenerator`]: it
//! renders a role-specific prompt, calls an `OpenAI`-compatible or
//! Anthropic endpoint, and parses the reply into the output shape the
//! employee's role calls for. Provider and parse failures become
//! [`codeshop_core::GenerationError`]s, which the work queue retries.
//!
//! # Modules
//!
//! - [`config`] -- Backend selection and credentials from the environment.
//! - [`llm`] -- HTTP backends.
//! - [`prompt`] -- `minijinja` templates with on-disk overrides.
//! - [`parse`] -- Tolerant JSON parsing of replies.
//! - [`generator`] -- The generator itself.
//! - [`error`] -- [`LlmError`].

pub mod config;
pub mod error;
pub mod generator;
pub mod llm;
pub mod parse;
pub mod prompt;

pub use config::{BackendType, LlmBackendConfig};
pub use error::LlmError;
pub use generator::LlmGenerator;

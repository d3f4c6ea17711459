//! Failures that stop the engine.
//!
//! Each variant wraps the error of one start-up or run stage so `run` can
//! use `?` throughout.

use crate::persistence::PersistenceError;

/// Why the engine exited with an error.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The config file is unreadable or invalid.
    #[error("cannot load configuration: {source}")]
    Config {
        /// Config loader error.
        #[from]
        source: codeshop_core::ConfigError,
    },

    /// The snapshot file could not be read or written.
    #[error("snapshot file: {source}")]
    Persistence {
        /// File or JSON error.
        #[from]
        source: PersistenceError,
    },

    /// The snapshot was read but does not describe a valid company.
    #[error("cannot restore snapshot: {source}")]
    Snapshot {
        /// Restore error.
        #[from]
        source: codeshop_core::SnapshotError,
    },

    /// LLM settings in the environment are unusable.
    #[error("cannot build LLM generator: {source}")]
    Generator {
        /// Backend or template error.
        #[from]
        source: codeshop_runner::LlmError,
    },

    /// The clock or queue loop failed.
    #[error("simulation failed: {source}")]
    Runner {
        /// Loop error.
        #[from]
        source: codeshop_core::RunnerError,
    },
}

//! Error types for xof
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::llm::LlmError;
use crate::script::ScriptError;

/// All error types that can abort a refine loop
#[derive(Debug, Error)]
pub enum XofError {
    /// Configuration could not be found or is unusable
    #[error("Config error: {0}")]
    Config(String),

    /// Generation backend failure (never retried)
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Script infrastructure failure (temp file, spawn, cancellation)
    #[error("Script error: {0}")]
    Script(ScriptError),

    /// Invalid context glob pattern
    #[error("Glob error: {0}")]
    Glob(#[from] glob::PatternError),

    /// The caller cancelled the run
    #[error("Cancelled")]
    Cancelled,

    /// Attempt budget spent without a passing verification
    #[error("attempted {attempts} time(s) and failed")]
    Exhausted { attempts: i64 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for xof operations
pub type Result<T> = std::result::Result<T, XofError>;

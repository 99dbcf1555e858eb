//! Error types for the orchestrator.

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("IO error: {0}")]
    IoError(String),

    /// The file is not valid YAML for a [`PipelineConfig`](crate::PipelineConfig).
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A value is out of range.
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Errors that end a pipeline run.
///
/// Remote failures are not among them: they are recorded on the run and
/// followed by local simulation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The caller cancelled the run.
    #[error("Run cancelled")]
    Cancelled,

    /// An executor rejected the request itself (shots, timeout).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Neither a remote backend nor the local simulator produced a result.
    #[error("No viable execution path: {0}")]
    NoViablePath(String),
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

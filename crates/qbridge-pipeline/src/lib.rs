//! qbridge orchestrator
//!
//! Threads one request through every stage and decides where it runs:
//!
//! ```text
//! CredentialResolver ──→ connect ──→ Session (read-only, shared)
//!                                        │
//!             ┌──────────────────────────┘
//!             v
//!   for each online backend:  compile ──→ RemoteExecutor ──┐
//!             │ (all failed, or none)                      │
//!             v                                            v
//!   local simulator:          compile ──→ SimulatorBackend ──→ validate
//! ```
//!
//! A missing credential, an unreachable provider and an empty backend list
//! all lead to local execution; each fallback is recorded in the
//! [`SessionSummary`]. A run only fails when no circuit produced a result
//! ([`PipelineError::NoViablePath`]) or when it was cancelled.
//!
//! # Example
//!
//! ```ignore
//! use qbridge_hal::CancelToken;
//! use qbridge_pipeline::{CircuitJob, Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::default();
//! let job = CircuitJob::bell(&config.validation)?;
//! let summary = Pipeline::new(config).run(&[job], &CancelToken::new()).await?;
//! assert!(summary.succeeded());
//! ```

pub mod config;
pub mod error;
pub mod job;
pub mod pipeline;
pub mod summary;

pub use config::{CredentialConfig, PipelineConfig, ValidationConfig};
pub use error::{ConfigError, PipelineError, PipelineResult};
pub use job::CircuitJob;
pub use pipeline::{Connection, Pipeline};
pub use summary::{BackendSummary, ExecutionPath, FailedAttempt, RunRecord, SessionSummary};

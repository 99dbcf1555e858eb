//! The session-summary record produced by a pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use qbridge_eval::ValidationVerdict;
use qbridge_hal::{BackendDescriptor, BackendStatus, ExecutionResult, Provenance};

/// Which execution path produced a run's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPath {
    /// A remote backend.
    Remote,
    /// The simulator, because no remote backend was available.
    Local,
    /// The simulator, after every remote attempt failed.
    LocalFallback,
}

/// A target that was tried and failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedAttempt {
    /// Target identity, e.g. `remote:ibm_fez`.
    pub target: String,
    /// Stage that failed: `compile` or `execute`.
    pub stage: String,
    /// Error message.
    pub error: String,
}

/// Name and capacity of a discovered backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSummary {
    /// Backend name.
    pub name: String,
    /// Qubit capacity.
    pub num_qubits: u32,
    /// Operational status at discovery.
    pub status: BackendStatus,
}

impl From<&BackendDescriptor> for BackendSummary {
    fn from(desc: &BackendDescriptor) -> Self {
        Self {
            name: desc.name.clone(),
            num_qubits: desc.num_qubits,
            status: desc.status,
        }
    }
}

/// Everything that happened to one circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Circuit name.
    pub circuit: String,
    /// Path that produced the result, if any did.
    pub path: Option<ExecutionPath>,
    /// Targets tried before the one that succeeded.
    pub failed_attempts: Vec<FailedAttempt>,
    /// The measurement result.
    pub result: Option<ExecutionResult>,
    /// Validation outcome, when the job named a property.
    pub verdict: Option<ValidationVerdict>,
}

impl RunRecord {
    /// A result was produced and, if checked, it passed.
    pub fn succeeded(&self) -> bool {
        self.result.is_some() && self.verdict.as_ref().is_none_or(|v| v.passed)
    }
}

/// The persisted status artifact of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Where the credential came from.
    pub credential: Provenance,
    /// Whether a remote session was established.
    pub remote_connected: bool,
    /// Provider name, when connected.
    pub provider: Option<String>,
    /// Why the run is local-only, or `connected`.
    pub connect_outcome: String,
    /// Backends discovered, in provider order.
    pub backends: Vec<BackendSummary>,
    /// One record per circuit, in submission order.
    pub runs: Vec<RunRecord>,
}

impl SessionSummary {
    /// Exit-status rule: at least one circuit ran, and every circuit
    /// produced a result that passed its check.
    pub fn succeeded(&self) -> bool {
        !self.runs.is_empty() && self.runs.iter().all(RunRecord::succeeded)
    }

    /// Validation verdicts produced, in run order.
    pub fn verdicts(&self) -> impl Iterator<Item = &ValidationVerdict> {
        self.runs.iter().filter_map(|r| r.verdict.as_ref())
    }
}

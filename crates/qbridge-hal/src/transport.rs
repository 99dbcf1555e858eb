//! The seam between the directory/execution logic and a provider's wire protocol.

use async_trait::async_trait;

use qbridge_ir::Circuit;

use crate::backend::BackendStatus;
use crate::error::TransportResult;
use crate::job::{JobId, JobStatus};
use crate::result::Counts;

/// Outcome of the authenticating handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    /// Provider name, e.g. `ibm_quantum`.
    pub provider: String,
    /// Backend names visible to the token, in provider order.
    pub devices: Vec<String>,
}

/// Capability and status metadata for one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBackendInfo {
    /// Backend name.
    pub name: String,
    /// Qubit count.
    pub num_qubits: u32,
    /// Operational status.
    pub status: BackendStatus,
    /// Native gate names.
    pub basis_gates: Vec<String>,
    /// Whether the provider marks this backend as a simulator.
    pub simulator: bool,
    /// Shot limit, if reported.
    pub max_shots: Option<u32>,
    /// Pending jobs, if reported.
    pub queue_length: Option<u32>,
}

/// A quantum-cloud provider's request/response protocol.
///
/// Every call carries the token explicitly; implementations hold no
/// per-session state.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Authenticate and list backend names.
    async fn handshake(&self, token: &str) -> TransportResult<Handshake>;

    /// Fetch one backend's configuration and status.
    async fn describe_backend(&self, token: &str, name: &str) -> TransportResult<RemoteBackendInfo>;

    /// Submit a native circuit for `shots` executions.
    async fn submit_job(
        &self,
        token: &str,
        backend: &str,
        circuit: &Circuit,
        shots: u32,
    ) -> TransportResult<JobId>;

    /// Current status of a job.
    async fn job_status(&self, token: &str, job: &JobId) -> TransportResult<JobStatus>;

    /// Counts of a completed job.
    async fn job_result(&self, token: &str, job: &JobId) -> TransportResult<Counts>;

    /// Ask the provider to cancel a job.
    async fn cancel_job(&self, token: &str, job: &JobId) -> TransportResult<()>;
}

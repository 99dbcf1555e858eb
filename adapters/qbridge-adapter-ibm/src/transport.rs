//! [`Transport`] over the IBM Quantum REST API.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tracing::{debug, instrument, warn};

use qbridge_hal::{
    BackendStatus, Counts, Handshake, JobId, JobStatus, RemoteBackendInfo, Transport,
    TransportResult,
};
use qbridge_ir::Circuit;

use crate::api::{CLOUD_ENDPOINT, DEFAULT_ENDPOINT, IbmClient, JobResultResponse, JobStatusResponse};
use crate::error::{IbmError, IbmResult};

/// Provider name reported in the handshake.
pub const PROVIDER: &str = "ibm_quantum";

/// IBM Quantum transport.
///
/// Remembers the classical register width of each submitted job so that
/// hex-encoded samples decode to full-width bitstrings. An entry lives until
/// the job's result is fetched, it is cancelled, or it ends unsuccessfully.
#[derive(Debug)]
pub struct IbmTransport {
    client: IbmClient,
    widths: Mutex<FxHashMap<String, usize>>,
}

impl IbmTransport {
    /// Transport against the default endpoint, using the token as bearer.
    pub fn new() -> IbmResult<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Transport against a custom endpoint, using the token as bearer.
    pub fn with_endpoint(endpoint: impl Into<String>) -> IbmResult<Self> {
        Ok(Self::with_client(IbmClient::new(endpoint)?))
    }

    /// Transport against the IBM Cloud API for the instance `service_crn`.
    ///
    /// The access token is an IBM Cloud API key; `endpoint` defaults to
    /// [`CLOUD_ENDPOINT`].
    pub fn cloud(endpoint: Option<&str>, service_crn: &str) -> IbmResult<Self> {
        let endpoint = endpoint.unwrap_or(CLOUD_ENDPOINT);
        Ok(Self::with_client(IbmClient::cloud(endpoint, service_crn)?))
    }

    /// Transport over a configured client.
    pub fn with_client(client: IbmClient) -> Self {
        Self {
            client,
            widths: Mutex::new(FxHashMap::default()),
        }
    }

    /// The API base URL.
    pub fn endpoint(&self) -> &str {
        self.client.endpoint()
    }

    /// Whether requests authenticate through IAM with a Service-CRN.
    pub fn is_cloud_api(&self) -> bool {
        self.client.is_cloud_api()
    }

    /// Drop the recorded width of `job`, returning it.
    fn forget(&self, job: &JobId) -> Option<usize> {
        self.widths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&job.0)
    }

    #[cfg(test)]
    fn tracked_jobs(&self) -> usize {
        self.widths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Transport for IbmTransport {
    #[instrument(skip_all)]
    async fn handshake(&self, token: &str) -> TransportResult<Handshake> {
        let devices = self.client.list_devices(token).await?;
        debug!("IBM Quantum lists {} devices", devices.len());
        Ok(Handshake {
            provider: PROVIDER.to_string(),
            devices,
        })
    }

    #[instrument(skip(self, token))]
    async fn describe_backend(&self, token: &str, name: &str) -> TransportResult<RemoteBackendInfo> {
        let config = self.client.backend_configuration(token, name).await?;

        let (status, queue_length) = match self.client.backend_status(token, name).await {
            Ok(s) => (
                if s.state {
                    BackendStatus::Online
                } else {
                    BackendStatus::Offline
                },
                Some(u32::try_from(s.length_queue).unwrap_or(u32::MAX)),
            ),
            Err(e) => {
                warn!("status unavailable for {name}: {e}");
                (BackendStatus::Unknown, None)
            }
        };

        Ok(RemoteBackendInfo {
            name: config.backend_name,
            num_qubits: config.n_qubits,
            status,
            basis_gates: config.basis_gates,
            simulator: config.simulator,
            max_shots: config.max_shots,
            queue_length,
        })
    }

    #[instrument(skip(self, token, circuit), fields(circuit = %circuit.name()))]
    async fn submit_job(
        &self,
        token: &str,
        backend: &str,
        circuit: &Circuit,
        shots: u32,
    ) -> TransportResult<JobId> {
        let qasm = qbridge_qasm3::emit(circuit);
        let response = self
            .client
            .submit_sampler_job(token, backend, qasm, shots)
            .await?;

        let width = if circuit.has_measurements() {
            circuit.num_clbits()
        } else {
            circuit.num_qubits()
        };
        self.widths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(response.id.clone(), width);

        debug!("Submitted IBM job {}", response.id);
        Ok(JobId::new(response.id))
    }

    async fn job_status(&self, token: &str, job: &JobId) -> TransportResult<JobStatus> {
        let response = self.client.get_job_status(token, &job.0).await?;
        let status = map_status(&response);
        if matches!(status, JobStatus::Failed(_) | JobStatus::Cancelled) {
            self.forget(job);
        }
        Ok(status)
    }

    #[instrument(skip(self, token))]
    async fn job_result(&self, token: &str, job: &JobId) -> TransportResult<Counts> {
        let width = self.forget(job);
        let response = self.client.get_job_results(token, &job.0).await?;
        Ok(results_to_counts(&response, width)?)
    }

    async fn cancel_job(&self, token: &str, job: &JobId) -> TransportResult<()> {
        self.forget(job);
        self.client.cancel_job(token, &job.0).await?;
        Ok(())
    }
}

/// Map IBM's status string, whatever its casing.
fn map_status(response: &JobStatusResponse) -> JobStatus {
    match response.status.to_uppercase().as_str() {
        "QUEUED" | "INITIALIZING" | "VALIDATING" => JobStatus::Queued,
        "RUNNING" => JobStatus::Running,
        "COMPLETED" | "DONE" => JobStatus::Completed,
        "FAILED" | "ERROR" => JobStatus::Failed(
            response
                .reason()
                .unwrap_or("no reason given")
                .to_string(),
        ),
        "CANCELLED" | "CANCELED" => JobStatus::Cancelled,
        other => {
            debug!("Unrecognized IBM job status '{other}', treating as queued");
            JobStatus::Queued
        }
    }
}

/// Convert the first circuit's result to counts with classical bit 0 first.
///
/// V2 samples are decoded with the register width reported by the API,
/// else the width recorded at submission, else the widest sample.
fn results_to_counts(results: &JobResultResponse, width: Option<usize>) -> IbmResult<Counts> {
    let result = results
        .results
        .first()
        .ok_or_else(|| IbmError::Decode("result has no entries".into()))?;

    let mut counts = Counts::new();

    if let Some(register) = result.data.as_ref().and_then(|data| {
        data.get("c").or_else(|| data.values().next())
    }) {
        let width = register
            .num_bits
            .or(width)
            .unwrap_or_else(|| infer_bit_width(&register.samples));
        let mut tally: FxHashMap<&str, u64> = FxHashMap::default();
        for sample in &register.samples {
            *tally.entry(sample.as_str()).or_insert(0) += 1;
        }
        for (sample, count) in tally {
            counts.insert(hex_to_bitstring(sample, width)?, count);
        }
        return Ok(counts);
    }

    if let Some(raw) = &result.counts {
        for (key, &count) in raw {
            let bitstring = if key.starts_with("0x") {
                let width = width.unwrap_or_else(|| infer_bit_width(std::slice::from_ref(key)));
                hex_to_bitstring(key, width)?
            } else if !key.is_empty() && key.chars().all(|c| c == '0' || c == '1') {
                // Provider order is highest bit first.
                key.chars().rev().collect()
            } else {
                return Err(IbmError::Decode(format!("unrecognized outcome key '{key}'")));
            };
            counts.insert(bitstring, count);
        }
        return Ok(counts);
    }

    Err(IbmError::Decode("result carries neither samples nor counts".into()))
}

/// Bits needed for the largest sample, at least one.
fn infer_bit_width(samples: &[String]) -> usize {
    let max_val = samples
        .iter()
        .filter_map(|s| u64::from_str_radix(s.trim_start_matches("0x"), 16).ok())
        .max()
        .unwrap_or(0);
    (64 - max_val.leading_zeros() as usize).max(1)
}

/// Decode a hex outcome into `width` characters, classical bit 0 first.
fn hex_to_bitstring(hex: &str, width: usize) -> IbmResult<String> {
    let value = u64::from_str_radix(hex.trim_start_matches("0x"), 16)
        .map_err(|_| IbmError::Decode(format!("'{hex}' is not a hex outcome")))?;
    Ok((0..width)
        .map(|bit| if bit < 64 && (value >> bit) & 1 == 1 { '1' } else { '0' })
        .collect())
}

//! In-memory [`Transport`] for tests.
//!
//! Every method bumps a call counter so tests can assert exactly which
//! round trips happened (including "none at all").

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use qbridge_ir::Circuit;

use crate::backend::BackendStatus;
use crate::error::{TransportError, TransportResult};
use crate::job::{JobId, JobStatus};
use crate::result::Counts;
use crate::transport::{Handshake, RemoteBackendInfo, Transport};

/// How submitted jobs behave.
#[derive(Debug, Clone)]
pub enum JobScript {
    /// Complete on first poll with an even `00`/`11` split of the requested shots.
    Bell,
    /// Report `Running` for `polls` polls, then behave like [`JobScript::Bell`].
    BellAfter(u32),
    /// Stay `Queued` forever.
    NeverComplete,
    /// Accept the submission, then never answer a status poll or a cancel.
    Unresponsive,
    /// Fail on first poll with the given reason.
    Fail(String),
    /// Complete with exactly these counts, regardless of shots.
    Fixed(Counts),
}

/// An online IBM-style backend description.
pub fn device(name: &str, num_qubits: u32) -> RemoteBackendInfo {
    RemoteBackendInfo {
        name: name.to_string(),
        num_qubits,
        status: BackendStatus::Online,
        basis_gates: ["id", "rz", "sx", "x", "cx"].map(String::from).to_vec(),
        simulator: false,
        max_shots: Some(100_000),
        queue_length: Some(0),
    }
}

/// Scriptable fake provider.
pub struct FakeTransport {
    devices: Vec<RemoteBackendInfo>,
    handshake_error: Option<TransportError>,
    handshake_delay: Option<Duration>,
    describe_failures: Vec<String>,
    submit_error: Option<TransportError>,
    job: JobScript,
    last_shots: AtomicU32,
    submitted: Mutex<Vec<(String, Circuit)>>,
    /// Handshake calls.
    pub handshakes: AtomicUsize,
    /// Describe calls.
    pub describes: AtomicUsize,
    /// Submit calls.
    pub submits: AtomicUsize,
    /// Status polls.
    pub polls: AtomicUsize,
    /// Result fetches.
    pub results: AtomicUsize,
    /// Cancel requests.
    pub cancels: AtomicUsize,
}

impl FakeTransport {
    /// A provider listing `devices` whose jobs follow [`JobScript::Bell`].
    pub fn new(devices: Vec<RemoteBackendInfo>) -> Self {
        Self {
            devices,
            handshake_error: None,
            handshake_delay: None,
            describe_failures: vec![],
            submit_error: None,
            job: JobScript::Bell,
            last_shots: AtomicU32::new(0),
            submitted: Mutex::new(vec![]),
            handshakes: AtomicUsize::new(0),
            describes: AtomicUsize::new(0),
            submits: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            results: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
        }
    }

    /// Make the handshake fail.
    #[must_use]
    pub fn failing_handshake(mut self, error: TransportError) -> Self {
        self.handshake_error = Some(error);
        self
    }

    /// Delay the handshake.
    #[must_use]
    pub fn with_handshake_delay(mut self, delay: Duration) -> Self {
        self.handshake_delay = Some(delay);
        self
    }

    /// Make describing `name` fail.
    #[must_use]
    pub fn failing_describe(mut self, name: &str) -> Self {
        self.describe_failures.push(name.to_string());
        self
    }

    /// Make job submission fail.
    #[must_use]
    pub fn failing_submit(mut self, error: TransportError) -> Self {
        self.submit_error = Some(error);
        self
    }

    /// Set the job behaviour.
    #[must_use]
    pub fn with_jobs(mut self, job: JobScript) -> Self {
        self.job = job;
        self
    }

    /// Sum of all call counters.
    pub fn total_calls(&self) -> usize {
        [
            &self.handshakes,
            &self.describes,
            &self.submits,
            &self.polls,
            &self.results,
            &self.cancels,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }

    /// Cancel requests, counted once detached cancel tasks have had a chance to run.
    pub async fn settled_cancels(&self) -> usize {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
        self.cancels.load(Ordering::SeqCst)
    }

    /// `(backend, circuit)` pairs submitted so far.
    pub fn submitted(&self) -> Vec<(String, Circuit)> {
        self.submitted.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn bell_counts(&self) -> Counts {
        let shots = u64::from(self.last_shots.load(Ordering::SeqCst));
        let mut counts = Counts::new();
        counts.insert("00", shots / 2);
        counts.insert("11", shots - shots / 2);
        counts
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn handshake(&self, _token: &str) -> TransportResult<Handshake> {
        self.handshakes.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.handshake_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.handshake_error {
            return Err(err.clone());
        }
        Ok(Handshake {
            provider: "fake".to_string(),
            devices: self.devices.iter().map(|d| d.name.clone()).collect(),
        })
    }

    async fn describe_backend(&self, _token: &str, name: &str) -> TransportResult<RemoteBackendInfo> {
        self.describes.fetch_add(1, Ordering::SeqCst);
        if self.describe_failures.iter().any(|f| f == name) {
            return Err(TransportError::Api {
                status: 500,
                message: format!("cannot describe {name}"),
            });
        }
        self.devices
            .iter()
            .find(|d| d.name == name)
            .cloned()
            .ok_or_else(|| TransportError::NotFound(name.to_string()))
    }

    async fn submit_job(
        &self,
        _token: &str,
        backend: &str,
        circuit: &Circuit,
        shots: u32,
    ) -> TransportResult<JobId> {
        let n = self.submits.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.submit_error {
            return Err(err.clone());
        }
        self.last_shots.store(shots, Ordering::SeqCst);
        if let Ok(mut submitted) = self.submitted.lock() {
            submitted.push((backend.to_string(), circuit.clone()));
        }
        Ok(JobId::new(format!("job-{n}")))
    }

    async fn job_status(&self, _token: &str, _job: &JobId) -> TransportResult<JobStatus> {
        let polls = self.polls.fetch_add(1, Ordering::SeqCst) as u32;
        if matches!(self.job, JobScript::Unresponsive) {
            return std::future::pending().await;
        }
        Ok(match &self.job {
            JobScript::Bell | JobScript::Fixed(_) => JobStatus::Completed,
            JobScript::BellAfter(n) if polls < *n => JobStatus::Running,
            JobScript::BellAfter(_) => JobStatus::Completed,
            JobScript::NeverComplete | JobScript::Unresponsive => JobStatus::Queued,
            JobScript::Fail(reason) => JobStatus::Failed(reason.clone()),
        })
    }

    async fn job_result(&self, _token: &str, _job: &JobId) -> TransportResult<Counts> {
        self.results.fetch_add(1, Ordering::SeqCst);
        Ok(match &self.job {
            JobScript::Fixed(counts) => counts.clone(),
            _ => self.bell_counts(),
        })
    }

    async fn cancel_job(&self, _token: &str, _job: &JobId) -> TransportResult<()> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        if matches!(self.job, JobScript::Unresponsive) {
            return std::future::pending().await;
        }
        Ok(())
    }
}

//! Remote execution: submit, poll until terminal, fetch counts.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::backend::BackendDescriptor;
use crate::cancel::CancelToken;
use crate::error::{ExecError, ExecResult};
use crate::executor::{Executor, check_request};
use crate::job::{JobId, JobStatus};
use crate::program::CompiledProgram;
use crate::result::{Counts, ExecutionResult};
use crate::session::Session;
use crate::target::Target;

/// Default interval between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Upper bound on the detached provider-side cancel issued for an abandoned job.
const CANCEL_GRACE: Duration = Duration::from_secs(2);

/// Executes programs compiled for a [`BackendDescriptor`] through its session.
///
/// The whole job (submit, polling, result fetch) runs under the caller's
/// timeout. If the job was submitted but never finished, a best-effort
/// provider-side cancel is sent from a detached task; the call returns at
/// the deadline without waiting for it.
#[derive(Debug, Clone)]
pub struct RemoteExecutor {
    poll_interval: Duration,
}

impl Default for RemoteExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteExecutor {
    /// Create an executor with the default poll interval.
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    async fn run_job(
        &self,
        session: &Session,
        backend: &BackendDescriptor,
        program: &CompiledProgram,
        shots: u32,
        submitted: &mut Option<JobId>,
    ) -> ExecResult<Counts> {
        let transport = session.transport();
        let token = session.token();

        let job = transport
            .submit_job(token, &backend.name, program.circuit(), shots)
            .await
            .map_err(|e| ExecError::TransportFailure(e.to_string()))?;
        info!(job = %job, "job submitted");
        *submitted = Some(job.clone());

        loop {
            let status = transport
                .job_status(token, &job)
                .await
                .map_err(|e| ExecError::TransportFailure(e.to_string()))?;
            debug!(job = %job, %status, "polled");
            if status.is_terminal() {
                // Nothing left to cancel.
                *submitted = None;
            }

            match status {
                JobStatus::Completed => break,
                JobStatus::Failed(reason) => return Err(ExecError::JobFailed(reason)),
                JobStatus::Cancelled => {
                    return Err(ExecError::JobFailed("job cancelled by provider".into()));
                }
                JobStatus::Queued | JobStatus::Running => {
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        transport
            .job_result(token, &job)
            .await
            .map_err(|e| ExecError::TransportFailure(e.to_string()))
    }
}

/// Ask the provider to cancel `job` without blocking the caller.
///
/// The task holds its own session handle so the request can finish after
/// the executor has returned.
fn spawn_provider_cancel(session: Session, job: JobId) {
    warn!(job = %job, "abandoning job, requesting provider cancel");
    tokio::spawn(async move {
        let cancel_call = session.transport().cancel_job(session.token(), &job);
        match tokio::time::timeout(CANCEL_GRACE, cancel_call).await {
            Ok(Ok(())) => debug!(job = %job, "provider cancel acknowledged"),
            Ok(Err(e)) => warn!(job = %job, error = %e, "provider cancel failed"),
            Err(_) => warn!(job = %job, "provider cancel timed out"),
        }
    });
}

#[async_trait]
impl Executor for RemoteExecutor {
    fn name(&self) -> &str {
        "remote"
    }

    #[instrument(skip_all, fields(backend = %program.target().name(), shots))]
    async fn execute(
        &self,
        program: &CompiledProgram,
        shots: u32,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> ExecResult<ExecutionResult> {
        check_request(shots, timeout)?;

        let Target::Remote(backend) = program.target() else {
            return Err(ExecError::TargetMismatch {
                program: program.target_id().to_string(),
                executor: self.name().to_string(),
            });
        };
        if !backend.is_online() {
            return Err(ExecError::BackendOffline(backend.name.clone()));
        }
        if let Some(max) = backend.max_shots {
            if shots > max {
                return Err(ExecError::InvalidRequest(format!(
                    "{shots} shots exceeds the {max}-shot limit of {}",
                    backend.name
                )));
            }
        }
        let Some(session) = backend.session() else {
            return Err(ExecError::TransportFailure("session closed".into()));
        };
        if cancel.is_cancelled() {
            return Err(ExecError::Cancelled);
        }

        let start = Instant::now();
        let mut submitted = None;
        let outcome = {
            let job = self.run_job(&session, backend, program, shots, &mut submitted);
            tokio::select! {
                res = tokio::time::timeout(timeout, job) => res.unwrap_or(Err(ExecError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                })),
                () = cancel.cancelled() => Err(ExecError::Cancelled),
            }
        };

        if let Some(job) = submitted {
            spawn_provider_cancel(session, job);
        }

        let counts = outcome?;
        let total = counts.total_shots();
        if total != u64::from(shots) {
            return Err(ExecError::ResultMismatch {
                expected: u64::from(shots),
                got: total,
            });
        }

        Ok(ExecutionResult {
            counts,
            shots,
            produced_by: program.target_id(),
            duration: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use qbridge_ir::Circuit;

    use crate::backend::BackendStatus;
    use crate::credential::{Credential, Provenance};
    use crate::fake::{FakeTransport, JobScript, device};
    use crate::session::connect;
    use crate::target::TargetKind;

    async fn session_with(transport: Arc<FakeTransport>) -> Session {
        connect(
            &Credential::new("tok", Provenance::Env),
            transport,
            Duration::from_secs(1),
            &CancelToken::new(),
        )
        .await
        .unwrap()
    }

    fn program_for(session: &Session) -> CompiledProgram {
        CompiledProgram::new(
            Circuit::bell().unwrap(),
            Target::Remote(session.backends()[0].clone()),
        )
    }

    fn fast() -> RemoteExecutor {
        RemoteExecutor::new().with_poll_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_remote_execution_counts_sum_to_shots() {
        let transport = Arc::new(FakeTransport::new(vec![device("ibm_a", 5)]).with_jobs(JobScript::BellAfter(3)));
        let session = session_with(transport.clone()).await;

        let result = fast()
            .execute(&program_for(&session), 1001, Duration::from_secs(5), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(result.counts.total_shots(), 1001);
        assert_eq!(result.produced_by.kind, TargetKind::Remote);
        assert_eq!(result.produced_by.name, "ibm_a");
        assert_eq!(transport.polls.load(Ordering::SeqCst), 4);
        assert_eq!(transport.cancels.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_completing_job_times_out() {
        let transport =
            Arc::new(FakeTransport::new(vec![device("ibm_a", 5)]).with_jobs(JobScript::NeverComplete));
        let session = session_with(transport.clone()).await;

        let start = tokio::time::Instant::now();
        let err = fast()
            .execute(&program_for(&session), 100, Duration::from_millis(300), &CancelToken::new())
            .await
            .unwrap_err();

        assert_eq!(err, ExecError::Timeout { timeout_ms: 300 });
        assert!(start.elapsed() < Duration::from_millis(350));
        assert_eq!(transport.settled_cancels().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresponsive_provider_does_not_delay_timeout() {
        let transport =
            Arc::new(FakeTransport::new(vec![device("ibm_a", 5)]).with_jobs(JobScript::Unresponsive));
        let session = session_with(transport.clone()).await;

        let start = tokio::time::Instant::now();
        let err = fast()
            .execute(&program_for(&session), 100, Duration::from_millis(300), &CancelToken::new())
            .await
            .unwrap_err();

        assert_eq!(err, ExecError::Timeout { timeout_ms: 300 });
        assert!(start.elapsed() < Duration::from_millis(350));
        // The cancel was issued but never answered.
        assert_eq!(transport.settled_cancels().await, 1);
        assert_eq!(transport.results.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_returns_while_provider_cancel_hangs() {
        let transport =
            Arc::new(FakeTransport::new(vec![device("ibm_a", 5)]).with_jobs(JobScript::Unresponsive));
        let session = session_with(transport.clone()).await;
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let start = tokio::time::Instant::now();
        let err = fast()
            .execute(&program_for(&session), 100, Duration::from_secs(60), &cancel)
            .await
            .unwrap_err();

        assert_eq!(err, ExecError::Cancelled);
        assert!(start.elapsed() < Duration::from_millis(150));
        assert_eq!(transport.settled_cancels().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_cancel_outlives_dropped_session() {
        let transport =
            Arc::new(FakeTransport::new(vec![device("ibm_a", 5)]).with_jobs(JobScript::NeverComplete));
        let session = session_with(transport.clone()).await;
        let program = program_for(&session);

        let err = fast()
            .execute(&program, 100, Duration::from_millis(50), &CancelToken::new())
            .await
            .unwrap_err();
        drop(session);

        assert_eq!(err, ExecError::Timeout { timeout_ms: 50 });
        assert_eq!(transport.settled_cancels().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_poll() {
        let transport =
            Arc::new(FakeTransport::new(vec![device("ibm_a", 5)]).with_jobs(JobScript::NeverComplete));
        let session = session_with(transport.clone()).await;
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let err = fast()
            .execute(&program_for(&session), 100, Duration::from_secs(60), &cancel)
            .await
            .unwrap_err();

        assert_eq!(err, ExecError::Cancelled);
        assert_eq!(transport.settled_cancels().await, 1);
    }

    #[tokio::test]
    async fn test_failed_job() {
        let transport = Arc::new(
            FakeTransport::new(vec![device("ibm_a", 5)]).with_jobs(JobScript::Fail("calibration".into())),
        );
        let session = session_with(transport).await;

        let err = fast()
            .execute(&program_for(&session), 100, Duration::from_secs(1), &CancelToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, ExecError::JobFailed("calibration".into()));
    }

    #[tokio::test]
    async fn test_short_result_is_mismatch() {
        let mut counts = Counts::new();
        counts.insert("00", 10);
        let transport =
            Arc::new(FakeTransport::new(vec![device("ibm_a", 5)]).with_jobs(JobScript::Fixed(counts)));
        let session = session_with(transport).await;

        let err = fast()
            .execute(&program_for(&session), 100, Duration::from_secs(1), &CancelToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, ExecError::ResultMismatch { expected: 100, got: 10 });
    }

    #[tokio::test]
    async fn test_offline_backend_not_submitted() {
        let mut offline = device("ibm_down", 5);
        offline.status = BackendStatus::Offline;
        let transport = Arc::new(FakeTransport::new(vec![offline]));
        let session = session_with(transport.clone()).await;

        let err = fast()
            .execute(&program_for(&session), 100, Duration::from_secs(1), &CancelToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, ExecError::BackendOffline("ibm_down".into()));
        assert_eq!(transport.submits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_failure_is_transport_failure() {
        let transport = Arc::new(
            FakeTransport::new(vec![device("ibm_a", 5)])
                .failing_submit(crate::error::TransportError::Network("reset".into())),
        );
        let session = session_with(transport).await;

        let err = fast()
            .execute(&program_for(&session), 100, Duration::from_secs(1), &CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::TransportFailure(msg) if msg.contains("reset")));
    }

    #[tokio::test]
    async fn test_local_program_rejected() {
        let program = CompiledProgram::new(Circuit::bell().unwrap(), Target::local());
        let err = fast()
            .execute(&program, 100, Duration::from_secs(1), &CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::TargetMismatch { .. }));
    }

    #[tokio::test]
    async fn test_dropped_session_is_transport_failure() {
        let transport = Arc::new(FakeTransport::new(vec![device("ibm_a", 5)]));
        let session = session_with(transport).await;
        let program = program_for(&session);
        drop(session);

        let err = fast()
            .execute(&program, 100, Duration::from_secs(1), &CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::TransportFailure(_)));
    }

    #[tokio::test]
    async fn test_shot_limit() {
        let mut small = device("ibm_a", 5);
        small.max_shots = Some(10);
        let transport = Arc::new(FakeTransport::new(vec![small]));
        let session = session_with(transport).await;

        let err = fast()
            .execute(&program_for(&session), 11, Duration::from_secs(1), &CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::InvalidRequest(_)));
    }
}

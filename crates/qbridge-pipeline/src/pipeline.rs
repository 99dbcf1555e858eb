//! Resolver → Directory → Compiler → Engine → Validator, with explicit fallback.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use qbridge_adapter_sim::SimulatorBackend;
use qbridge_compile::{CompileCache, CompileResult, compile};
use qbridge_eval::validate;
use qbridge_hal::{
    BackendDescriptor, CancelToken, CompiledProgram, ConnectError, CredentialResolver, ExecError,
    ExecutionResult, Executor, Provenance, RemoteExecutor, Session, Target, Transport, connect,
};
use qbridge_ir::Circuit;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::job::CircuitJob;
use crate::summary::{BackendSummary, ExecutionPath, FailedAttempt, RunRecord, SessionSummary};

/// Outcome of credential resolution plus the connect attempt.
#[derive(Debug)]
pub struct Connection {
    /// Where the credential came from.
    pub provenance: Provenance,
    /// The remote session, if one was established.
    pub session: Option<Session>,
    /// `connected`, or why the run is local-only.
    pub outcome: String,
}

/// The orchestrator.
///
/// Every remote failure is recorded and followed by the next candidate
/// backend, then the local simulator. Only cancellation, an invalid request,
/// or the absence of any result ends a run with an error.
pub struct Pipeline {
    config: PipelineConfig,
    resolver: CredentialResolver,
    transport: Option<Arc<dyn Transport>>,
    remote: RemoteExecutor,
    simulator: SimulatorBackend,
    cache: Option<CompileCache>,
}

impl Pipeline {
    /// Build a local-only pipeline from `config`; add a transport for remote runs.
    pub fn new(config: PipelineConfig) -> Self {
        let resolver = config.credential.resolver();
        let remote = RemoteExecutor::new().with_poll_interval(config.poll_interval());
        let simulator = match config.seed {
            Some(seed) => SimulatorBackend::new().with_seed(seed),
            None => SimulatorBackend::new(),
        };
        Self {
            config,
            resolver,
            transport: None,
            remote,
            simulator,
            cache: None,
        }
    }

    /// Talk to a remote provider through `transport`.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the credential resolver built from the config.
    #[must_use]
    pub fn with_resolver(mut self, resolver: CredentialResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the local simulator.
    #[must_use]
    pub fn with_simulator(mut self, simulator: SimulatorBackend) -> Self {
        self.simulator = simulator;
        self
    }

    /// Memoize compilation by (circuit, target).
    #[must_use]
    pub fn with_compile_cache(mut self) -> Self {
        self.cache = Some(CompileCache::new());
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The local simulator every run falls back to.
    pub fn simulator(&self) -> &SimulatorBackend {
        &self.simulator
    }

    /// Compile cache `(hits, misses)`, when enabled.
    pub fn cache_stats(&self) -> Option<(u64, u64)> {
        self.cache.as_ref().map(CompileCache::stats)
    }

    /// Resolve the credential and try to open a session.
    ///
    /// Every outcome other than cancellation is a [`Connection`]; a missing
    /// credential or an unreachable provider just leaves `session` empty.
    #[instrument(skip_all)]
    pub async fn open_session(&self, cancel: &CancelToken) -> PipelineResult<Connection> {
        if self.config.local_only {
            info!("local-only mode, skipping remote discovery");
            return Ok(Connection {
                provenance: Provenance::None,
                session: None,
                outcome: "local-only mode".to_string(),
            });
        }

        let credential = self.resolver.resolve();
        let provenance = credential.provenance();

        let Some(transport) = &self.transport else {
            return Ok(Connection {
                provenance,
                session: None,
                outcome: "no remote provider configured".to_string(),
            });
        };

        match connect(
            &credential,
            Arc::clone(transport),
            self.config.connect_timeout(),
            cancel,
        )
        .await
        {
            Ok(session) => Ok(Connection {
                provenance,
                session: Some(session),
                outcome: "connected".to_string(),
            }),
            Err(ConnectError::Cancelled) => Err(PipelineError::Cancelled),
            Err(ConnectError::NoCredential) => {
                info!("no credential found, running locally");
                Ok(Connection {
                    provenance,
                    session: None,
                    outcome: ConnectError::NoCredential.to_string(),
                })
            }
            Err(e) => {
                warn!(error = %e, "remote provider unavailable, running locally");
                Ok(Connection {
                    provenance,
                    session: None,
                    outcome: e.to_string(),
                })
            }
        }
    }

    /// Run every job, concurrently, and summarize.
    pub async fn run(&self, jobs: &[CircuitJob], cancel: &CancelToken) -> PipelineResult<SessionSummary> {
        self.config.validate()?;
        let started_at = Utc::now();
        let connection = self.open_session(cancel).await?;

        let backends: &[BackendDescriptor] = connection
            .session
            .as_ref()
            .map(Session::backends)
            .unwrap_or_default();
        let candidates = self.candidates(backends);

        let runs = join_all(jobs.iter().map(|job| self.run_job(job, &candidates, cancel)))
            .await
            .into_iter()
            .collect::<PipelineResult<Vec<_>>>()?;

        if !runs.is_empty() && runs.iter().all(|r| r.result.is_none()) {
            let detail = runs
                .iter()
                .flat_map(|r| {
                    r.failed_attempts.iter().map(move |a| {
                        format!("{} on {} ({}): {}", r.circuit, a.target, a.stage, a.error)
                    })
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(PipelineError::NoViablePath(detail));
        }

        Ok(SessionSummary {
            started_at,
            credential: connection.provenance,
            remote_connected: connection.session.is_some(),
            provider: connection.session.as_ref().map(|s| s.provider().to_string()),
            connect_outcome: connection.outcome,
            backends: backends.iter().map(BackendSummary::from).collect(),
            runs,
        })
    }

    /// Online backends that accept the configured shots, in provider order.
    fn candidates<'a>(&self, backends: &'a [BackendDescriptor]) -> Vec<&'a BackendDescriptor> {
        backends
            .iter()
            .filter(|b| {
                let usable = b.is_online() && b.max_shots.is_none_or(|max| self.config.shots <= max);
                if !usable {
                    debug!(backend = %b.name, status = %b.status, "not a candidate");
                }
                usable
            })
            .take(self.config.max_remote_backends)
            .collect()
    }

    #[instrument(skip_all, fields(circuit = %job.name()))]
    async fn run_job(
        &self,
        job: &CircuitJob,
        candidates: &[&BackendDescriptor],
        cancel: &CancelToken,
    ) -> PipelineResult<RunRecord> {
        let mut failed = Vec::new();
        let mut outcome = None;

        for backend in candidates {
            let target = Target::Remote((*backend).clone());
            if let Some(result) = self
                .attempt(&self.remote, &job.circuit, &target, cancel, &mut failed)
                .await?
            {
                outcome = Some((ExecutionPath::Remote, result));
                break;
            }
        }

        if outcome.is_none() {
            let path = if failed.is_empty() {
                ExecutionPath::Local
            } else {
                ExecutionPath::LocalFallback
            };
            let target = self.simulator.target();
            if let Some(result) = self
                .attempt(&self.simulator, &job.circuit, &target, cancel, &mut failed)
                .await?
            {
                outcome = Some((path, result));
            }
        }

        let verdict = match (&outcome, &job.property) {
            (Some((_, result)), Some(property)) => Some(validate(result, property)),
            _ => None,
        };
        if let Some(v) = &verdict {
            info!(passed = v.passed, statistic = v.statistic, "validated");
        }

        let (path, result) = outcome.unzip();
        Ok(RunRecord {
            circuit: job.name().to_string(),
            path,
            failed_attempts: failed,
            result,
            verdict,
        })
    }

    /// Compile and execute on one target; failures that allow fallback are
    /// recorded and reported as `None`.
    async fn attempt(
        &self,
        executor: &dyn Executor,
        circuit: &Circuit,
        target: &Target,
        cancel: &CancelToken,
        failed: &mut Vec<FailedAttempt>,
    ) -> PipelineResult<Option<ExecutionResult>> {
        let program = match self.compile(circuit, target) {
            Ok(program) => program,
            Err(e) => {
                warn!(target_id = %target.id(), error = %e, "compilation failed");
                failed.push(FailedAttempt {
                    target: target.id().to_string(),
                    stage: "compile".to_string(),
                    error: e.to_string(),
                });
                return Ok(None);
            }
        };

        match executor
            .execute(&program, self.config.shots, self.config.timeout(), cancel)
            .await
        {
            Ok(result) => {
                info!(
                    target_id = %result.produced_by,
                    duration_ms = result.duration.as_millis() as u64,
                    "executed"
                );
                Ok(Some(result))
            }
            Err(ExecError::Cancelled) => Err(PipelineError::Cancelled),
            Err(e) if !e.allows_fallback() => Err(PipelineError::InvalidRequest(e.to_string())),
            Err(e) => {
                warn!(target_id = %target.id(), error = %e, "execution failed");
                failed.push(FailedAttempt {
                    target: target.id().to_string(),
                    stage: "execute".to_string(),
                    error: e.to_string(),
                });
                Ok(None)
            }
        }
    }

    fn compile(&self, circuit: &Circuit, target: &Target) -> CompileResult<CompiledProgram> {
        match &self.cache {
            Some(cache) => cache.get_or_compile(circuit, target),
            None => compile(circuit, target),
        }
    }
}

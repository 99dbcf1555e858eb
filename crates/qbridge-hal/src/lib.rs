//! qbridge Hardware Abstraction Layer
//!
//! This crate holds everything between a resolved token and a measurement
//! histogram, except compilation and the concrete engines:
//!
//! - [`CredentialResolver`]: ordered credential sources with sentinel rejection
//! - [`connect`] / [`list_backends`]: the Backend Directory Client over a
//!   [`Transport`], producing a read-only [`Session`]
//! - [`Target`]: a remote [`BackendDescriptor`] or a [`LocalSimulatorProfile`]
//! - [`Executor`]: the execute contract, with [`RemoteExecutor`] for
//!   session backends
//! - [`ExecutionResult`] and [`Counts`]
//!
//! # Degraded states are values
//!
//! | Situation | Representation |
//! |-----------|----------------|
//! | No token found | `Credential` with [`Provenance::None`] |
//! | Provider lists nothing | empty `list_backends` slice |
//! | Token present but provider down | [`ConnectError::Unreachable`] |
//! | Remote job too slow | [`ExecError::Timeout`] |
//!
//! # Example: Remote Execution
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use qbridge_hal::{CancelToken, CompiledProgram, CredentialResolver, Executor, RemoteExecutor, Target, connect};
//!
//! let credential = CredentialResolver::standard("IBM_QUANTUM_TOKEN", ".env", "IBM_QUANTUM_TOKEN").resolve();
//! let session = connect(&credential, transport, Duration::from_secs(10), &CancelToken::new()).await?;
//! let backend = session.backends().first().cloned().unwrap();
//! let program = qbridge_compile::compile(&circuit, &Target::Remote(backend))?;
//! let result = RemoteExecutor::new()
//!     .execute(&program, 1000, Duration::from_secs(30), &CancelToken::new())
//!     .await?;
//! ```

pub mod backend;
pub mod cancel;
pub mod credential;
pub mod error;
pub mod executor;
#[cfg(any(test, feature = "test-util"))]
pub mod fake;
pub mod job;
pub mod program;
pub mod remote;
pub mod result;
pub mod session;
pub mod target;
pub mod transport;

pub use backend::{BackendDescriptor, BackendStatus};
pub use cancel::CancelToken;
pub use credential::{
    ConfigFileSource, Credential, CredentialResolver, CredentialSource, EnvSource, Provenance,
    Resolution, SourceAttempt, SourceOutcome, StaticSource,
};
pub use error::{
    ConnectError, ConnectResult, ExecError, ExecResult, TransportError, TransportResult,
};
pub use executor::{Executor, check_request};
pub use job::{JobId, JobStatus};
pub use program::CompiledProgram;
pub use remote::RemoteExecutor;
pub use result::{Counts, ExecutionResult};
pub use session::{Session, connect, list_backends};
pub use target::{
    BasisGates, LocalSimulatorProfile, MAX_SIMULATED_QUBITS, Target, TargetId, TargetKind,
};
pub use transport::{Handshake, RemoteBackendInfo, Transport};

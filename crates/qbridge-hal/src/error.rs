//! Error types for the HAL crate.
//!
//! Missing credentials and empty backend listings are not errors; they are
//! ordinary values ([`Provenance::None`](crate::Provenance::None), an empty
//! slice) that the orchestrator turns into local execution. The enums here
//! cover genuine failures only.

use thiserror::Error;

/// Errors returned by [`connect`](crate::connect).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConnectError {
    /// The credential has provenance `none`; no network call was made.
    #[error("No credential available; remote provider not contacted")]
    NoCredential,

    /// The handshake failed at the transport or authentication level.
    #[error("Remote provider unreachable: {0}")]
    Unreachable(String),

    /// The caller cancelled the handshake.
    #[error("Connection cancelled")]
    Cancelled,

    /// The handshake did not finish within the connect timeout.
    #[error("Connection timed out after {timeout_ms} ms")]
    Timeout {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },
}

/// Errors returned by an [`Executor`](crate::Executor).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ExecError {
    /// The remote job did not complete within the requested timeout.
    #[error("Execution timed out after {timeout_ms} ms")]
    Timeout {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// The target backend is not online.
    #[error("Backend '{0}' is not online")]
    BackendOffline(String),

    /// Talking to the provider failed.
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// The caller cancelled execution.
    #[error("Execution cancelled")]
    Cancelled,

    /// The provider reported a terminal job failure.
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// Shots or timeout were zero.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The program was compiled for a different target than this executor serves.
    #[error("Program compiled for '{program}' cannot run on '{executor}'")]
    TargetMismatch {
        /// Target the program names.
        program: String,
        /// Executor that received it.
        executor: String,
    },

    /// Returned counts do not add up to the requested shots.
    #[error("Result has {got} shots, expected {expected}")]
    ResultMismatch {
        /// Requested shots.
        expected: u64,
        /// Sum of returned counts.
        got: u64,
    },

    /// The local engine rejected the program.
    #[error("Simulation error: {0}")]
    Simulation(String),
}

impl ExecError {
    /// Whether the orchestrator should recompile for the local simulator
    /// after this error.
    pub fn allows_fallback(&self) -> bool {
        !matches!(self, ExecError::Cancelled | ExecError::InvalidRequest(_))
    }
}

/// Errors raised by a [`Transport`](crate::Transport) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The provider rejected the token.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Connection-level failure (DNS, TLS, reset, client timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered with an error status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP-style status code.
        status: u16,
        /// Provider message.
        message: String,
    },

    /// A referenced backend or job does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The response could not be decoded.
    #[error("Malformed response: {0}")]
    Decode(String),
}

/// Result type for connection operations.
pub type ConnectResult<T> = Result<T, ConnectError>;

/// Result type for execution operations.
pub type ExecResult<T> = Result<T, ExecError>;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

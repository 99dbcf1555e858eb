//! The shared execute-shaped contract of remote and local engines.

use std::time::Duration;

use async_trait::async_trait;

use crate::cancel::CancelToken;
use crate::error::{ExecError, ExecResult};
use crate::program::CompiledProgram;
use crate::result::ExecutionResult;

/// Runs compiled programs on one kind of target.
///
/// Implementations never swap targets on their own: a program compiled for
/// a remote backend either runs there or fails, and the caller decides
/// whether to recompile for the local simulator.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Executor name used in logs and mismatch errors.
    fn name(&self) -> &str;

    /// Run `program` for `shots` shots, giving up after `timeout`.
    ///
    /// On success the returned counts sum to exactly `shots`.
    async fn execute(
        &self,
        program: &CompiledProgram,
        shots: u32,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> ExecResult<ExecutionResult>;
}

/// Reject zero shots and zero timeouts.
pub fn check_request(shots: u32, timeout: Duration) -> ExecResult<()> {
    if shots == 0 {
        return Err(ExecError::InvalidRequest("shots must be positive".into()));
    }
    if timeout.is_zero() {
        return Err(ExecError::InvalidRequest("timeout must be positive".into()));
    }
    Ok(())
}

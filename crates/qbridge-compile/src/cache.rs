//! Opt-in compilation cache.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use rustc_hash::FxHashMap;
use tracing::trace;

use qbridge_hal::{BasisGates, CompiledProgram, Target, TargetId};
use qbridge_ir::Circuit;

use crate::compiler::compile;
use crate::error::CompileResult;

/// Key: the circuit plus everything about the target that compilation reads.
type CacheKey = (Circuit, TargetId, u32, BasisGates);

/// Memoizes [`compile`] by (circuit, target identity).
///
/// Only successful compilations are stored. Safe to share between
/// concurrent requests.
#[derive(Default)]
pub struct CompileCache {
    entries: Mutex<FxHashMap<CacheKey, CompiledProgram>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CompileCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached program or compile and store it.
    pub fn get_or_compile(&self, circuit: &Circuit, target: &Target) -> CompileResult<CompiledProgram> {
        let key = (
            circuit.clone(),
            target.id(),
            target.num_qubits(),
            target.basis().clone(),
        );

        if let Some(program) = self.lock().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(target_id = %key.1, "compile cache hit");
            return Ok(program.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let program = compile(circuit, target)?;
        self.lock().insert(key, program.clone());
        Ok(program)
    }

    /// Number of cached programs.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(hits, misses)` so far.
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FxHashMap<CacheKey, CompiledProgram>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

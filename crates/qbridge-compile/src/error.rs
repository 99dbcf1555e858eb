//! Error types for the compiler.

use qbridge_ir::IrError;
use thiserror::Error;

/// Errors that can occur during compilation.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// The circuit needs more qubits than the target has.
    #[error("Circuit needs {required} qubits but '{target}' has {available}")]
    InsufficientQubits {
        /// Qubits the circuit uses.
        required: u32,
        /// Target capacity.
        available: u32,
        /// Target name.
        target: String,
    },

    /// A gate cannot be expressed in the target's native gate set.
    #[error("Gate '{gate}' is not expressible in the native gates of '{target}'")]
    UnsupportedGate {
        /// Gate name.
        gate: String,
        /// Target name.
        target: String,
    },

    /// The circuit violates its own structural invariants.
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(#[from] IrError),
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;

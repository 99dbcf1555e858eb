//! Error types for the IR crate.

use crate::qubit::{ClbitId, QubitId};
use thiserror::Error;

/// Errors that can occur while building a circuit.
///
/// All of these are violations of the circuit's structural invariants;
/// a [`Circuit`](crate::Circuit) that was built without error always has
/// every operand index in range.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit index is not below the circuit's qubit count.
    #[error("Qubit {qubit} out of range for {num_qubits}-qubit circuit (gate: {gate_name})")]
    QubitOutOfRange {
        /// The offending qubit.
        qubit: QubitId,
        /// Number of qubits in the circuit.
        num_qubits: u32,
        /// Gate the qubit was passed to.
        gate_name: String,
    },

    /// Classical bit index is not below the circuit's classical bit count.
    #[error("Classical bit {clbit} out of range for {num_clbits}-bit register")]
    ClbitOutOfRange {
        /// The offending classical bit.
        clbit: ClbitId,
        /// Number of classical bits in the circuit.
        num_clbits: u32,
    },

    /// Gate requires different number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// Duplicate qubit in operation.
    #[error("Duplicate qubit {qubit} in operation (gate: {gate_name})")]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Gate the qubit was passed to.
        gate_name: String,
    },

    /// Rotation angle is NaN or infinite.
    #[error("Gate '{gate_name}' has non-finite angle {value}")]
    NonFiniteParameter {
        /// Name of the gate.
        gate_name: String,
        /// The rejected value.
        value: f64,
    },

    /// Measurement operand lists differ in length.
    #[error("measure: qubit count ({qubits}) does not match clbit count ({clbits})")]
    MeasureArity {
        /// Number of qubits given.
        qubits: usize,
        /// Number of classical bits given.
        clbits: usize,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;

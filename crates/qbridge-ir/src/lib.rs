//! qbridge Circuit Description
//!
//! This crate provides the data structures for describing the quantum
//! programs that qbridge compiles and executes: qubit and classical bit
//! identifiers, the fixed gate set, instructions, and the [`Circuit`] builder.
//!
//! A circuit is an ordered list of instructions over a fixed qubit count.
//! Operand indices are checked as instructions are added, so a circuit that
//! was built without error is always well-formed.
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use qbridge_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell_state", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit, Circuit::bell().unwrap().renamed("bell_state"));
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `I` | 1 | Identity |
//! | `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `H` | 1 | Hadamard gate |
//! | `S`, `Sdg`, `T`, `Tdg` | 1 | Phase family |
//! | `SX`, `SXdg` | 1 | sqrt(X) and its inverse |
//! | `Rx`, `Ry`, `Rz`, `P` | 1 | Rotation and phase gates |
//! | `CX`, `CZ` | 2 | Controlled-NOT and Controlled-Z |
//! | `Swap` | 2 | SWAP gate |
//! | `ECR` | 2 | Echoed cross-resonance (IBM Eagle native) |
//! | `CCX` | 3 | Toffoli (CCNOT) gate |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use instruction::{Instruction, InstructionKind};
pub use qubit::{ClbitId, QubitId};

//! qbridge Circuit Compiler
//!
//! Rewrites a [`Circuit`](qbridge_ir::Circuit) into the native gate set of a
//! [`Target`](qbridge_hal::Target), producing a
//! [`CompiledProgram`](qbridge_hal::CompiledProgram) bound to that target.
//!
//! # Pipeline
//!
//! ```text
//! Circuit ──→ validate ──→ capacity check ──→ rule lowering ──→ CompiledProgram
//!                 │               │                  │
//!          InvalidCircuit  InsufficientQubits   UnsupportedGate
//! ```
//!
//! # Supported Bases
//!
//! | Basis | Gates | Source |
//! |-------|-------|--------|
//! | Universal | every IR gate | local simulator |
//! | IBM | `id, rz, sx, x, cx` | [`BasisGates::ibm`](qbridge_hal::BasisGates::ibm) |
//! | IBM Heron | `id, rz, sx, x, cz` | [`BasisGates::heron`](qbridge_hal::BasisGates::heron) |
//! | Provider list | as reported | backend configuration |
//!
//! # Example
//!
//! ```rust
//! use qbridge_compile::compile;
//! use qbridge_hal::{BasisGates, LocalSimulatorProfile, Target};
//! use qbridge_ir::Circuit;
//!
//! let circuit = Circuit::bell().unwrap();
//! let target = Target::Local(LocalSimulatorProfile::default().with_basis(BasisGates::heron()));
//! let program = compile(&circuit, &target).unwrap();
//! assert!(program.circuit().gate_names().contains(&"cz"));
//! ```

pub mod cache;
pub mod compiler;
pub mod decompose;
pub mod error;

pub use cache::CompileCache;
pub use compiler::{compile, is_native};
pub use error::{CompileError, CompileResult};

//! OpenQASM 3 output for qbridge circuits.
//!
//! Compiled programs travel to remote providers as OpenQASM 3 text, and the
//! `compile` command prints the same text for inspection.
//!
//! ```rust
//! use qbridge_ir::Circuit;
//!
//! let qasm = qbridge_qasm3::emit(&Circuit::bell().unwrap());
//! assert!(qasm.contains("cx q[0], q[1];"));
//! ```

pub mod emitter;

pub use emitter::emit;

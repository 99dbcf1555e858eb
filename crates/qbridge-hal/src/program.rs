//! Compiled programs bound to one target.

use qbridge_ir::Circuit;

use crate::target::{Target, TargetId};

/// A circuit rewritten into a target's native gate set.
///
/// A program is only valid for the target it names; executors reject
/// programs compiled for anything else.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProgram {
    circuit: Circuit,
    target: Target,
}

impl CompiledProgram {
    /// Bind a native circuit to its target. Produced by the compiler.
    pub fn new(circuit: Circuit, target: Target) -> Self {
        Self { circuit, target }
    }

    /// The native circuit.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// The target compiled for.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Identity of the target compiled for.
    pub fn target_id(&self) -> TargetId {
        self.target.id()
    }
}

//! Quantum gate types.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Standard gates with known semantics.
///
/// Rotation angles are concrete radians. The circuit builder rejects
/// non-finite angles, which is what makes the manual `Eq`/`Hash` impls
/// below sound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    // Single-qubit Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Single-qubit Clifford gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,

    // Single-qubit rotation gates
    /// Rotation around X axis.
    Rx(f64),
    /// Rotation around Y axis.
    Ry(f64),
    /// Rotation around Z axis.
    Rz(f64),
    /// Phase gate.
    P(f64),

    // Two-qubit gates
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Z gate.
    CZ,
    /// SWAP gate.
    Swap,
    /// Echoed cross-resonance gate (native on IBM Eagle).
    ECR,

    // Three-qubit gates
    /// Toffoli gate (CCX).
    CCX,
}

impl StandardGate {
    /// Get the OpenQASM 3 name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::SXdg => "sxdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::P(_) => "p",
            StandardGate::CX => "cx",
            StandardGate::CZ => "cz",
            StandardGate::Swap => "swap",
            StandardGate::ECR => "ecr",
            StandardGate::CCX => "ccx",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::CX | StandardGate::CZ | StandardGate::Swap | StandardGate::ECR => 2,
            StandardGate::CCX => 3,
            _ => 1,
        }
    }

    /// The rotation angle, for parameterized gates.
    #[inline]
    pub fn param(&self) -> Option<f64> {
        match self {
            StandardGate::Rx(theta)
            | StandardGate::Ry(theta)
            | StandardGate::Rz(theta)
            | StandardGate::P(theta) => Some(*theta),
            _ => None,
        }
    }

    /// Check if this gate carries a rotation angle.
    pub fn is_parameterized(&self) -> bool {
        self.param().is_some()
    }
}

impl Eq for StandardGate {}

impl Hash for StandardGate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
        if let Some(theta) = self.param() {
            // -0.0 and 0.0 compare equal, so they must hash equal.
            let normalized = if theta == 0.0 { 0.0_f64 } else { theta };
            normalized.to_bits().hash(state);
        }
    }
}

//! High-level circuit builder API.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClbitId, QubitId};

/// A quantum circuit: an ordered list of instructions over a fixed number
/// of qubits, with a classical register for measurement results.
///
/// Every instruction added through the builder is checked against the
/// circuit's size, so the operand indices of a built circuit are always in
/// range. Circuits obtained any other way (e.g. deserialized) can be
/// re-checked with [`Circuit::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Number of qubits.
    num_qubits: u32,
    /// Number of classical bits.
    num_clbits: u32,
    /// Instructions in program order.
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create an empty circuit with a given number of qubits and classical bits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            num_clbits,
            instructions: vec![],
        }
    }

    /// Name of the circuit.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the same circuit under a different name.
    #[must_use]
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits as usize
    }

    /// Number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.num_clbits as usize
    }

    /// Instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of gate operations (measurements and barriers excluded).
    pub fn num_gates(&self) -> usize {
        self.instructions
            .iter()
            .filter(|inst| inst.as_gate().is_some())
            .count()
    }

    /// Distinct gate names used, in first-use order.
    pub fn gate_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        for gate in self.instructions.iter().filter_map(Instruction::as_gate) {
            if !names.contains(&gate.name()) {
                names.push(gate.name());
            }
        }
        names
    }

    /// `(qubit, clbit)` pairs written by measurement instructions.
    pub fn measurements(&self) -> impl Iterator<Item = (QubitId, ClbitId)> + '_ {
        self.instructions
            .iter()
            .filter(|inst| inst.is_measure())
            .flat_map(|inst| inst.qubits.iter().copied().zip(inst.clbits.iter().copied()))
    }

    /// Check whether the circuit measures anything.
    pub fn has_measurements(&self) -> bool {
        self.instructions.iter().any(Instruction::is_measure)
    }

    /// Circuit depth: the longest chain of instructions sharing a qubit.
    pub fn depth(&self) -> usize {
        let mut layer = vec![0usize; self.num_qubits()];
        let mut depth = 0;
        for inst in &self.instructions {
            if matches!(inst.kind, InstructionKind::Barrier) {
                continue;
            }
            let level = inst
                .qubits
                .iter()
                .filter_map(|q| layer.get(q.index()))
                .max()
                .copied()
                .unwrap_or(0)
                + 1;
            for q in &inst.qubits {
                if let Some(slot) = layer.get_mut(q.index()) {
                    *slot = level;
                }
            }
            depth = depth.max(level);
        }
        depth
    }

    /// Append an instruction after checking it against the circuit's size.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        self.check(&instruction)?;
        self.instructions.push(instruction);
        Ok(self)
    }

    /// Re-check every instruction against the circuit's size.
    pub fn validate(&self) -> IrResult<()> {
        self.instructions.iter().try_for_each(|inst| self.check(inst))
    }

    fn check(&self, instruction: &Instruction) -> IrResult<()> {
        let name = instruction.name();

        for (i, &qubit) in instruction.qubits.iter().enumerate() {
            if qubit.0 >= self.num_qubits {
                return Err(IrError::QubitOutOfRange {
                    qubit,
                    num_qubits: self.num_qubits,
                    gate_name: name.to_string(),
                });
            }
            if instruction.qubits[..i].contains(&qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: name.to_string(),
                });
            }
        }

        match &instruction.kind {
            InstructionKind::Gate(gate) => {
                let got = instruction.qubits.len() as u32;
                if got != gate.num_qubits() {
                    return Err(IrError::QubitCountMismatch {
                        gate_name: name.to_string(),
                        expected: gate.num_qubits(),
                        got,
                    });
                }
                if let Some(value) = gate.param() {
                    if !value.is_finite() {
                        return Err(IrError::NonFiniteParameter {
                            gate_name: name.to_string(),
                            value,
                        });
                    }
                }
            }
            InstructionKind::Measure => {
                if instruction.qubits.len() != instruction.clbits.len() {
                    return Err(IrError::MeasureArity {
                        qubits: instruction.qubits.len(),
                        clbits: instruction.clbits.len(),
                    });
                }
                for &clbit in &instruction.clbits {
                    if clbit.0 >= self.num_clbits {
                        return Err(IrError::ClbitOutOfRange {
                            clbit,
                            num_clbits: self.num_clbits,
                        });
                    }
                }
            }
            InstructionKind::Barrier => {}
        }

        Ok(())
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::H, qubit))
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::X, qubit))
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Y, qubit))
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Z, qubit))
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::S, qubit))
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::T, qubit))
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::SX, qubit))
    }

    /// Apply Rx rotation.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Rx(theta), qubit))
    }

    /// Apply Ry rotation.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Ry(theta), qubit))
    }

    /// Apply Rz rotation.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Rz(theta), qubit))
    }

    /// Apply phase gate.
    pub fn p(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::P(theta), qubit))
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CX, control, target))
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CZ, control, target))
    }

    /// Apply echoed cross-resonance gate.
    pub fn ecr(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::ECR, q1, q2))
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::Swap, q1, q2))
    }

    /// Apply Toffoli gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::gate(StandardGate::CCX, [c1, c2, target]))
    }

    // =========================================================================
    // Non-unitary operations
    // =========================================================================

    /// Measure a qubit into a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.apply(Instruction::measure(qubit, clbit))
    }

    /// Measure qubit `i` into classical bit `i` for every qubit.
    ///
    /// Fails if the classical register is smaller than the qubit count.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        for i in 0..self.num_qubits {
            self.measure(QubitId(i), ClbitId(i))?;
        }
        Ok(self)
    }

    /// Insert a barrier across the given qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.apply(Instruction::barrier(qubits))
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// Create a Bell state circuit: H on qubit 0, CNOT 0→1, measure both.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::with_size("bell", 2, 2);
        circuit
            .h(QubitId(0))?
            .cx(QubitId(0), QubitId(1))?
            .measure(QubitId(0), ClbitId(0))?
            .measure(QubitId(1), ClbitId(1))?;
        Ok(circuit)
    }

    /// Create an `n`-qubit GHZ state circuit with full measurement.
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_size(format!("ghz_{n}"), n, n);
        if n == 0 {
            return Ok(circuit);
        }

        circuit.h(QubitId(0))?;
        for i in 0..n - 1 {
            circuit.cx(QubitId(i), QubitId(i + 1))?;
        }
        circuit.measure_all()?;

        Ok(circuit)
    }
}

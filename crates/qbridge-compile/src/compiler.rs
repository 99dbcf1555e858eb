//! Compilation of circuits to target programs.

use tracing::{debug, instrument};

use qbridge_hal::{CompiledProgram, Target};
use qbridge_ir::{Circuit, InstructionKind};

use crate::decompose::Decomposer;
use crate::error::{CompileError, CompileResult};

/// Compile `circuit` for `target`.
///
/// Checks, in order: circuit well-formedness, qubit capacity, then that
/// every gate lowers to the target's native set. Measurements and barriers
/// are carried over unchanged. The result depends only on the circuit and
/// the target, so it can be cached by that pair.
#[instrument(skip_all, fields(circuit = %circuit.name(), target_name = %target.name()))]
pub fn compile(circuit: &Circuit, target: &Target) -> CompileResult<CompiledProgram> {
    circuit.validate()?;

    let required = circuit.num_qubits() as u32;
    let available = target.num_qubits();
    if required > available {
        return Err(CompileError::InsufficientQubits {
            required,
            available,
            target: target.name().to_string(),
        });
    }

    let basis = target.basis();
    if basis.is_universal() {
        debug!("universal basis, no rewriting");
        return Ok(CompiledProgram::new(circuit.clone(), target.clone()));
    }

    let mut decomposer = Decomposer::new(basis);
    let mut native = Circuit::with_size(
        circuit.name(),
        required,
        circuit.num_clbits() as u32,
    );

    for inst in circuit.instructions() {
        match &inst.kind {
            InstructionKind::Gate(gate) => {
                let lowered = decomposer.lower(gate, &inst.qubits).ok_or_else(|| {
                    CompileError::UnsupportedGate {
                        gate: gate.name().to_string(),
                        target: target.name().to_string(),
                    }
                })?;
                for native_inst in lowered {
                    native.apply(native_inst)?;
                }
            }
            InstructionKind::Measure | InstructionKind::Barrier => {
                native.apply(inst.clone())?;
            }
        }
    }

    debug!(
        gates_in = circuit.num_gates(),
        gates_out = native.num_gates(),
        "lowered to native gates"
    );
    Ok(CompiledProgram::new(native, target.clone()))
}

/// Check whether every gate of `circuit` is native to `target`.
pub fn is_native(circuit: &Circuit, target: &Target) -> bool {
    let basis = target.basis();
    circuit
        .instructions()
        .iter()
        .filter_map(|inst| inst.as_gate())
        .all(|gate| basis.contains(gate.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbridge_hal::{BasisGates, LocalSimulatorProfile};
    use qbridge_ir::{ClbitId, QubitId};

    fn profile(max_qubits: u32, basis: BasisGates) -> Target {
        Target::Local(
            LocalSimulatorProfile::default()
                .with_max_qubits(max_qubits)
                .with_basis(basis),
        )
    }

    #[test]
    fn test_universal_target_keeps_circuit() {
        let circuit = Circuit::bell().unwrap();
        let program = compile(&circuit, &Target::local()).unwrap();
        assert_eq!(program.circuit(), &circuit);
        assert!(program.target().is_local());
    }

    #[test]
    fn test_insufficient_qubits() {
        let circuit = Circuit::ghz(5).unwrap();
        let err = compile(&circuit, &profile(4, BasisGates::universal())).unwrap_err();
        assert_eq!(
            err,
            CompileError::InsufficientQubits {
                required: 5,
                available: 4,
                target: "local_simulator".into(),
            }
        );
    }

    #[test]
    fn test_capacity_checked_before_gates() {
        // Both checks fail; capacity is reported.
        let circuit = Circuit::ghz(3).unwrap();
        let err = compile(&circuit, &profile(2, BasisGates::from_names(["rz"]))).unwrap_err();
        assert!(matches!(err, CompileError::InsufficientQubits { .. }));
    }

    #[test]
    fn test_unsupported_gate() {
        let circuit = Circuit::bell().unwrap();
        let err = compile(&circuit, &profile(5, BasisGates::from_names(["rz", "sx", "x"]))).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnsupportedGate {
                gate: "cx".into(),
                target: "local_simulator".into(),
            }
        );
    }

    #[test]
    fn test_ibm_lowering_is_native() {
        let target = profile(5, BasisGates::ibm());
        let program = compile(&Circuit::bell().unwrap(), &target).unwrap();

        assert!(is_native(program.circuit(), &target));
        // H → rz, sx, rz; CX native
        assert_eq!(program.circuit().num_gates(), 4);
        assert_eq!(program.circuit().measurements().count(), 2);
    }

    #[test]
    fn test_eagle_lowering_is_native() {
        let target = profile(5, BasisGates::eagle());
        let program = compile(&Circuit::bell().unwrap(), &target).unwrap();

        assert!(is_native(program.circuit(), &target));
        let names: Vec<_> = program.circuit().instructions().iter().map(|i| i.name()).collect();
        assert_eq!(
            names,
            vec!["rz", "sx", "rz", "x", "sx", "ecr", "rz", "measure", "measure"]
        );
    }

    #[test]
    fn test_heron_lowering_is_native() {
        let target = profile(5, BasisGates::heron());
        let mut circuit = Circuit::with_size("mix", 3, 3);
        circuit
            .ccx(QubitId(0), QubitId(1), QubitId(2))
            .unwrap()
            .swap(QubitId(0), QubitId(2))
            .unwrap()
            .ry(0.3, QubitId(1))
            .unwrap()
            .measure(QubitId(1), ClbitId(0))
            .unwrap();

        let program = compile(&circuit, &target).unwrap();
        assert!(is_native(program.circuit(), &target));
        assert!(!is_native(&circuit, &target));
        assert!(program.circuit().has_measurements());
    }

    #[test]
    fn test_measurements_and_barriers_preserved_in_order() {
        let mut circuit = Circuit::with_size("order", 1, 1);
        circuit
            .h(QubitId(0))
            .unwrap()
            .barrier([QubitId(0)])
            .unwrap()
            .measure(QubitId(0), ClbitId(0))
            .unwrap();

        let program = compile(&circuit, &profile(1, BasisGates::ibm())).unwrap();
        let names: Vec<_> = program.circuit().instructions().iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["rz", "sx", "rz", "barrier", "measure"]);
    }
}

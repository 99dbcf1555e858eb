//! QASM3 emitter for serializing circuits.

use std::f64::consts::PI;

use qbridge_ir::{Circuit, ClbitId, Instruction, InstructionKind, QubitId};

/// Tolerance for recognizing multiples of pi.
const PI_EPSILON: f64 = 1e-10;

/// Emit a circuit as QASM3 source code.
///
/// The output declares one qubit register `q` and one bit register `c`
/// and pulls gate definitions from `stdgates.inc`.
pub fn emit(circuit: &Circuit) -> String {
    let mut emitter = Emitter::default();
    emitter.emit_circuit(circuit);
    emitter.output
}

#[derive(Default)]
struct Emitter {
    output: String,
}

impl Emitter {
    fn emit_circuit(&mut self, circuit: &Circuit) {
        self.writeln("OPENQASM 3.0;");
        self.writeln("include \"stdgates.inc\";");
        self.writeln("");

        let num_qubits = circuit.num_qubits();
        if num_qubits > 0 {
            self.writeln(&format!("qubit[{num_qubits}] q;"));
        }
        let num_clbits = circuit.num_clbits();
        if num_clbits > 0 {
            self.writeln(&format!("bit[{num_clbits}] c;"));
        }
        if num_qubits > 0 || num_clbits > 0 {
            self.writeln("");
        }

        for instruction in circuit.instructions() {
            self.emit_instruction(instruction);
        }
    }

    fn emit_instruction(&mut self, instruction: &Instruction) {
        match &instruction.kind {
            InstructionKind::Gate(gate) => {
                let qubits = qubit_list(&instruction.qubits);
                match gate.param() {
                    Some(theta) => {
                        self.writeln(&format!("{}({}) {qubits};", gate.name(), format_angle(theta)));
                    }
                    None => self.writeln(&format!("{} {qubits};", gate.name())),
                }
            }

            InstructionKind::Measure => {
                for (q, c) in instruction.qubits.iter().zip(&instruction.clbits) {
                    self.writeln(&format!("{} = measure {};", clbit(*c), qubit(*q)));
                }
            }

            InstructionKind::Barrier => {
                if instruction.qubits.is_empty() {
                    self.writeln("barrier;");
                } else {
                    self.writeln(&format!("barrier {};", qubit_list(&instruction.qubits)));
                }
            }
        }
    }

    fn writeln(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }
}

fn qubit(q: QubitId) -> String {
    format!("q[{}]", q.0)
}

fn clbit(c: ClbitId) -> String {
    format!("c[{}]", c.0)
}

fn qubit_list(qubits: &[QubitId]) -> String {
    qubits.iter().map(|q| qubit(*q)).collect::<Vec<_>>().join(", ")
}

/// Render an angle, using `pi` fractions where exact enough.
///
/// Other values are printed with Rust's shortest round-trip formatting so
/// no precision is lost on the wire.
fn format_angle(v: f64) -> String {
    const FRACTIONS: [(f64, &str); 5] = [
        (1.0, "pi"),
        (0.5, "pi/2"),
        (0.25, "pi/4"),
        (-0.5, "-pi/2"),
        (-0.25, "-pi/4"),
    ];
    for (factor, text) in FRACTIONS {
        if (v - factor * PI).abs() < PI_EPSILON {
            return text.to_string();
        }
    }
    if (v + PI).abs() < PI_EPSILON {
        return "-pi".to_string();
    }
    v.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_bell_state() {
        let circuit = Circuit::bell().unwrap();
        let qasm = emit(&circuit);

        assert!(qasm.starts_with("OPENQASM 3.0;\ninclude \"stdgates.inc\";\n"));
        assert!(qasm.contains("qubit[2] q;"));
        assert!(qasm.contains("bit[2] c;"));
        assert!(qasm.contains("h q[0];"));
        assert!(qasm.contains("cx q[0], q[1];"));
        assert!(qasm.contains("c[0] = measure q[0];"));
        assert!(qasm.contains("c[1] = measure q[1];"));
    }

    #[test]
    fn test_emit_parameterized() {
        let mut circuit = Circuit::with_size("test", 1, 0);
        circuit
            .rx(PI / 2.0, QubitId(0))
            .unwrap()
            .rz(-PI, QubitId(0))
            .unwrap()
            .ry(0.125, QubitId(0))
            .unwrap();

        let qasm = emit(&circuit);
        assert!(qasm.contains("rx(pi/2) q[0];"));
        assert!(qasm.contains("rz(-pi) q[0];"));
        assert!(qasm.contains("ry(0.125) q[0];"));
        assert!(!qasm.lines().any(|line| line.starts_with("bit[")));
    }

    #[test]
    fn test_arbitrary_angle_round_trips() {
        let theta = 0.123_456_789_012_345_f64;
        let text = format_angle(theta);
        assert_eq!(text.parse::<f64>().unwrap(), theta);
    }

    #[test]
    fn test_emit_barrier_and_crossed_measure() {
        let mut circuit = Circuit::with_size("test", 2, 2);
        circuit
            .barrier([QubitId(0), QubitId(1)])
            .unwrap()
            .measure(QubitId(1), ClbitId(0))
            .unwrap();

        let qasm = emit(&circuit);
        assert!(qasm.contains("barrier q[0], q[1];"));
        assert!(qasm.contains("c[0] = measure q[1];"));
    }

    #[test]
    fn test_emit_gate_names() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        circuit
            .sx(QubitId(0))
            .unwrap()
            .ccx(QubitId(0), QubitId(1), QubitId(2))
            .unwrap()
            .p(PI / 4.0, QubitId(2))
            .unwrap()
            .ecr(QubitId(1), QubitId(0))
            .unwrap();

        let qasm = emit(&circuit);
        assert!(qasm.contains("sx q[0];"));
        assert!(qasm.contains("ccx q[0], q[1], q[2];"));
        assert!(qasm.contains("p(pi/4) q[2];"));
        assert!(qasm.contains("ecr q[1], q[0];"));
    }
}

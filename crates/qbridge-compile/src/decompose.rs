//! Gate decomposition rules.
//!
//! Each non-native gate is rewritten by a rule alternative whose parts can
//! themselves be lowered to the basis. The shallowest expansion wins, ties go
//! to the earlier alternative, and expansion depth is bounded, so lowering
//! terminates and the same gate always produces the same sequence for a
//! given basis.
//!
//! Equivalences hold up to global phase.

use std::f64::consts::PI;

use rustc_hash::FxHashMap;

use qbridge_hal::BasisGates;
use qbridge_ir::{Instruction, QubitId, StandardGate};

/// Maximum nesting of rule expansions.
pub const MAX_DEPTH: u32 = 6;

/// A gate acting on operand slots of the gate being decomposed.
type Op = (StandardGate, Vec<usize>);

fn on(gate: StandardGate, slots: &[usize]) -> Op {
    (gate, slots.to_vec())
}

/// Rule alternatives for a gate, in preference order.
///
/// Slot `0` is the gate's first operand, `1` the second, and so on.
#[allow(clippy::too_many_lines)]
pub fn alternatives(gate: &StandardGate) -> Vec<Vec<Op>> {
    use StandardGate as G;

    match *gate {
        G::I => vec![vec![]],
        G::X => vec![
            vec![on(G::SX, &[0]), on(G::SX, &[0])],
            vec![on(G::Rx(PI), &[0])],
            vec![on(G::H, &[0]), on(G::Z, &[0]), on(G::H, &[0])],
        ],
        G::Y => vec![
            vec![on(G::Z, &[0]), on(G::X, &[0])],
            vec![on(G::Ry(PI), &[0])],
        ],
        G::Z => vec![
            vec![on(G::Rz(PI), &[0])],
            vec![on(G::P(PI), &[0])],
            vec![on(G::S, &[0]), on(G::S, &[0])],
        ],
        G::H => vec![
            vec![on(G::Rz(PI / 2.0), &[0]), on(G::SX, &[0]), on(G::Rz(PI / 2.0), &[0])],
            vec![on(G::Ry(PI / 2.0), &[0]), on(G::X, &[0])],
        ],
        G::S => vec![vec![on(G::Rz(PI / 2.0), &[0])], vec![on(G::P(PI / 2.0), &[0])]],
        G::Sdg => vec![vec![on(G::Rz(-PI / 2.0), &[0])], vec![on(G::P(-PI / 2.0), &[0])]],
        G::T => vec![vec![on(G::Rz(PI / 4.0), &[0])], vec![on(G::P(PI / 4.0), &[0])]],
        G::Tdg => vec![vec![on(G::Rz(-PI / 4.0), &[0])], vec![on(G::P(-PI / 4.0), &[0])]],
        G::SX => vec![
            vec![on(G::Rx(PI / 2.0), &[0])],
            vec![on(G::H, &[0]), on(G::S, &[0]), on(G::H, &[0])],
        ],
        G::SXdg => vec![
            vec![on(G::Rx(-PI / 2.0), &[0])],
            vec![on(G::H, &[0]), on(G::Sdg, &[0]), on(G::H, &[0])],
        ],
        G::Rx(theta) => vec![vec![on(G::H, &[0]), on(G::Rz(theta), &[0]), on(G::H, &[0])]],
        G::Ry(theta) => vec![vec![on(G::Sdg, &[0]), on(G::Rx(theta), &[0]), on(G::S, &[0])]],
        G::Rz(theta) => vec![
            vec![on(G::P(theta), &[0])],
            vec![on(G::H, &[0]), on(G::Rx(theta), &[0]), on(G::H, &[0])],
        ],
        G::P(theta) => vec![vec![on(G::Rz(theta), &[0])]],
        G::CX => vec![
            vec![on(G::H, &[1]), on(G::CZ, &[0, 1]), on(G::H, &[1])],
            vec![
                on(G::X, &[0]),
                on(G::SX, &[1]),
                on(G::ECR, &[0, 1]),
                on(G::Rz(PI / 2.0), &[0]),
            ],
        ],
        G::CZ => vec![vec![on(G::H, &[1]), on(G::CX, &[0, 1]), on(G::H, &[1])]],
        G::ECR => vec![vec![
            on(G::Rz(PI / 2.0), &[0]),
            on(G::SX, &[1]),
            on(G::CX, &[0, 1]),
            on(G::X, &[0]),
        ]],
        G::Swap => vec![vec![
            on(G::CX, &[0, 1]),
            on(G::CX, &[1, 0]),
            on(G::CX, &[0, 1]),
        ]],
        G::CCX => vec![vec![
            on(G::H, &[2]),
            on(G::CX, &[1, 2]),
            on(G::Tdg, &[2]),
            on(G::CX, &[0, 2]),
            on(G::T, &[2]),
            on(G::CX, &[1, 2]),
            on(G::Tdg, &[2]),
            on(G::CX, &[0, 2]),
            on(G::T, &[1]),
            on(G::T, &[2]),
            on(G::H, &[2]),
            on(G::CX, &[0, 1]),
            on(G::T, &[0]),
            on(G::Tdg, &[1]),
            on(G::CX, &[0, 1]),
        ]],
    }
}

/// Lowers gates to one basis, memoizing per (gate, remaining depth).
pub struct Decomposer<'a> {
    basis: &'a BasisGates,
    memo: FxHashMap<(StandardGate, u32), Option<Vec<Op>>>,
}

impl<'a> Decomposer<'a> {
    /// Create a decomposer for `basis`.
    pub fn new(basis: &'a BasisGates) -> Self {
        Self {
            basis,
            memo: FxHashMap::default(),
        }
    }

    /// Native instructions equivalent to `gate` on `qubits`, or `None` if
    /// no rule chain within [`MAX_DEPTH`] reaches the basis.
    pub fn lower(&mut self, gate: &StandardGate, qubits: &[QubitId]) -> Option<Vec<Instruction>> {
        let ops = self.shallowest(gate)?;
        Some(
            ops.into_iter()
                .map(|(g, slots)| Instruction::gate(g, slots.into_iter().map(|s| qubits[s])))
                .collect(),
        )
    }

    /// The expansion needing the fewest nested rule applications.
    fn shallowest(&mut self, gate: &StandardGate) -> Option<Vec<Op>> {
        (0..=MAX_DEPTH).find_map(|depth| self.lower_slots(gate, depth))
    }

    fn lower_slots(&mut self, gate: &StandardGate, depth: u32) -> Option<Vec<Op>> {
        if self.basis.contains(gate.name()) {
            let arity = gate.num_qubits() as usize;
            return Some(vec![(*gate, (0..arity).collect())]);
        }
        if depth == 0 {
            return None;
        }
        if let Some(cached) = self.memo.get(&(*gate, depth)) {
            return cached.clone();
        }

        let lowered = alternatives(gate).into_iter().find_map(|alternative| {
            let mut out = Vec::new();
            for (part, slots) in alternative {
                let inner = self.lower_slots(&part, depth - 1)?;
                out.extend(
                    inner
                        .into_iter()
                        .map(|(g, inner_slots)| (g, inner_slots.into_iter().map(|s| slots[s]).collect())),
                );
            }
            Some(out)
        });

        self.memo.insert((*gate, depth), lowered.clone());
        lowered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    const EPS: f64 = 1e-9;

    fn matrix_1q(gate: &StandardGate) -> [Complex64; 4] {
        let c = |re: f64, im: f64| Complex64::new(re, im);
        let s = std::f64::consts::FRAC_1_SQRT_2;
        match *gate {
            StandardGate::I => [c(1., 0.), c(0., 0.), c(0., 0.), c(1., 0.)],
            StandardGate::X => [c(0., 0.), c(1., 0.), c(1., 0.), c(0., 0.)],
            StandardGate::Y => [c(0., 0.), c(0., -1.), c(0., 1.), c(0., 0.)],
            StandardGate::Z => [c(1., 0.), c(0., 0.), c(0., 0.), c(-1., 0.)],
            StandardGate::H => [c(s, 0.), c(s, 0.), c(s, 0.), c(-s, 0.)],
            StandardGate::S => [c(1., 0.), c(0., 0.), c(0., 0.), c(0., 1.)],
            StandardGate::Sdg => [c(1., 0.), c(0., 0.), c(0., 0.), c(0., -1.)],
            StandardGate::T => [c(1., 0.), c(0., 0.), c(0., 0.), Complex64::from_polar(1., PI / 4.)],
            StandardGate::Tdg => [c(1., 0.), c(0., 0.), c(0., 0.), Complex64::from_polar(1., -PI / 4.)],
            StandardGate::SX => [c(0.5, 0.5), c(0.5, -0.5), c(0.5, -0.5), c(0.5, 0.5)],
            StandardGate::SXdg => [c(0.5, -0.5), c(0.5, 0.5), c(0.5, 0.5), c(0.5, -0.5)],
            StandardGate::Rx(t) => {
                let (sn, cs) = (t / 2.).sin_cos();
                [c(cs, 0.), c(0., -sn), c(0., -sn), c(cs, 0.)]
            }
            StandardGate::Ry(t) => {
                let (sn, cs) = (t / 2.).sin_cos();
                [c(cs, 0.), c(-sn, 0.), c(sn, 0.), c(cs, 0.)]
            }
            StandardGate::Rz(t) => [
                Complex64::from_polar(1., -t / 2.),
                c(0., 0.),
                c(0., 0.),
                Complex64::from_polar(1., t / 2.),
            ],
            StandardGate::P(t) => [c(1., 0.), c(0., 0.), c(0., 0.), Complex64::from_polar(1., t)],
            _ => unreachable!("multi-qubit gate"),
        }
    }

    /// Apply one gate to a state vector; qubit `q` is bit `q` of the index.
    fn apply(state: &mut [Complex64], gate: &StandardGate, qubits: &[usize]) {
        let bit = |i: usize, q: usize| (i >> q) & 1 == 1;
        match *gate {
            StandardGate::CX | StandardGate::CCX => {
                let (controls, target) = qubits.split_at(qubits.len() - 1);
                for i in 0..state.len() {
                    if controls.iter().all(|&c| bit(i, c)) && !bit(i, target[0]) {
                        state.swap(i, i | (1 << target[0]));
                    }
                }
            }
            StandardGate::ECR => {
                let s = std::f64::consts::FRAC_1_SQRT_2;
                let (h, ih) = (Complex64::new(s, 0.), Complex64::new(0., s));
                let (m0, m1) = (1 << qubits[0], 1 << qubits[1]);
                for i in 0..state.len() {
                    if i & (m0 | m1) == 0 {
                        let idx = [i, i | m0, i | m1, i | m0 | m1];
                        let [a, b, c, d] = idx.map(|k| state[k]);
                        state[idx[0]] = h * b + ih * d;
                        state[idx[1]] = h * a - ih * c;
                        state[idx[2]] = ih * b + h * d;
                        state[idx[3]] = -ih * a + h * c;
                    }
                }
            }
            StandardGate::CZ => {
                for (i, amp) in state.iter_mut().enumerate() {
                    if bit(i, qubits[0]) && bit(i, qubits[1]) {
                        *amp = -*amp;
                    }
                }
            }
            StandardGate::Swap => {
                for i in 0..state.len() {
                    if bit(i, qubits[0]) && !bit(i, qubits[1]) {
                        let j = (i & !(1 << qubits[0])) | (1 << qubits[1]);
                        state.swap(i, j);
                    }
                }
            }
            _ => {
                let m = matrix_1q(gate);
                let q = qubits[0];
                for i in 0..state.len() {
                    if !bit(i, q) {
                        let j = i | (1 << q);
                        let (a, b) = (state[i], state[j]);
                        state[i] = m[0] * a + m[1] * b;
                        state[j] = m[2] * a + m[3] * b;
                    }
                }
            }
        }
    }

    fn unitary(n: usize, ops: &[(StandardGate, Vec<usize>)]) -> Vec<Vec<Complex64>> {
        (0..1 << n)
            .map(|col| {
                let mut state = vec![Complex64::new(0., 0.); 1 << n];
                state[col] = Complex64::new(1., 0.);
                for (gate, qubits) in ops {
                    apply(&mut state, gate, qubits);
                }
                state
            })
            .collect()
    }

    fn equal_up_to_phase(a: &[Vec<Complex64>], b: &[Vec<Complex64>]) -> bool {
        let flat_a: Vec<_> = a.iter().flatten().collect();
        let flat_b: Vec<_> = b.iter().flatten().collect();
        let Some(k) = flat_a.iter().position(|z| z.norm() > EPS) else {
            return false;
        };
        let phase = flat_b[k] / flat_a[k];
        (phase.norm() - 1.0).abs() < EPS
            && flat_a
                .iter()
                .zip(&flat_b)
                .all(|(x, y)| (**y - phase * **x).norm() < EPS)
    }

    fn all_gates() -> Vec<StandardGate> {
        use StandardGate as G;
        vec![
            G::I, G::X, G::Y, G::Z, G::H, G::S, G::Sdg, G::T, G::Tdg, G::SX, G::SXdg,
            G::Rx(0.7), G::Ry(-1.3), G::Rz(2.1), G::P(0.4), G::CX, G::CZ, G::Swap, G::ECR,
            G::CCX,
        ]
    }

    #[test]
    fn test_every_alternative_is_equivalent() {
        for gate in all_gates() {
            let n = gate.num_qubits() as usize;
            let reference = unitary(n, &[(gate, (0..n).collect())]);
            for alternative in alternatives(&gate) {
                let got = unitary(n, &alternative);
                assert!(
                    equal_up_to_phase(&reference, &got),
                    "rule for {} is not equivalent: {:?}",
                    gate.name(),
                    alternative
                );
            }
        }
    }

    #[test]
    fn test_lowering_is_equivalent_for_hardware_bases() {
        for basis in [BasisGates::ibm(), BasisGates::heron(), BasisGates::eagle()] {
            let mut decomposer = Decomposer::new(&basis);
            for gate in all_gates() {
                let n = gate.num_qubits() as usize;
                let slots: Vec<usize> = (0..n).collect();
                let lowered = decomposer.shallowest(&gate).unwrap();

                assert!(lowered.iter().all(|(g, _)| basis.contains(g.name())));
                assert!(equal_up_to_phase(
                    &unitary(n, &[(gate, slots)]),
                    &unitary(n, &lowered)
                ));
            }
        }
    }

    #[test]
    fn test_native_gate_kept() {
        let basis = BasisGates::ibm();
        let mut decomposer = Decomposer::new(&basis);
        let out = decomposer.lower(&StandardGate::CX, &[QubitId(3), QubitId(1)]).unwrap();
        assert_eq!(out, vec![Instruction::two_qubit_gate(StandardGate::CX, QubitId(3), QubitId(1))]);
    }

    #[test]
    fn test_heron_cx_maps_operands() {
        let basis = BasisGates::heron();
        let mut decomposer = Decomposer::new(&basis);
        let out = decomposer.lower(&StandardGate::CX, &[QubitId(0), QubitId(1)]).unwrap();

        // H(t) = 3 gates, CZ, H(t) = 3 gates
        assert_eq!(out.len(), 7);
        assert_eq!(out[3].qubits, vec![QubitId(0), QubitId(1)]);
        assert!(out[..3].iter().all(|inst| inst.qubits == vec![QubitId(1)]));
    }

    #[test]
    fn test_eagle_cx_goes_through_ecr() {
        let basis = BasisGates::eagle();
        let mut decomposer = Decomposer::new(&basis);
        let out = decomposer.lower(&StandardGate::CX, &[QubitId(2), QubitId(0)]).unwrap();

        let names: Vec<_> = out.iter().map(Instruction::name).collect();
        assert_eq!(names, vec!["x", "sx", "ecr", "rz"]);
        assert_eq!(out[0].qubits, vec![QubitId(2)]);
        assert_eq!(out[1].qubits, vec![QubitId(0)]);
        assert_eq!(out[2].qubits, vec![QubitId(2), QubitId(0)]);
        assert_eq!(out[3].qubits, vec![QubitId(2)]);
    }

    #[test]
    fn test_shallowest_expansion_preferred() {
        // Heron reaches CX through CZ; the ECR route would need CX again.
        let basis = BasisGates::heron();
        let mut decomposer = Decomposer::new(&basis);
        let out = decomposer.lower(&StandardGate::CX, &[QubitId(0), QubitId(1)]).unwrap();
        assert!(out.iter().all(|inst| inst.name() != "ecr"));

        // With both entanglers native, CX is kept as is.
        let basis = BasisGates::from_names(["cx", "ecr", "rz", "sx", "x"]);
        let mut decomposer = Decomposer::new(&basis);
        let out = decomposer.lower(&StandardGate::CX, &[QubitId(0), QubitId(1)]).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_unreachable_basis() {
        // No two-qubit gate in the basis: CX cannot be expressed.
        let basis = BasisGates::from_names(["rz", "sx", "x"]);
        let mut decomposer = Decomposer::new(&basis);
        assert!(decomposer.lower(&StandardGate::CX, &[QubitId(0), QubitId(1)]).is_none());
        assert!(decomposer.lower(&StandardGate::H, &[QubitId(0)]).is_some());
    }
}

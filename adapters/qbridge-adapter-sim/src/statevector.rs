//! Statevector simulation engine.

use num_complex::Complex64;
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, FRAC_PI_4, PI};

use qbridge_ir::StandardGate;

/// A 2x2 unitary, row-major.
type Matrix2 = [[Complex64; 2]; 2];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// A statevector over `n` qubits; qubit `q` is bit `q` of the amplitude index.
pub struct Statevector {
    amplitudes: Vec<Complex64>,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let mut amplitudes = vec![ZERO; 1 << num_qubits];
        amplitudes[0] = ONE;
        Self { amplitudes }
    }

    /// Apply a gate to specific qubits.
    pub fn apply_gate(&mut self, gate: &StandardGate, qubits: &[usize]) {
        match *gate {
            StandardGate::CX => self.apply_controlled_x(1 << qubits[0], qubits[1]),
            StandardGate::CCX => {
                self.apply_controlled_x((1 << qubits[0]) | (1 << qubits[1]), qubits[2]);
            }
            StandardGate::CZ => {
                let both = (1 << qubits[0]) | (1 << qubits[1]);
                self.apply_phase_where(both, -ONE);
            }
            StandardGate::Swap => self.apply_swap(qubits[0], qubits[1]),
            StandardGate::ECR => self.apply_ecr(qubits[0], qubits[1]),
            single => self.apply_single(qubits[0], single_qubit_matrix(&single)),
        }
    }

    fn apply_single(&mut self, qubit: usize, [[a, b], [c, d]]: Matrix2) {
        let mask = 1 << qubit;
        for i in (0..self.amplitudes.len()).filter(|i| i & mask == 0) {
            let j = i | mask;
            let (x, y) = (self.amplitudes[i], self.amplitudes[j]);
            self.amplitudes[i] = a * x + b * y;
            self.amplitudes[j] = c * x + d * y;
        }
    }

    /// Multiply every amplitude whose index has all bits of `mask` set.
    fn apply_phase_where(&mut self, mask: usize, phase: Complex64) {
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & mask == mask {
                *amp *= phase;
            }
        }
    }

    fn apply_controlled_x(&mut self, controls: usize, target: usize) {
        let tgt = 1 << target;
        for i in 0..self.amplitudes.len() {
            if i & controls == controls && i & tgt == 0 {
                self.amplitudes.swap(i, i | tgt);
            }
        }
    }

    /// ECR = (IX - XY)/sqrt(2), written in `q2 ⊗ q1` order.
    fn apply_ecr(&mut self, q1: usize, q2: usize) {
        let (m1, m2) = (1 << q1, 1 << q2);
        let h = Complex64::from(FRAC_1_SQRT_2);
        let ih = Complex64::i() * h;
        for i in (0..self.amplitudes.len()).filter(|i| i & (m1 | m2) == 0) {
            let idx = [i, i | m1, i | m2, i | m1 | m2];
            let [a, b, c, d] = idx.map(|k| self.amplitudes[k]);
            self.amplitudes[idx[0]] = h * b + ih * d;
            self.amplitudes[idx[1]] = h * a - ih * c;
            self.amplitudes[idx[2]] = ih * b + h * d;
            self.amplitudes[idx[3]] = -ih * a + h * c;
        }
    }

    fn apply_swap(&mut self, q1: usize, q2: usize) {
        let (m1, m2) = (1 << q1, 1 << q2);
        for i in 0..self.amplitudes.len() {
            if i & m1 != 0 && i & m2 == 0 {
                self.amplitudes.swap(i, (i & !m1) | m2);
            }
        }
    }

    /// Cumulative outcome distribution, indexed like the amplitudes.
    ///
    /// The last entry is forced to exactly 1.0 so sampling never falls off
    /// the end through rounding.
    pub fn cumulative_probabilities(&self) -> Vec<f64> {
        let mut total = 0.0;
        let mut cumulative: Vec<f64> = self
            .amplitudes
            .iter()
            .map(|amp| {
                total += amp.norm_sqr();
                total
            })
            .collect();
        if let Some(last) = cumulative.last_mut() {
            *last = 1.0;
        }
        cumulative
    }

    /// Map a uniform draw in `[0, 1)` to an outcome index.
    pub fn outcome_for(cumulative: &[f64], r: f64) -> usize {
        cumulative
            .partition_point(|&c| c <= r)
            .min(cumulative.len().saturating_sub(1))
    }
}

/// The matrix of a one-qubit gate.
fn single_qubit_matrix(gate: &StandardGate) -> Matrix2 {
    let i = Complex64::i();
    let phase = |theta: f64| [[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, theta)]];
    let rx = |theta: f64| {
        let (s, c) = (theta / 2.0).sin_cos();
        [[c.into(), -i * s], [-i * s, c.into()]]
    };
    match *gate {
        StandardGate::X => [[ZERO, ONE], [ONE, ZERO]],
        StandardGate::Y => [[ZERO, -i], [i, ZERO]],
        StandardGate::Z => phase(PI),
        StandardGate::H => {
            let h = Complex64::from(FRAC_1_SQRT_2);
            [[h, h], [h, -h]]
        }
        StandardGate::S => phase(FRAC_PI_2),
        StandardGate::Sdg => phase(-FRAC_PI_2),
        StandardGate::T => phase(FRAC_PI_4),
        StandardGate::Tdg => phase(-FRAC_PI_4),
        StandardGate::SX => rx(FRAC_PI_2),
        StandardGate::SXdg => rx(-FRAC_PI_2),
        StandardGate::Rx(theta) => rx(theta),
        StandardGate::Ry(theta) => {
            let (s, c) = (theta / 2.0).sin_cos();
            [[c.into(), (-s).into()], [s.into(), c.into()]]
        }
        StandardGate::Rz(theta) => [
            [Complex64::from_polar(1.0, -theta / 2.0), ZERO],
            [ZERO, Complex64::from_polar(1.0, theta / 2.0)],
        ],
        StandardGate::P(theta) => phase(theta),
        _ => [[ONE, ZERO], [ZERO, ONE]],
    }
}

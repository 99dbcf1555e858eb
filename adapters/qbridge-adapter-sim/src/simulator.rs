//! The local simulator executor.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use tracing::{debug, instrument};

use qbridge_hal::{
    CancelToken, CompiledProgram, Counts, ExecError, ExecResult, ExecutionResult, Executor,
    LocalSimulatorProfile, MAX_SIMULATED_QUBITS, Target, TargetId, check_request,
};
use qbridge_ir::{Circuit, InstructionKind};

use crate::statevector::Statevector;

/// Statevector simulator serving one [`LocalSimulatorProfile`].
pub struct SimulatorBackend {
    profile: LocalSimulatorProfile,
    seed: Option<u64>,
}

impl SimulatorBackend {
    /// Create a simulator with the default profile and an entropy-seeded sampler.
    pub fn new() -> Self {
        Self {
            profile: LocalSimulatorProfile::default(),
            seed: None,
        }
    }

    /// Sample with a fixed seed, making counts reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Serve a different capability profile.
    #[must_use]
    pub fn with_profile(mut self, profile: LocalSimulatorProfile) -> Self {
        self.profile = profile;
        self
    }

    /// The profile programs must be compiled for.
    pub fn profile(&self) -> &LocalSimulatorProfile {
        &self.profile
    }

    /// The target to compile for before calling [`Executor::execute`].
    pub fn target(&self) -> Target {
        Target::Local(self.profile.clone())
    }

    /// Evolve the circuit's unitary part and return the cumulative
    /// outcome distribution over the full qubit register.
    fn evolve(&self, circuit: &Circuit) -> ExecResult<Vec<f64>> {
        let n = circuit.num_qubits();
        let limit = self.profile.max_qubits.min(MAX_SIMULATED_QUBITS);
        if n > limit as usize {
            return Err(ExecError::Simulation(format!(
                "{n} qubits exceeds the simulator limit of {limit}"
            )));
        }

        let mut measured = vec![false; n];
        let mut state = Statevector::new(n);
        for instruction in circuit.instructions() {
            match &instruction.kind {
                InstructionKind::Gate(gate) => {
                    if let Some(q) = instruction.qubits.iter().find(|q| measured[q.index()]) {
                        return Err(ExecError::Simulation(format!(
                            "gate '{}' on {q} after it was measured",
                            gate.name()
                        )));
                    }
                    let qubits: Vec<usize> = instruction.qubits.iter().map(|q| q.index()).collect();
                    state.apply_gate(gate, &qubits);
                }
                InstructionKind::Measure => {
                    for q in &instruction.qubits {
                        measured[q.index()] = true;
                    }
                }
                InstructionKind::Barrier => {}
            }
        }
        Ok(state.cumulative_probabilities())
    }

    /// Sample `shots` outcomes of `circuit` into a histogram.
    ///
    /// Bitstrings cover the classical register with classical bit 0 first;
    /// a classical bit never written reads `0`. A circuit without
    /// measurements is read out over all qubits, qubit 0 first.
    pub fn sample(&self, circuit: &Circuit, shots: u32) -> ExecResult<Counts> {
        let cumulative = self.evolve(circuit)?;
        let readout = Readout::for_circuit(circuit);

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut tally: FxHashMap<usize, u64> = FxHashMap::default();
        for _ in 0..shots {
            let outcome = Statevector::outcome_for(&cumulative, rng.gen_range(0.0..1.0));
            *tally.entry(outcome).or_insert(0) += 1;
        }

        Ok(tally
            .into_iter()
            .map(|(outcome, count)| (readout.bitstring(outcome), count))
            .collect())
    }
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Which qubit feeds each character of an output bitstring.
struct Readout {
    sources: Vec<Option<usize>>,
}

impl Readout {
    fn for_circuit(circuit: &Circuit) -> Self {
        if !circuit.has_measurements() {
            return Self {
                sources: (0..circuit.num_qubits()).map(Some).collect(),
            };
        }
        let mut sources = vec![None; circuit.num_clbits()];
        // The last measurement into a classical bit wins.
        for (qubit, clbit) in circuit.measurements() {
            sources[clbit.index()] = Some(qubit.index());
        }
        Self { sources }
    }

    fn bitstring(&self, outcome: usize) -> String {
        self.sources
            .iter()
            .map(|source| match source {
                Some(q) if (outcome >> q) & 1 == 1 => '1',
                _ => '0',
            })
            .collect()
    }
}

#[async_trait]
impl Executor for SimulatorBackend {
    fn name(&self) -> &str {
        "simulator"
    }

    #[instrument(skip_all, fields(circuit = %program.circuit().name(), shots))]
    async fn execute(
        &self,
        program: &CompiledProgram,
        shots: u32,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> ExecResult<ExecutionResult> {
        check_request(shots, timeout)?;

        let expected = TargetId::local(&self.profile.name);
        let program_target = program.target_id();
        if program_target != expected {
            return Err(ExecError::TargetMismatch {
                program: program_target.to_string(),
                executor: expected.to_string(),
            });
        }
        if cancel.is_cancelled() {
            return Err(ExecError::Cancelled);
        }

        let start = Instant::now();
        let counts = self.sample(program.circuit(), shots)?;
        let duration = start.elapsed();

        debug!(
            "Simulated {} shots in {:?}, {} distinct outcomes",
            shots,
            duration,
            counts.len()
        );

        Ok(ExecutionResult {
            counts,
            shots,
            produced_by: expected,
            duration,
        })
    }
}

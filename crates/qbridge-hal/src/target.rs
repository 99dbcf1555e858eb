//! Execution targets and their native gate sets.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::BackendDescriptor;

/// Name of the built-in local simulator profile.
pub const LOCAL_SIMULATOR: &str = "local_simulator";

/// Qubit capacity of the default local simulator profile.
pub const LOCAL_MAX_QUBITS: u32 = 20;

/// Largest register the statevector simulator will allocate (2^30 amplitudes).
pub const MAX_SIMULATED_QUBITS: u32 = 30;

/// The native gate set of a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BasisGates {
    gates: Vec<String>,
    universal: bool,
}

impl BasisGates {
    /// Every gate in the IR is native (simulators).
    pub fn universal() -> Self {
        Self {
            gates: vec![],
            universal: true,
        }
    }

    /// IBM legacy basis: `id, rz, sx, x, cx`.
    pub fn ibm() -> Self {
        Self::from_names(["id", "rz", "sx", "x", "cx"])
    }

    /// IBM Heron basis: `id, rz, sx, x, cz`.
    pub fn heron() -> Self {
        Self::from_names(["id", "rz", "sx", "x", "cz"])
    }

    /// IBM Eagle basis: `ecr, id, rz, sx, x`.
    pub fn eagle() -> Self {
        Self::from_names(["ecr", "id", "rz", "sx", "x"])
    }

    /// A basis from provider-reported gate names.
    pub fn from_names(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            gates: names.into_iter().map(Into::into).collect(),
            universal: false,
        }
    }

    /// Check if a gate name is native.
    pub fn contains(&self, name: &str) -> bool {
        self.universal || self.gates.iter().any(|g| g == name)
    }

    /// Check whether every gate is native.
    pub fn is_universal(&self) -> bool {
        self.universal
    }

    /// Listed gate names (empty for a universal basis).
    pub fn names(&self) -> &[String] {
        &self.gates
    }
}

/// Capability profile of the local simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSimulatorProfile {
    /// Profile name.
    pub name: String,
    /// Largest circuit the simulator accepts.
    pub max_qubits: u32,
    /// Native gates.
    pub basis: BasisGates,
}

impl Default for LocalSimulatorProfile {
    fn default() -> Self {
        Self {
            name: LOCAL_SIMULATOR.to_string(),
            max_qubits: LOCAL_MAX_QUBITS,
            basis: BasisGates::universal(),
        }
    }
}

impl LocalSimulatorProfile {
    /// Override the qubit capacity, clamped to [`MAX_SIMULATED_QUBITS`].
    #[must_use]
    pub fn with_max_qubits(mut self, max_qubits: u32) -> Self {
        self.max_qubits = max_qubits.min(MAX_SIMULATED_QUBITS);
        self
    }

    /// Override the native basis.
    #[must_use]
    pub fn with_basis(mut self, basis: BasisGates) -> Self {
        self.basis = basis;
        self
    }
}

/// Whether a target is a remote backend or the local simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// A backend discovered in a remote session.
    Remote,
    /// The local simulator.
    Local,
}

/// Stable identity of a target, used as a cache key and in results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId {
    /// Remote or local.
    pub kind: TargetKind,
    /// Backend or profile name.
    pub name: String,
    /// Session that discovered a remote backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<Uuid>,
}

impl TargetId {
    /// Identity of a local simulator profile.
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::Local,
            name: name.into(),
            session: None,
        }
    }

    /// Identity of a remote backend within a session.
    pub fn remote(name: impl Into<String>, session: Uuid) -> Self {
        Self {
            kind: TargetKind::Remote,
            name: name.into(),
            session: Some(session),
        }
    }

    /// Check whether this identifies the local simulator.
    pub fn is_local(&self) -> bool {
        self.kind == TargetKind::Local
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TargetKind::Remote => write!(f, "remote:{}", self.name),
            TargetKind::Local => write!(f, "local:{}", self.name),
        }
    }
}

/// Something a circuit can be compiled for and executed on.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// A backend listed by a remote session.
    Remote(BackendDescriptor),
    /// The local simulator.
    Local(LocalSimulatorProfile),
}

impl Target {
    /// The default local simulator target.
    pub fn local() -> Self {
        Target::Local(LocalSimulatorProfile::default())
    }

    /// Backend or profile name.
    pub fn name(&self) -> &str {
        match self {
            Target::Remote(desc) => &desc.name,
            Target::Local(profile) => &profile.name,
        }
    }

    /// Qubit capacity.
    pub fn num_qubits(&self) -> u32 {
        match self {
            Target::Remote(desc) => desc.num_qubits,
            Target::Local(profile) => profile.max_qubits,
        }
    }

    /// Native gate set.
    pub fn basis(&self) -> &BasisGates {
        match self {
            Target::Remote(desc) => &desc.basis_gates,
            Target::Local(profile) => &profile.basis,
        }
    }

    /// Stable identity.
    pub fn id(&self) -> TargetId {
        match self {
            Target::Remote(desc) => TargetId::remote(&desc.name, desc.session_id),
            Target::Local(profile) => TargetId::local(&profile.name),
        }
    }

    /// Check whether this is the local simulator.
    pub fn is_local(&self) -> bool {
        matches!(self, Target::Local(_))
    }
}

impl From<LocalSimulatorProfile> for Target {
    fn from(profile: LocalSimulatorProfile) -> Self {
        Target::Local(profile)
    }
}

impl From<BackendDescriptor> for Target {
    fn from(desc: BackendDescriptor) -> Self {
        Target::Remote(desc)
    }
}

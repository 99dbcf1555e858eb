//! Backend descriptors discovered by a session.

use std::fmt;
use std::sync::Weak;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::{Session, SessionInner};
use crate::target::BasisGates;

/// Operational status reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendStatus {
    /// Accepting jobs.
    Online,
    /// Not accepting jobs.
    Offline,
    /// The provider did not report a status.
    Unknown,
}

impl fmt::Display for BackendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendStatus::Online => write!(f, "online"),
            BackendStatus::Offline => write!(f, "offline"),
            BackendStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// A remote execution backend as listed by a [`Session`].
///
/// The descriptor points back at its session without keeping it alive.
/// Once every [`Session`] clone is dropped, [`BackendDescriptor::session`]
/// returns `None` and remote execution against the descriptor fails.
#[derive(Clone)]
pub struct BackendDescriptor {
    /// Backend name, unique within the session.
    pub name: String,
    /// Qubit capacity (always positive).
    pub num_qubits: u32,
    /// Operational status at discovery time.
    pub status: BackendStatus,
    /// Native gates.
    pub basis_gates: BasisGates,
    /// Whether the provider marks this backend as a simulator.
    pub simulator: bool,
    /// Provider shot limit, if reported.
    pub max_shots: Option<u32>,
    /// Pending jobs at discovery time, if reported.
    pub queue_length: Option<u32>,
    /// Identifier of the discovering session.
    pub session_id: Uuid,
    pub(crate) owner: Weak<SessionInner>,
}

impl BackendDescriptor {
    /// The owning session, if it is still alive.
    pub fn session(&self) -> Option<Session> {
        self.owner.upgrade().map(Session::from_inner)
    }

    /// Check if the backend was online at discovery.
    pub fn is_online(&self) -> bool {
        self.status == BackendStatus::Online
    }
}

impl fmt::Debug for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendDescriptor")
            .field("name", &self.name)
            .field("num_qubits", &self.num_qubits)
            .field("status", &self.status)
            .field("simulator", &self.simulator)
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

impl PartialEq for BackendDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.session_id == other.session_id
            && self.name == other.name
            && self.num_qubits == other.num_qubits
            && self.status == other.status
            && self.basis_gates == other.basis_gates
            && self.simulator == other.simulator
            && self.max_shots == other.max_shots
            && self.queue_length == other.queue_length
    }
}
